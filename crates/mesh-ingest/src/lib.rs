//! Mesh Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Validates delimited mesh product files and loads the surviving rows into
//! a SQLite catalog keyed by product code.
//!
//! - **Reading**: [`reader::BatchReader`] turns a CSV file into [`record::RawRecord`]s
//! - **Validation**: [`pipeline::BatchPipeline`] runs duplicate detection and
//!   per-row checks, producing a [`pipeline::ValidatedBatch`] and an
//!   [`pipeline::ErrorReport`]
//! - **Persistence**: [`store::MeshSink`], implemented by [`store::SqliteMeshStore`]
//!
//! A bad row only excludes itself. Whether the survivors are written when
//! other rows failed is decided by [`config::PersistPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use mesh_ingest::{ingest_file, IngestConfig, SqliteMeshStore};
//! use std::path::Path;
//!
//! fn main() -> mesh_ingest::Result<()> {
//!     let config = IngestConfig::load(None)?;
//!     let mut store = SqliteMeshStore::open(&config.database)?;
//!     let outcome = ingest_file(Path::new("meshes.csv"), &config, &mut store)?;
//!     for message in outcome.result.report.messages() {
//!         println!("{message}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod duplicates;
pub mod error;
pub mod fields;
pub mod ingest;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod row;
pub mod schema;
pub mod store;

pub use config::{ConflictMode, IngestConfig, PersistPolicy, Vocabulary};
pub use error::{IngestError, Result};
pub use ingest::{
    ingest_file, ingest_records, persist_batch, skip_reason, validate_file, IngestOutcome,
    PersistDecision,
};
pub use pipeline::{BatchPipeline, BatchResult, ErrorReport, ValidatedBatch};
pub use reader::{read_batch, read_batch_from, BatchReader};
pub use record::{MeshRecord, RawRecord};
pub use row::{ErrorKind, RowError};
pub use store::{MeshSink, SqliteMeshStore};
