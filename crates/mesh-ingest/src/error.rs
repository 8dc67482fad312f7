//! Batch-fatal error types
//!
//! Row-level problems never surface here: they are collected into an
//! [`ErrorReport`](crate::pipeline::ErrorReport) and only exclude their own
//! row. An [`IngestError`] aborts the whole run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that abort an ingestion run
#[derive(Error, Debug)]
pub enum IngestError {
    /// Input file missing or unreadable
    #[error("Cannot read input file '{}': {source}", .path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File system operation failed outside of input reading
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// The delimited file itself could not be parsed
    #[error("Malformed input: {0}")]
    Csv(#[from] csv::Error),

    /// A data row has more cells than the header names
    #[error("Expected {expected} fields in line {line}, saw {found}")]
    TooManyFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Header row lacks a required column
    #[error("Input header is missing required column '{0}'")]
    MissingColumn(String),

    /// The SQLite store rejected the batch; nothing was committed
    #[error("Database error: {0}")]
    Sink(#[from] rusqlite::Error),

    /// Configuration file missing or unreadable
    #[error("Cannot read configuration file '{}': {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Invalid configuration file '{}': {source}", .path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration values are inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an input read error for `path`
    pub fn read_input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadInput {
            path: path.into(),
            source,
        }
    }
}
