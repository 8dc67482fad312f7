//! Persistence of validated batches
//!
//! [`MeshSink`] is the seam between validation and storage. The SQLite
//! implementation writes a whole batch inside one transaction: either every
//! row is committed or none is.

pub mod schema;

use crate::config::ConflictMode;
use crate::error::Result;
use crate::pipeline::ValidatedBatch;
use crate::record::MeshRecord;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

/// Destination for validated batches
pub trait MeshSink {
    /// Write every record of `batch`. Returns the number of rows written.
    fn persist(&mut self, batch: &ValidatedBatch) -> Result<usize>;
}

const INSERT_SQL: &str = r#"
    INSERT INTO mesh (
        codename, trame, mass_surf, is_compat_interior_wall,
        mesh_height, mesh_width, roll_pallet, color_names
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

const UPSERT_SQL: &str = r#"
    INSERT INTO mesh (
        codename, trame, mass_surf, is_compat_interior_wall,
        mesh_height, mesh_width, roll_pallet, color_names
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(codename) DO UPDATE SET
        trame = excluded.trame,
        mass_surf = excluded.mass_surf,
        is_compat_interior_wall = excluded.is_compat_interior_wall,
        mesh_height = excluded.mesh_height,
        mesh_width = excluded.mesh_width,
        roll_pallet = excluded.roll_pallet,
        color_names = excluded.color_names
"#;

const SELECT_COLUMNS: &str = "codename, trame, mass_surf, is_compat_interior_wall, \
                              mesh_height, mesh_width, roll_pallet, color_names";

/// SQLite-backed mesh catalog
pub struct SqliteMeshStore {
    conn: Connection,
    on_conflict: ConflictMode,
}

impl SqliteMeshStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        schema::init_schema(&conn)?;
        debug!(path = %path.display(), "Opened mesh database");

        Ok(Self {
            conn,
            on_conflict: ConflictMode::default(),
        })
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;

        Ok(Self {
            conn,
            on_conflict: ConflictMode::default(),
        })
    }

    pub fn with_conflict_mode(mut self, mode: ConflictMode) -> Self {
        self.on_conflict = mode;
        self
    }

    /// Number of stored meshes
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mesh", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Look up one mesh by product code
    pub fn get(&self, codename: &str) -> Result<Option<MeshRecord>> {
        let sql = format!("SELECT {} FROM mesh WHERE codename = ?1", SELECT_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, params![codename], record_from_row)
            .optional()?;
        Ok(record)
    }

    /// All stored meshes ordered by product code
    pub fn list(&self) -> Result<Vec<MeshRecord>> {
        let sql = format!("SELECT {} FROM mesh ORDER BY codename", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl MeshSink for SqliteMeshStore {
    fn persist(&mut self, batch: &ValidatedBatch) -> Result<usize> {
        let sql = match self.on_conflict {
            ConflictMode::Fail => INSERT_SQL,
            ConflictMode::Replace => UPSERT_SQL,
        };

        // Dropping an uncommitted transaction rolls it back
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(sql)?;
            for record in batch {
                stmt.execute(params![
                    record.codename,
                    record.trame,
                    record.mass_surf,
                    record.is_compat_interior_wall,
                    record.mesh_height,
                    record.mesh_width,
                    record.roll_pallet,
                    record.joined_colors(),
                ])?;
            }
        }
        tx.commit()?;

        info!(rows = batch.len(), "Batch committed");
        Ok(batch.len())
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MeshRecord> {
    let colors: Option<String> = row.get(7)?;
    Ok(MeshRecord {
        codename: row.get(0)?,
        trame: row.get(1)?,
        mass_surf: row.get(2)?,
        is_compat_interior_wall: row.get(3)?,
        mesh_height: row.get(4)?,
        mesh_width: row.get(5)?,
        roll_pallet: row.get(6)?,
        color_names: colors
            .filter(|c| !c.is_empty())
            .map(|c| c.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
    })
}
