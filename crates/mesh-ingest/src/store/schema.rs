//! SQLite schema for the mesh catalog

use crate::error::Result;
use rusqlite::Connection;

/// Create the `mesh` table if it does not exist yet
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS mesh (
            codename TEXT PRIMARY KEY NOT NULL,
            trame TEXT NOT NULL,
            mass_surf REAL NOT NULL,
            is_compat_interior_wall BOOLEAN NOT NULL,
            mesh_height REAL NOT NULL,
            mesh_width REAL NOT NULL,
            roll_pallet INTEGER,

            -- comma-joined color names
            color_names TEXT
        )
        "#,
        [],
    )?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'mesh'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }
}
