//! # fence-db
//!
//! libSQL store adapter for Fenceline.
//!
//! Holds the relational state the engine reads and writes: vehicle positions,
//! zone polygons (GeoJSON text), assignment history, and visit counters.
//! [`service::FenceStore`] hosts the repository methods and implements the
//! boundary traits from `fence_core::boundary`, so an `EpochRunner` can run
//! directly against it.

pub mod boundary;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Raw database handle: one local libSQL database and its connection.
pub struct FenceDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl FenceDb {
    /// Open a local database at `path` (or `":memory:"`).
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let fence_db = Self { db, conn };
        fence_db.run_migrations().await?;
        Ok(fence_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_creates_schema() {
        let db = FenceDb::open_local(":memory:").await.unwrap();
        let mut rows = db
            .conn()
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                (),
            )
            .await
            .unwrap();
        let mut tables = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            tables.push(row.get::<String>(0).unwrap());
        }
        assert_eq!(tables, vec!["assignments", "counters", "vehicles", "zones"]);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = FenceDb::open_local(":memory:").await.unwrap();
        db.run_migrations().await.unwrap();
    }
}
