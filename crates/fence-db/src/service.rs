//! Service layer hosting the repository methods.
//!
//! `FenceStore` wraps `FenceDb`. All repo methods are implemented as
//! `impl FenceStore` blocks under `repos/`, and the boundary traits the
//! engine consumes are implemented in `boundary`.

use crate::FenceDb;
use crate::error::DatabaseError;

pub struct FenceStore {
    db: FenceDb,
}

impl FenceStore {
    /// Open a store on a local database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            db: FenceDb::open_local(db_path).await?,
        })
    }

    #[must_use]
    pub const fn from_db(db: FenceDb) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn db(&self) -> &FenceDb {
        &self.db
    }

    pub(crate) const fn conn(&self) -> &libsql::Connection {
        self.db.conn()
    }
}
