//! Service layer hosting the repository methods.
//!
//! `PhytoService` wraps `PhytoDb`; every repo module adds methods to it via
//! `impl PhytoService` blocks. It is shared between concurrent diagnosis
//! requests behind an `Arc`.

use crate::PhytoDb;
use crate::error::DatabaseError;

pub struct PhytoService {
    db: PhytoDb,
}

impl PhytoService {
    /// Create a new service over a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path`: path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = PhytoDb::open_local(db_path).await?;
        Ok(Self { db })
    }

    /// Create from an existing `PhytoDb`.
    #[must_use]
    pub const fn from_db(db: PhytoDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &PhytoDb {
        &self.db
    }
}
