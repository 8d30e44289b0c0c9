//! Shared test utilities for phyto-db unit tests.

use crate::PhytoDb;
use crate::service::PhytoService;

/// Create an in-memory `PhytoService`.
pub async fn test_service() -> PhytoService {
    let db = PhytoDb::open_local(":memory:").await.unwrap();
    PhytoService::from_db(db)
}
