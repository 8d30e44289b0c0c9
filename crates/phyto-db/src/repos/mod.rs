//! Repository modules implementing the store operations for every Phyto entity.
//!
//! Each module adds methods to `PhytoService` via `impl PhytoService` blocks.

pub mod diagnosis_cache;
pub mod disease;
pub mod plant_type;
pub mod symptom;

pub use diagnosis_cache::{CacheStats, NewCacheEntry};
pub use disease::NewDiseaseSymptom;
