//! Entity structs for all Phyto domain objects.
//!
//! Each entity maps to a table in the libSQL database (see
//! `phyto-db/migrations/001_initial.sql`). All structs derive `Serialize` and
//! `Deserialize` for JSON output and catalog loading.

mod diagnosis_cache;
mod disease;
mod plant_type;
mod symptom;

pub use diagnosis_cache::DiagnosisCacheEntry;
pub use disease::{Disease, DiseaseSymptom};
pub use plant_type::PlantType;
pub use symptom::SymptomEntry;
