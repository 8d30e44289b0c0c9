use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A plant species or cultivar group. Immutable reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlantType {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
