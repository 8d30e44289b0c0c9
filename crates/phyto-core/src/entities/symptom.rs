use serde::{Deserialize, Serialize};

/// A canonical symptom term from the symptom dictionary.
///
/// `weight` is the diagnostic significance of the term (strictly positive).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomEntry {
    pub id: String,
    pub name: String,
    pub category: String,
    pub weight: f64,
}
