use serde::{Deserialize, Serialize};

/// A symptom associated with a disease, with its per-disease weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseSymptom {
    pub symptom_id: String,
    pub symptom_name: String,
    pub weight: f64,
}

/// A disease in the curated knowledge base.
///
/// The sum of `symptoms[*].weight` is the denominator of knowledge-base
/// overlap scoring. A disease with no symptoms can never be matched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Disease {
    pub id: String,
    pub name: String,
    pub plant_type_id: Option<String>,
    pub plant_type_name: Option<String>,
    pub description: Option<String>,
    pub treatment: Option<String>,
    pub active: bool,
    pub symptoms: Vec<DiseaseSymptom>,
}

impl Disease {
    /// Sum of the weights of every symptom of this disease.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.symptoms.iter().map(|s| s.weight).sum()
    }

    /// Whether the disease can take part in knowledge-base matching.
    #[must_use]
    pub fn is_matchable(&self) -> bool {
        self.active && !self.symptoms.is_empty() && self.total_weight() > 0.0
    }
}
