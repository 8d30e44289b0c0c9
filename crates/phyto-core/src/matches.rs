//! Transient match projections.
//!
//! Produced fresh per query by the knowledge-base and cache tiers and
//! discarded after ranking. Never persisted.

use serde::{Deserialize, Serialize};

use crate::entities::{DiagnosisCacheEntry, Disease};

/// A disease together with how well it overlaps a query's symptom set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseWithMatchInfo {
    pub disease: Disease,
    /// IDs of the disease's symptoms present in the query, in disease order.
    pub matched_symptoms: Vec<String>,
    pub total_symptom_count: usize,
    pub total_weight: f64,
    pub matched_weight: f64,
}

impl DiseaseWithMatchInfo {
    /// Build the match info of `disease` against `query`.
    #[must_use]
    pub fn compute(disease: Disease, query: &std::collections::BTreeSet<String>) -> Self {
        let mut matched_symptoms = Vec::new();
        let mut matched_weight = 0.0;
        for symptom in &disease.symptoms {
            if query.contains(&symptom.symptom_id) {
                matched_symptoms.push(symptom.symptom_id.clone());
                matched_weight += symptom.weight;
            }
        }
        Self {
            total_symptom_count: disease.symptoms.len(),
            total_weight: disease.total_weight(),
            matched_weight,
            matched_symptoms,
            disease,
        }
    }

    /// Weighted overlap `matched_weight / total_weight`, in `[0, 1]`.
    ///
    /// A disease with zero total weight scores `0.0`.
    #[must_use]
    pub fn score(&self) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        (self.matched_weight / self.total_weight).clamp(0.0, 1.0)
    }
}

/// A cache entry scored against a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisCacheCandidate {
    pub entry: DiagnosisCacheEntry,
    pub trigram_score: f64,
    pub matched_symptom_count: usize,
    pub matched_symptoms: Vec<String>,
    pub final_score: f64,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entities::DiseaseSymptom;

    fn powdery_mildew() -> Disease {
        Disease {
            id: "dis-00000001".into(),
            name: "Powdery Mildew".into(),
            plant_type_id: None,
            plant_type_name: None,
            description: None,
            treatment: None,
            active: true,
            symptoms: vec![
                DiseaseSymptom {
                    symptom_id: "sym-white".into(),
                    symptom_name: "white spots".into(),
                    weight: 0.6,
                },
                DiseaseSymptom {
                    symptom_id: "sym-curl".into(),
                    symptom_name: "leaf curl".into(),
                    weight: 0.4,
                },
            ],
        }
    }

    fn query(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn all_symptoms_present_scores_one() {
        let info = DiseaseWithMatchInfo::compute(powdery_mildew(), &query(&["sym-white", "sym-curl"]));
        assert!((info.score() - 1.0).abs() < f64::EPSILON);
        assert_eq!(info.matched_symptoms, vec!["sym-white", "sym-curl"]);
        assert_eq!(info.total_symptom_count, 2);
    }

    #[test]
    fn partial_overlap_scores_weight_share() {
        let info = DiseaseWithMatchInfo::compute(powdery_mildew(), &query(&["sym-white", "sym-x"]));
        assert!((info.score() - 0.6).abs() < 1e-9);
        assert_eq!(info.matched_symptoms, vec!["sym-white"]);
    }

    #[test]
    fn zero_weight_disease_scores_zero() {
        let mut disease = powdery_mildew();
        disease.symptoms.clear();
        let info = DiseaseWithMatchInfo::compute(disease, &query(&["sym-white"]));
        assert!(info.score().abs() < f64::EPSILON);
    }
}
