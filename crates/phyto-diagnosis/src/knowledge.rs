//! Knowledge-base tier: weighted symptom overlap against curated diseases.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use phyto_core::entities::PlantType;
use phyto_core::matches::DiseaseWithMatchInfo;
use phyto_db::error::DatabaseError;
use phyto_db::service::PhytoService;

/// Ranks active diseases by how much of their symptom weight a query covers.
pub struct KnowledgeBaseMatcher {
    store: Arc<PhytoService>,
}

impl KnowledgeBaseMatcher {
    pub const fn new(store: Arc<PhytoService>) -> Self {
        Self { store }
    }

    /// Resolve an optional plant-type hint (ID or fuzzy name).
    ///
    /// Blank hints resolve to `None` without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the lookup fails.
    pub async fn resolve_plant_type(
        &self,
        hint: Option<&str>,
    ) -> Result<Option<PlantType>, DatabaseError> {
        match hint.map(str::trim).filter(|h| !h.is_empty()) {
            Some(hint) => {
                let resolved = self.store.resolve_plant_type(hint).await?;
                if resolved.is_none() {
                    tracing::debug!(hint, "plant type hint not recognized, matching all diseases");
                }
                Ok(resolved)
            }
            None => Ok(None),
        }
    }

    /// Ranked diseases for `symptom_ids`, filtered to the plant type `hint`
    /// resolves to. An unresolvable hint leaves the candidates unfiltered.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the store cannot be read.
    pub async fn match_symptoms(
        &self,
        symptom_ids: &BTreeSet<String>,
        hint: Option<&str>,
    ) -> Result<Vec<DiseaseWithMatchInfo>, DatabaseError> {
        let plant_type = self.resolve_plant_type(hint).await?;
        self.match_for_plant_type(symptom_ids, plant_type.as_ref())
            .await
    }

    /// Ranked diseases for `symptom_ids`, restricted to `plant_type` if given.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the store cannot be read.
    pub async fn match_for_plant_type(
        &self,
        symptom_ids: &BTreeSet<String>,
        plant_type: Option<&PlantType>,
    ) -> Result<Vec<DiseaseWithMatchInfo>, DatabaseError> {
        if symptom_ids.is_empty() {
            return Ok(Vec::new());
        }
        let matches = self
            .store
            .find_diseases_by_symptom_ids(symptom_ids, plant_type.map(|p| p.id.as_str()))
            .await?;
        Ok(rank(matches))
    }
}

/// Drop unmatchable diseases and order by score desc, matched count desc,
/// then name.
pub fn rank(mut matches: Vec<DiseaseWithMatchInfo>) -> Vec<DiseaseWithMatchInfo> {
    matches.retain(|m| m.disease.is_matchable() && !m.matched_symptoms.is_empty());
    matches.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.matched_symptoms.len().cmp(&a.matched_symptoms.len()))
            .then_with(|| a.disease.name.cmp(&b.disease.name))
    });
    matches
}

/// The top match, if it clears `threshold`.
pub fn confident(matches: &[DiseaseWithMatchInfo], threshold: f64) -> Option<&DiseaseWithMatchInfo> {
    matches.first().filter(|m| m.score() >= threshold)
}
