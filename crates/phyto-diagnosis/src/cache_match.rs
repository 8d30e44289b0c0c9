//! Cache tier: rank prior AI diagnoses against a new complaint.
//!
//! A candidate must first be textually similar to the query (similarity at
//! least the trigram threshold). Survivors are scored by blending text
//! similarity with symptom overlap:
//!
//! ```text
//! final = w * similarity + (1 - w) * matched / max(1, |query symptoms|)
//! ```
//!
//! `w` is `diagnosis.cache_text_weight` (default `0.6`). The score is in
//! `[0, 1]` and non-decreasing in both inputs.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use phyto_core::entities::DiagnosisCacheEntry;
use phyto_core::matches::DiagnosisCacheCandidate;
use phyto_db::error::DatabaseError;
use phyto_db::service::PhytoService;

use crate::similarity::{Similarity, TrigramSimilarity};

/// Blend of text similarity and symptom overlap.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn final_score(similarity: f64, matched: usize, query_symptoms: usize, text_weight: f64) -> f64 {
    let w = text_weight.clamp(0.0, 1.0);
    let overlap = (matched as f64 / query_symptoms.max(1) as f64).clamp(0.0, 1.0);
    w.mul_add(similarity.clamp(0.0, 1.0), (1.0 - w) * overlap)
}

/// Score, filter and order `entries` against a query.
///
/// Entries below `trigram_threshold` are dropped. The rest are ordered by
/// final score desc, hit count desc, then newest first, and cut to `limit`.
pub fn score_candidates<S: Similarity + ?Sized>(
    similarity: &S,
    entries: Vec<DiagnosisCacheEntry>,
    normalized_description: &str,
    symptom_ids: &BTreeSet<String>,
    trigram_threshold: f64,
    text_weight: f64,
    limit: usize,
) -> Vec<DiagnosisCacheCandidate> {
    let mut candidates: Vec<DiagnosisCacheCandidate> = entries
        .into_iter()
        .filter_map(|entry| {
            let trigram_score =
                similarity.similarity(normalized_description, &entry.normalized_description);
            if trigram_score < trigram_threshold {
                return None;
            }
            let matched_symptoms = entry.matched_symptoms(symptom_ids);
            let matched_symptom_count = matched_symptoms.len();
            Some(DiagnosisCacheCandidate {
                final_score: final_score(
                    trigram_score,
                    matched_symptom_count,
                    symptom_ids.len(),
                    text_weight,
                ),
                entry,
                trigram_score,
                matched_symptom_count,
                matched_symptoms,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.entry.hit_count.cmp(&a.entry.hit_count))
            .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
    });
    candidates.truncate(limit);
    candidates
}

/// The top candidate, if its final score clears `threshold`.
pub fn confident(
    candidates: &[DiagnosisCacheCandidate],
    threshold: f64,
) -> Option<&DiagnosisCacheCandidate> {
    candidates.first().filter(|c| c.final_score >= threshold)
}

/// Cache candidate search over the store with a pluggable similarity.
pub struct CacheMatcher<S = TrigramSimilarity> {
    store: Arc<PhytoService>,
    similarity: S,
    text_weight: f64,
}

impl CacheMatcher<TrigramSimilarity> {
    pub const fn trigram(store: Arc<PhytoService>, text_weight: f64) -> Self {
        Self::new(store, TrigramSimilarity, text_weight)
    }
}

impl<S: Similarity> CacheMatcher<S> {
    pub const fn new(store: Arc<PhytoService>, similarity: S, text_weight: f64) -> Self {
        Self {
            store,
            similarity,
            text_weight,
        }
    }

    pub const fn similarity(&self) -> &S {
        &self.similarity
    }

    /// Ranked active cache entries for a query.
    ///
    /// With a `plant_type`, only entries carrying that label
    /// (case-insensitive) are considered.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the cache table cannot be read.
    pub async fn search_candidates(
        &self,
        normalized_description: &str,
        symptom_ids: &BTreeSet<String>,
        plant_type: Option<&str>,
        trigram_threshold: f64,
        limit: usize,
    ) -> Result<Vec<DiagnosisCacheCandidate>, DatabaseError> {
        let entries = self
            .store
            .list_cache_candidates(plant_type, Utc::now())
            .await?;
        let considered = entries.len();
        let candidates = score_candidates(
            &self.similarity,
            entries,
            normalized_description,
            symptom_ids,
            trigram_threshold,
            self.text_weight,
            limit,
        );
        tracing::debug!(
            considered,
            kept = candidates.len(),
            top = candidates.first().map(|c| c.final_score),
            "cache candidates scored"
        );
        Ok(candidates)
    }
}
