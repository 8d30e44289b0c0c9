use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::CacheEntryStatus;

/// A prior AI diagnosis kept for reuse.
///
/// Created only after a successful AI resolution. Afterwards only the hit
/// counter changes (never decreasing) until the expiry sweep deletes the row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosisCacheEntry {
    pub id: String,
    pub plant_type: Option<String>,
    pub normalized_description: String,
    pub symptom_ids: BTreeSet<String>,
    pub disease_name: String,
    /// Raw AI response, kept verbatim for replay.
    pub ai_response: String,
    pub hit_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DiagnosisCacheEntry {
    /// Expiry status of the entry at `now`. An entry expiring exactly at
    /// `now` is already expired.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> CacheEntryStatus {
        if self.expires_at > now {
            CacheEntryStatus::Active
        } else {
            CacheEntryStatus::Expired
        }
    }

    /// This entry's symptoms that also appear in `query`, in ID order.
    #[must_use]
    pub fn matched_symptoms(&self, query: &BTreeSet<String>) -> Vec<String> {
        self.symptom_ids.intersection(query).cloned().collect()
    }
}
