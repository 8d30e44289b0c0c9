//! Diagnosis cache entry update builder.
//!
//! The hit counter is deliberately absent: it only moves through
//! `increment_cache_hit_count`.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheEntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntryUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.disease_name.is_none() && self.ai_response.is_none() && self.expires_at.is_none()
    }
}

#[derive(Default)]
pub struct CacheEntryUpdateBuilder(CacheEntryUpdate);

impl CacheEntryUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(CacheEntryUpdate::default())
    }

    #[must_use]
    pub fn disease_name(mut self, val: impl Into<String>) -> Self {
        self.0.disease_name = Some(val.into());
        self
    }

    #[must_use]
    pub fn ai_response(mut self, val: impl Into<String>) -> Self {
        self.0.ai_response = Some(val.into());
        self
    }

    #[must_use]
    pub fn expires_at(mut self, val: DateTime<Utc>) -> Self {
        self.0.expires_at = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> CacheEntryUpdate {
        self.0
    }
}
