//! Tier acceptance thresholds and cache scoring parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_kb_acceptance_threshold() -> f64 {
    0.6
}

const fn default_cache_acceptance_threshold() -> f64 {
    0.5
}

const fn default_trigram_threshold() -> f64 {
    0.3
}

const fn default_candidate_limit() -> u32 {
    20
}

const fn default_cache_text_weight() -> f64 {
    0.6
}

/// Upper bound on `cache_ttl_hours`: one hundred years.
pub const MAX_CACHE_TTL_HOURS: u64 = 100 * 366 * 24;

const fn default_cache_ttl_hours() -> u64 {
    24 * 30
}

const fn default_fuzzy_max_distance() -> usize {
    1
}

const fn default_fuzzy_min_term_len() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiagnosisConfig {
    /// Minimum weighted-overlap score for a knowledge-base answer.
    #[serde(default = "default_kb_acceptance_threshold")]
    pub kb_acceptance_threshold: f64,

    /// Minimum final score for a cache answer.
    #[serde(default = "default_cache_acceptance_threshold")]
    pub cache_acceptance_threshold: f64,

    /// Cache entries below this text similarity are not candidates at all.
    #[serde(default = "default_trigram_threshold")]
    pub trigram_threshold: f64,

    /// Maximum number of cache candidates ranked per query.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: u32,

    /// Share of the cache final score given to text similarity; the rest
    /// goes to symptom overlap.
    #[serde(default = "default_cache_text_weight")]
    pub cache_text_weight: f64,

    /// Lifetime of a cache entry written after an AI answer.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Maximum edit distance for fuzzy symptom matching. `0` disables it.
    #[serde(default = "default_fuzzy_max_distance")]
    pub fuzzy_max_distance: usize,

    /// Terms shorter than this only ever match exactly.
    #[serde(default = "default_fuzzy_min_term_len")]
    pub fuzzy_min_term_len: usize,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            kb_acceptance_threshold: default_kb_acceptance_threshold(),
            cache_acceptance_threshold: default_cache_acceptance_threshold(),
            trigram_threshold: default_trigram_threshold(),
            candidate_limit: default_candidate_limit(),
            cache_text_weight: default_cache_text_weight(),
            cache_ttl_hours: default_cache_ttl_hours(),
            fuzzy_max_distance: default_fuzzy_max_distance(),
            fuzzy_min_term_len: default_fuzzy_min_term_len(),
        }
    }
}

impl DiagnosisConfig {
    /// Cache entry lifetime as a `Duration`.
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.saturating_mul(3600))
    }

    /// Reject values the matchers cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a threshold or weight outside
    /// `[0, 1]`, a zero candidate limit, or a TTL outside
    /// `1..=MAX_CACHE_TTL_HOURS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_fields = [
            ("diagnosis.kb_acceptance_threshold", self.kb_acceptance_threshold),
            (
                "diagnosis.cache_acceptance_threshold",
                self.cache_acceptance_threshold,
            ),
            ("diagnosis.trigram_threshold", self.trigram_threshold),
            ("diagnosis.cache_text_weight", self.cache_text_weight),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if self.candidate_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "diagnosis.candidate_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(1..=MAX_CACHE_TTL_HOURS).contains(&self.cache_ttl_hours) {
            return Err(ConfigError::InvalidValue {
                field: "diagnosis.cache_ttl_hours".to_string(),
                reason: format!("must be between 1 and {MAX_CACHE_TTL_HOURS}"),
            });
        }
        Ok(())
    }
}
