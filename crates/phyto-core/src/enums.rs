//! Provenance and status enums for Phyto.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// DiagnosisSource
// ---------------------------------------------------------------------------

/// Which tier answered a diagnosis request.
///
/// ```text
/// knowledge_base → cache → ai
/// ```
///
/// Tiers are tried in that order; the first confident answer wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisSource {
    KnowledgeBase,
    Cache,
    Ai,
}

impl DiagnosisSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::Cache => "cache",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for DiagnosisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CacheEntryStatus
// ---------------------------------------------------------------------------

/// Expiry status of a diagnosis cache entry relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEntryStatus {
    Active,
    Expired,
}

impl CacheEntryStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for CacheEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DiagnosisSource::KnowledgeBase, "\"knowledge_base\"")]
    #[case(DiagnosisSource::Cache, "\"cache\"")]
    #[case(DiagnosisSource::Ai, "\"ai\"")]
    fn diagnosis_source_serializes_snake_case(
        #[case] source: DiagnosisSource,
        #[case] expected: &str,
    ) {
        assert_eq!(serde_json::to_string(&source).unwrap(), expected);
        assert_eq!(format!("\"{source}\""), expected);
    }
}
