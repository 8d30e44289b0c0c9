//! Partial-update builders for mutable entities.

pub mod diagnosis_cache;
