//! # phyto-diagnosis
//!
//! Tiered plant diagnosis for Phyto.
//!
//! A request is answered by the first tier that is confident:
//! - the curated knowledge base, by weighted symptom overlap ([`knowledge`])
//! - the cache of earlier AI answers, by text similarity blended with
//!   symptom overlap ([`cache_match`])
//! - the AI vision gateway, whose answer is then cached ([`engine`])
//!
//! Descriptions are normalized ([`normalize`]) and mapped to dictionary
//! symptoms ([`dictionary`]) before any tier runs. [`lifecycle`] owns hit
//! counting and the background expiry sweep.

pub mod answer;
pub mod cache_match;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod lifecycle;
pub mod normalize;
pub mod similarity;

pub use cache_match::CacheMatcher;
pub use dictionary::{DictionaryHandle, SymptomDictionary, SymptomExtractor};
pub use engine::{Diagnosis, DiagnosisEngine, DiagnosisRequest, DiagnosisState, EngineSettings};
pub use error::DiagnosisError;
pub use knowledge::KnowledgeBaseMatcher;
pub use lifecycle::{CacheLifecycle, CacheSweeper, SweepOutcome};
pub use similarity::{Similarity, TrigramSimilarity};
