//! In-memory symptom dictionary and symptom extraction.
//!
//! The dictionary is an immutable snapshot built from the symptom table.
//! [`DictionaryHandle`] hands out `Arc` clones of the current snapshot and
//! swaps in a fresh one on reload; a snapshot is never edited after it is
//! built, so readers never observe a half-updated dictionary.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use phyto_core::entities::SymptomEntry;
use phyto_db::error::DatabaseError;
use phyto_db::service::PhytoService;

use crate::normalize::{normalize, tokens};

/// A dictionary entry with its name pre-normalized for matching.
#[derive(Debug, Clone)]
pub struct DictionaryTerm {
    pub entry: SymptomEntry,
    /// Normalized name.
    pub key: String,
    key_tokens: Vec<String>,
}

impl DictionaryTerm {
    fn new(entry: SymptomEntry) -> Self {
        let key = normalize(&entry.name);
        let key_tokens = tokens(&key).map(ToString::to_string).collect();
        Self {
            entry,
            key,
            key_tokens,
        }
    }
}

/// Immutable snapshot of the symptom dictionary.
#[derive(Debug, Clone, Default)]
pub struct SymptomDictionary {
    terms: Vec<DictionaryTerm>,
}

impl SymptomDictionary {
    /// Build a snapshot. Entries whose name normalizes to nothing are dropped.
    #[must_use]
    pub fn new(entries: Vec<SymptomEntry>) -> Self {
        let terms = entries
            .into_iter()
            .map(DictionaryTerm::new)
            .filter(|t| !t.key_tokens.is_empty())
            .collect();
        Self { terms }
    }

    /// Load every symptom from the store.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the symptom table cannot be read.
    pub async fn load(store: &PhytoService) -> Result<Self, DatabaseError> {
        Ok(Self::new(store.get_all_symptoms().await?))
    }

    pub fn terms(&self) -> &[DictionaryTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SymptomEntry> {
        self.terms.iter().map(|t| &t.entry).find(|e| e.id == id)
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a SymptomEntry> {
        self.terms
            .iter()
            .map(|t| &t.entry)
            .filter(move |e| e.category.eq_ignore_ascii_case(category))
    }
}

/// Shared, swappable reference to the current dictionary snapshot.
#[derive(Debug, Default)]
pub struct DictionaryHandle {
    current: RwLock<Arc<SymptomDictionary>>,
}

impl DictionaryHandle {
    pub fn new(dictionary: SymptomDictionary) -> Self {
        Self {
            current: RwLock::new(Arc::new(dictionary)),
        }
    }

    /// The current snapshot. The lock is released before this returns.
    pub fn snapshot(&self) -> Arc<SymptomDictionary> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swap in `dictionary`. Snapshots already handed out stay valid.
    pub fn replace(&self, dictionary: SymptomDictionary) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(dictionary);
    }

    /// Rebuild the snapshot from the store and swap it in.
    /// Returns the number of terms in the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the symptom table cannot be read; the
    /// current snapshot is kept in that case.
    pub async fn reload(&self, store: &PhytoService) -> Result<usize, DatabaseError> {
        let fresh = SymptomDictionary::load(store).await?;
        let len = fresh.len();
        self.replace(fresh);
        tracing::info!(terms = len, "symptom dictionary reloaded");
        Ok(len)
    }
}

/// Maps normalized text to dictionary symptom IDs.
#[derive(Debug, Clone, Copy)]
pub struct SymptomExtractor {
    /// Maximum Levenshtein distance for a fuzzy match; `0` means exact only.
    pub max_distance: usize,
    /// Terms with fewer chars than this only match exactly.
    pub min_term_len: usize,
}

impl Default for SymptomExtractor {
    fn default() -> Self {
        Self {
            max_distance: 1,
            min_term_len: 5,
        }
    }
}

impl SymptomExtractor {
    pub const fn exact() -> Self {
        Self {
            max_distance: 0,
            min_term_len: usize::MAX,
        }
    }

    /// IDs of the dictionary terms found in `text`.
    ///
    /// A term matches when its token sequence occurs as a contiguous run of
    /// input tokens. Long enough terms also match a run of the same number
    /// of tokens within `max_distance` edits. The input is normalized first,
    /// so raw and pre-normalized text give the same result.
    pub fn extract(&self, dictionary: &SymptomDictionary, text: &str) -> BTreeSet<String> {
        let key = normalize(text);
        let input: Vec<&str> = tokens(&key).collect();
        let mut found = BTreeSet::new();
        if input.is_empty() {
            return found;
        }

        for term in dictionary.terms() {
            if self.matches(term, &input) {
                found.insert(term.entry.id.clone());
            }
        }

        if found.is_empty() {
            tracing::debug!(text = %key, "no dictionary symptom recognized");
        }
        found
    }

    fn matches(&self, term: &DictionaryTerm, input: &[&str]) -> bool {
        let n = term.key_tokens.len();
        if n > input.len() {
            return false;
        }
        let fuzzy = self.max_distance > 0 && term.key.chars().count() >= self.min_term_len;

        input.windows(n).any(|window| {
            if window.iter().zip(&term.key_tokens).all(|(a, b)| *a == b) {
                return true;
            }
            fuzzy && levenshtein(&window.join(" "), &term.key) <= self.max_distance
        })
    }
}

/// Char-level Levenshtein edit distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
