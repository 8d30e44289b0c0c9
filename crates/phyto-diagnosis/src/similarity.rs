//! Pluggable text similarity for cache candidate selection.
//!
//! The cache tier only needs a score in `[0, 1]` between two normalized
//! keys. [`TrigramSimilarity`] is the default and mirrors the `pg_trgm`
//! definition, computed in process so any store can back the cache.

use std::collections::HashSet;

/// A string similarity measure over normalized descriptions.
pub trait Similarity: Send + Sync {
    /// Similarity of `a` and `b`, in `[0, 1]`. `1.0` means identical keys.
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Character trigram Jaccard similarity.
///
/// Each word is padded with two leading spaces and one trailing space before
/// its trigrams are taken, so word starts weigh more than word ends. The
/// score is `|A ∩ B| / |A ∪ B|` over the two trigram sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrigramSimilarity;

impl TrigramSimilarity {
    /// Trigram set of `text`.
    #[must_use]
    pub fn trigrams(text: &str) -> HashSet<[char; 3]> {
        let mut set = HashSet::new();
        for word in text.split_whitespace() {
            let padded: Vec<char> = [' ', ' ']
                .into_iter()
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();
            for window in padded.windows(3) {
                set.insert([window[0], window[1], window[2]]);
            }
        }
        set
    }
}

impl Similarity for TrigramSimilarity {
    #[allow(clippy::cast_precision_loss)]
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let left = Self::trigrams(a);
        let right = Self::trigrams(b);
        let union = left.union(&right).count();
        if union == 0 {
            return 0.0;
        }
        let shared = left.intersection(&right).count();
        shared as f64 / union as f64
    }
}

impl<S: Similarity + ?Sized> Similarity for std::sync::Arc<S> {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        (**self).similarity(a, b)
    }
}
