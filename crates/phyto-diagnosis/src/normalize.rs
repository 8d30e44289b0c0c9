//! Description normalization.
//!
//! Produces the comparison key shared by symptom extraction, cache
//! similarity and cache write-back. Two phrasings of the same complaint that
//! differ only in case, accents, punctuation or spacing get the same key.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonicalize free text into a comparison key.
///
/// Lowercases, strips diacritics (NFD then drop combining marks, with `đ`
/// folded to `d` since it has no decomposition), turns every
/// non-alphanumeric char into a separator and collapses separators to a
/// single space. Total and idempotent; `""` maps to `""`.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    let chars = text
        .nfd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c));
    for c in chars {
        let folded = if c == 'đ' { 'd' } else { c };
        if folded.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(folded);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Tokens of an already-normalized key.
pub fn tokens(key: &str) -> impl Iterator<Item = &str> {
    key.split(' ').filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("   ", "")]
    #[case("Yellow  Spots, on LEAVES!", "yellow spots on leaves")]
    #[case("lá bị đốm vàng", "la bi dom vang")]
    #[case("Đốm   trắng\ttrên lá", "dom trang tren la")]
    #[case("white-spots/leaf_curl", "white spots leaf curl")]
    #[case("  café crème ", "cafe creme")]
    fn normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn is_idempotent() {
        for text in ["Lá vàng, héo rũ!!", "Brown RINGS", "", "đ-Đ"] {
            let once = normalize(text);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn same_complaint_same_key() {
        assert_eq!(
            normalize("Yellow spots on leaves."),
            normalize("  yellow SPOTS   on leaves ")
        );
    }

    #[test]
    fn tokens_split_key() {
        assert_eq!(tokens("leaf curl").collect::<Vec<_>>(), vec!["leaf", "curl"]);
        assert_eq!(tokens("").count(), 0);
    }
}
