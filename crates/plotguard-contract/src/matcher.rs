//! Fuzzy containment matching.
//!
//! The validators cannot read generated prose; they approximate it with a
//! single primitive: normalize both sides, accept an exact substring, and
//! for longer needles accept when enough of the needle's significant words
//! occur in the haystack.

use crate::normalizer::{normalize, significant_words};
use std::collections::HashSet;

/// Word-overlap ratio required when no threshold is given
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Needles shorter than this (normalized chars) only match exactly
pub const MIN_FUZZY_NEEDLE_CHARS: usize = 15;

/// Normalized haystack, prepared once and queried many times
#[derive(Debug, Clone, Default)]
pub struct MatchCorpus {
    normalized: String,
    words: HashSet<String>,
}

impl MatchCorpus {
    pub fn new(text: &str) -> Self {
        let normalized = normalize(text);
        let words = normalized.split_whitespace().map(str::to_string).collect();
        Self { normalized, words }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Length of the normalized text in chars
    pub fn len(&self) -> usize {
        self.normalized.chars().count()
    }

    /// Fuzzy containment of `needle` at the given word-overlap threshold
    pub fn contains(&self, needle: &str, threshold: f64) -> bool {
        let needle = normalize(needle);
        if needle.is_empty() || self.normalized.is_empty() {
            return false;
        }
        if self.normalized.contains(&needle) {
            return true;
        }
        if needle.chars().count() < MIN_FUZZY_NEEDLE_CHARS {
            return false;
        }
        self.overlap_of_normalized(&needle) >= threshold
    }

    /// Share of the needle's significant words present in the corpus
    pub fn word_overlap(&self, needle: &str) -> f64 {
        self.overlap_of_normalized(&normalize(needle))
    }

    /// Whole-word occurrences of `needle` (normalized) in the corpus
    pub fn count_mentions(&self, needle: &str) -> usize {
        let needle = normalize(needle);
        let needle: Vec<&str> = needle.split_whitespace().collect();
        if needle.is_empty() {
            return 0;
        }
        let words: Vec<&str> = self.normalized.split_whitespace().collect();
        words.windows(needle.len()).filter(|w| *w == needle.as_slice()).count()
    }

    /// Whether any of the keywords occurs as a substring
    pub fn contains_any(&self, keywords: &[&str]) -> Option<String> {
        keywords
            .iter()
            .map(|k| normalize(k))
            .find(|k| !k.is_empty() && self.normalized.contains(k.as_str()))
    }

    fn overlap_of_normalized(&self, needle: &str) -> f64 {
        let words = significant_words(needle);
        if words.is_empty() {
            return 0.0;
        }
        let hits = words.iter().filter(|w| self.words.contains(**w)).count();
        hits as f64 / words.len() as f64
    }
}

/// One-off fuzzy containment
pub fn fuzzy_contains(haystack: &str, needle: &str, threshold: f64) -> bool {
    MatchCorpus::new(haystack).contains(needle, threshold)
}

/// A lone word shorter than this never matches inside a longer id or name
pub const MIN_LOOSE_WORD_CHARS: usize = 3;

/// Token-wise containment in either direction.
///
/// Used to reconcile ids the generator echoes back ("t_main_arc") with the
/// ids it was given ("T_MAIN"), and short names with full ones ("Ramiro",
/// "Don Ramiro"). Both sides are normalized and split into words; the
/// shorter word sequence must appear whole and in order inside the longer
/// one, so "tp_1" never matches "tp_10". A single short word ("t", "tp")
/// matches only an identical string. Blank strings never match.
pub fn loose_match(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }

    let a: Vec<&str> = a.split(' ').collect();
    let b: Vec<&str> = b.split(' ').collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.len() == 1 && short[0].chars().count() < MIN_LOOSE_WORD_CHARS {
        return false;
    }
    long.windows(short.len()).any(|window| window == short.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_substring_after_normalization() {
        assert!(fuzzy_contains("Ana ROBA el banco.", "roba el banco", 0.7));
        assert!(fuzzy_contains("La traición de Bruno", "traicion", 0.7));
    }

    #[test]
    fn test_short_needle_needs_exact_match() {
        // "vault ana" is under 15 chars: word overlap is not tried
        assert!(!fuzzy_contains("ana opens the vault", "vault ana", 0.1));
    }

    #[test]
    fn test_word_overlap_for_long_needles() {
        let corpus = MatchCorpus::new("Marta finally confronts her brother about the stolen inheritance money");
        assert!(corpus.contains("Marta confronts brother over inheritance", 0.7));
        assert!(!corpus.contains("Marta forgives her father at the funeral", 0.7));
    }

    #[test]
    fn test_threshold_boundary() {
        let corpus = MatchCorpus::new("alpha bravo charlie");
        // 3 of 4 significant words present
        let needle = "alpha bravo charlie delta";
        assert!((corpus.word_overlap(needle) - 0.75).abs() < f64::EPSILON);
        assert!(corpus.contains(needle, 0.7));
        assert!(!corpus.contains(needle, 0.8));
    }

    #[test]
    fn test_empty_inputs_never_match() {
        assert!(!fuzzy_contains("", "anything at all here", 0.0));
        assert!(!fuzzy_contains("text", "", 0.0));
        assert!(!fuzzy_contains("text", "!!!", 0.0));
    }

    #[test]
    fn test_count_mentions() {
        let corpus = MatchCorpus::new("T_MAIN begins. Later t-main returns; t main t main.");
        assert_eq!(corpus.count_mentions("T_MAIN"), 4);
        assert_eq!(corpus.count_mentions("main"), 4);
        assert_eq!(corpus.count_mentions("ghost"), 0);
    }

    #[test]
    fn test_loose_match_both_directions() {
        assert!(loose_match("t_main_arc", "T_MAIN"));
        assert!(loose_match("T_MAIN", "t_main_arc"));
        assert!(!loose_match("T_B", "romance"));
        assert!(!loose_match("", "x"));
        assert!(loose_match("Ramiro", "Don Ramiro"));
        assert!(loose_match("thread T_A", "t_a"));
    }

    #[test]
    fn test_loose_match_respects_word_boundaries() {
        assert!(!loose_match("tp_10", "tp_1"));
        assert!(!loose_match("tp_1", "tp_10"));
        assert!(loose_match("TP_1", "tp-1"));
        assert!(!loose_match("t", "T_MAIN"));
        assert!(!loose_match("tp", "tp_4"));
        assert!(loose_match("t", "T"));
        assert!(!loose_match("Ana", "Anabel Ruiz"));
        assert!(!loose_match("main arc", "t_arc_main"));
    }

    #[test]
    fn test_contains_any() {
        let corpus = MatchCorpus::new("Alguien revela el secreto");
        assert_eq!(corpus.contains_any(&["bomba", "secreto"]), Some("secreto".to_string()));
        assert_eq!(corpus.contains_any(&["bomba"]), None);
    }
}
