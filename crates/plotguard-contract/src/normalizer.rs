//! Text normalization for contract matching.
//!
//! Outlines and scripts mix English and Spanish, capitalization and
//! punctuation freely. Everything compared by the engine goes through
//! [`normalize`] first:
//! - Lowercase conversion
//! - Diacritic stripping (á → a, ñ → n, ç → c)
//! - Non-alphanumerics collapsed to single spaces; letters of other
//!   scripts (ß, æ, Cyrillic, CJK) are kept as they are

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    /// Accented characters and their plain forms (lowercase only; input is
    /// lowercased first)
    static ref DIACRITICS: HashMap<char, char> = {
        let mut m = HashMap::new();
        for (plain, accented) in [
            ('a', "áàâäãåāą"),
            ('e', "éèêëēę"),
            ('i', "íìîïī"),
            ('o', "óòôöõøōő"),
            ('u', "úùûüūű"),
            ('n', "ñ"),
            ('c', "ç"),
            ('y', "ýÿ"),
            ('l', "ł"),
            ('d', "đ"),
        ] {
            for c in accented.chars() {
                m.insert(c, plain);
            }
        }
        m
    };

    /// Runs of anything that is not a letter or digit
    static ref NON_ALNUM: Regex = Regex::new(r"[^\p{Alphabetic}\p{Nd}]+").unwrap();
}

/// Words shorter than this carry no weight in word-overlap matching
pub const SIGNIFICANT_WORD_MIN_CHARS: usize = 4;

/// Normalize text for matching
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(|c| *DIACRITICS.get(&c).unwrap_or(&c))
        .collect();

    NON_ALNUM.replace_all(&folded, " ").trim().to_string()
}

/// Words of a normalized string long enough to be meaningful
pub fn significant_words(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|w| w.chars().count() >= SIGNIFICANT_WORD_MIN_CHARS)
        .collect()
}

/// Deduplicate case-insensitively, keeping the first spelling and order.
/// Blank entries are dropped and the rest trimmed.
pub fn dedupe<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(normalize(trimmed)) {
            out.push(trimmed.to_string());
        }
    }
    out
}
