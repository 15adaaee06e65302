//! Entity extraction for outline free text.
//!
//! Resolves the loosely written parts of an outline into typed values:
//! - Legacy turning-point strings into agent/event/consequence triples
//! - Cliffhanger text into a cliffhanger kind
//! - The open question a cliffhanger leaves behind

use crate::normalizer::normalize;
use lazy_static::lazy_static;
use plotguard_core::{CliffhangerKind, StructuredTurningPoint, UNSPECIFIED_AGENT};
use regex::Regex;

lazy_static! {
    /// `Agent: event -> consequence` and its dash/pipe/semicolon variants
    static ref THREE_PART: Regex = Regex::new(
        r"^\s*(?P<agent>[^:|;→—–]+?)(?:\s*[:|—–]\s*|\s+-\s+)(?P<event>.+?)(?:\s*(?:->|=>|→|[|—–;])\s*|\s+-\s+)(?P<consequence>.+?)\s*$"
    ).unwrap();

    /// `Agent: event`
    static ref TWO_PART: Regex = Regex::new(
        r"^\s*(?P<agent>[^:|;→—–]+?)\s*[:|—–]\s*(?P<event>.+?)\s*$"
    ).unwrap();

    /// `event -> consequence` with no agent named
    static ref CAUSAL: Regex = Regex::new(
        r"^\s*(?P<event>.+?)\s*(?:->|=>|→)\s*(?P<consequence>.+?)\s*$"
    ).unwrap();

    /// Keyword tables per cliffhanger kind, in classification order.
    /// Keywords are pre-normalized (lowercase, no diacritics).
    static ref CLIFFHANGER_KEYWORDS: Vec<(CliffhangerKind, Vec<&'static str>)> = vec![
        (CliffhangerKind::Betrayal, vec![
            "traicion", "traiciona", "traidor", "betray", "traitor", "double agent",
            "doble agente", "backstab", "sells out", "vende a",
        ]),
        (CliffhangerKind::Revelation, vec![
            "revela", "reveal", "descubre", "discover", "secreto", "secret", "verdad",
            "truth", "identidad", "identity", "resulta ser", "turns out", "confiesa", "confess",
        ]),
        (CliffhangerKind::Danger, vec![
            "peligro", "danger", "amenaza", "threat", "bomba", "bomb", "disparo", "gunshot",
            "ataque", "attack", "trampa", "trap", "muere", "dying", "herido", "wounded",
            "explosion", "secuestr", "kidnap",
        ]),
        (CliffhangerKind::Decision, vec![
            "decide", "decision", "elegir", "elige", "choose", "choice", "dilema", "dilemma",
            "debe escoger", "must choose", "ultimatum",
        ]),
        (CliffhangerKind::Arrival, vec![
            "llega", "arrive", "arrival", "aparece", "appears", "regresa", "returns", "vuelve",
            "irrumpe", "bursts in", "en la puerta", "at the door",
        ]),
    ];
}

/// Agents longer than this many words are taken to be a sentence, not a name
const MAX_AGENT_WORDS: usize = 6;

/// Split a legacy turning-point string into a structured triple.
///
/// Best effort: when no separator pattern yields a plausible agent, the
/// agent is [`UNSPECIFIED_AGENT`] and the whole text becomes the event.
pub fn parse_legacy_turning_point(text: &str) -> StructuredTurningPoint {
    let text = text.trim();

    if let Some(caps) = THREE_PART.captures(text) {
        let agent = caps["agent"].trim();
        if plausible_agent(agent) {
            return StructuredTurningPoint {
                agent: agent.to_string(),
                event: caps["event"].trim().to_string(),
                consequence: caps["consequence"].trim().to_string(),
            };
        }
    }

    if let Some(caps) = TWO_PART.captures(text) {
        let agent = caps["agent"].trim();
        if plausible_agent(agent) {
            return StructuredTurningPoint {
                agent: agent.to_string(),
                event: caps["event"].trim().to_string(),
                consequence: String::new(),
            };
        }
    }

    if let Some(caps) = CAUSAL.captures(text) {
        return StructuredTurningPoint {
            agent: UNSPECIFIED_AGENT.to_string(),
            event: caps["event"].trim().to_string(),
            consequence: caps["consequence"].trim().to_string(),
        };
    }

    StructuredTurningPoint {
        agent: UNSPECIFIED_AGENT.to_string(),
        event: text.to_string(),
        consequence: String::new(),
    }
}

fn plausible_agent(agent: &str) -> bool {
    let words = agent.split_whitespace().count();
    words > 0 && words <= MAX_AGENT_WORDS
}

/// Classify cliffhanger text by keyword lookup.
///
/// Tables are checked in a fixed order (betrayal, revelation, danger,
/// decision, arrival); the first table with a hit wins.
pub fn classify_cliffhanger(text: &str) -> CliffhangerKind {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return CliffhangerKind::Unknown;
    }
    CLIFFHANGER_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(CliffhangerKind::Unknown)
}

/// Keywords that signal a cliffhanger of the given kind.
///
/// `Unknown` gets the union of every table.
pub fn cliffhanger_keywords(kind: CliffhangerKind) -> Vec<&'static str> {
    CLIFFHANGER_KEYWORDS
        .iter()
        .filter(|(k, _)| kind == CliffhangerKind::Unknown || *k == kind)
        .flat_map(|(_, keywords)| keywords.iter().copied())
        .collect()
}

/// Last question in the text, from its sentence start to the `?`
pub fn extract_open_question(text: &str) -> String {
    let Some(end) = text.rfind('?') else {
        return String::new();
    };
    let start = text[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| matches!(c, '.' | '!' | '?' | '\n'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    text[start..=end].trim().to_string()
}
