//! Plotguard Contract: Outline to EpisodeContract extraction
//!
//! Reads one episode beat of an outline and produces the structural
//! obligations every generated script for that episode must honor.
//! Extraction never fails: missing or malformed fields become empty or
//! placeholder values and are left for the QC gates to flag.
//!
//! # Example
//!
//! ```ignore
//! use plotguard_contract::extract_contract;
//! use plotguard_core::Outline;
//!
//! let outline = Outline::from_json(&std::fs::read_to_string("outline.json")?)?;
//! let contract = extract_contract(&outline, 1);
//! println!("{} turning points", contract.turning_points.len());
//! ```

pub mod entities;
pub mod matcher;
pub mod normalizer;

pub use entities::{classify_cliffhanger, cliffhanger_keywords, extract_open_question, parse_legacy_turning_point};
pub use matcher::{fuzzy_contains, loose_match, MatchCorpus, DEFAULT_THRESHOLD};
pub use normalizer::{dedupe, normalize};

use plotguard_core::{
    Cliffhanger, CliffhangerKind, CliffhangerSource, DilemmaSource, EpisodeBeat, EpisodeContract,
    FactionRule, MoralDilemma, Outline, Setpiece, ThreadRequirement, TurningPoint,
    TurningPointSource, UNKNOWN_AGENT,
};
use tracing::{debug, warn};

/// Factions kept when none can be tied to the episode's characters
const FALLBACK_FACTIONS: usize = 3;

/// Episodes at the end of the series that inherit the season's final choice
const FINALE_SLOTS: usize = 2;

/// Extract the contract for a 1-based episode number
pub fn extract_contract(outline: &Outline, episode_number: u32) -> EpisodeContract {
    let Some(beat) = outline.beat(episode_number) else {
        warn!(episode = episode_number, beats = outline.episode_beats.len(), "no beat for episode");
        return EpisodeContract {
            episode_number,
            ..Default::default()
        };
    };

    let threads_required = resolve_threads(outline, beat);
    let turning_points = normalize_turning_points(&beat.turning_points);
    let setpiece = beat
        .setpiece
        .as_ref()
        .map(|s| Setpiece {
            name: s.name.trim().to_string(),
            participants: dedupe(&s.participants),
            stakes: s.stakes.trim().to_string(),
        })
        .unwrap_or_default();
    let factions_in_play = derive_factions(outline, &turning_points, &setpiece);
    let cliffhanger = beat.cliffhanger.as_ref().map(normalize_cliffhanger).unwrap_or_default();
    let moral_dilemma = derive_moral_dilemma(outline, beat, episode_number);

    let stakes = dedupe(
        std::iter::once(setpiece.stakes.as_str())
            .chain(threads_required.iter().map(|t| t.stake.as_str()))
            .chain(beat.stakes.iter().map(String::as_str)),
    );

    let characters_required = dedupe(
        turning_points
            .iter()
            .filter(|tp| !tp.has_placeholder_agent())
            .map(|tp| tp.agent.as_str())
            .chain(setpiece.participants.iter().map(String::as_str))
            .chain(beat.characters_present.iter().map(String::as_str)),
    );

    debug!(
        episode = episode_number,
        threads = threads_required.len(),
        turning_points = turning_points.len(),
        factions = factions_in_play.len(),
        cliffhanger = %cliffhanger.kind,
        "contract extracted"
    );

    EpisodeContract {
        episode_number,
        title: beat.title.trim().to_string(),
        central_conflict: beat.central_conflict.trim().to_string(),
        threads_required,
        turning_points,
        factions_in_play,
        setpiece,
        cliffhanger,
        moral_dilemma,
        stakes,
        characters_required,
        crossover_event: beat.crossover_event.trim().to_string(),
    }
}

/// Extract one contract per episode beat, in order
pub fn extract_all_contracts(outline: &Outline) -> Vec<EpisodeContract> {
    (1..=outline.episode_beats.len() as u32)
        .map(|n| extract_contract(outline, n))
        .collect()
}

/// Resolve A/B/C pointers against the outline's threads; A is primary
fn resolve_threads(outline: &Outline, beat: &EpisodeBeat) -> Vec<ThreadRequirement> {
    let mut required: Vec<ThreadRequirement> = Vec::new();

    for (slot, id) in beat.thread_usage.pointers() {
        if required.iter().any(|t| t.id.eq_ignore_ascii_case(id)) {
            continue;
        }
        let requirement = match outline.thread(id) {
            Some(thread) => ThreadRequirement {
                id: thread.id.trim().to_string(),
                question: thread.question.trim().to_string(),
                engine: thread.engine.trim().to_string(),
                stake: thread.stake.trim().to_string(),
                is_primary: slot == "A",
            },
            None => {
                debug!(thread = id, slot, "thread pointer does not resolve");
                ThreadRequirement {
                    id: id.to_string(),
                    is_primary: slot == "A",
                    ..Default::default()
                }
            }
        };
        required.push(requirement);
    }

    required
}

/// Resolve every turning point into a structured triple with a stable id
pub fn normalize_turning_points(sources: &[TurningPointSource]) -> Vec<TurningPoint> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let structured = match source {
                TurningPointSource::Structured(tp) => tp.clone(),
                TurningPointSource::Legacy(text) => parse_legacy_turning_point(text),
            };
            let agent = structured.agent.trim();
            let ordinal = i as u32 + 1;
            TurningPoint {
                id: format!("tp_{}", ordinal),
                ordinal,
                agent: if agent.is_empty() { UNKNOWN_AGENT.to_string() } else { agent.to_string() },
                event: structured.event.trim().to_string(),
                consequence: structured.consequence.trim().to_string(),
            }
        })
        .collect()
}

/// Factions whose leader or members act in this episode.
///
/// Falls back to the first few factions when nobody matches, so an
/// outline with loosely named characters still carries faction rules.
fn derive_factions(outline: &Outline, turning_points: &[TurningPoint], setpiece: &Setpiece) -> Vec<FactionRule> {
    let actors: Vec<&str> = turning_points
        .iter()
        .filter(|tp| !tp.has_placeholder_agent())
        .map(|tp| tp.agent.as_str())
        .chain(setpiece.participants.iter().map(String::as_str))
        .collect();

    let to_rule = |f: &plotguard_core::Faction| FactionRule {
        name: f.name.trim().to_string(),
        objective: f.objective.trim().to_string(),
        method: f.method.trim().to_string(),
        red_line: f.red_line.trim().to_string(),
    };

    let matched: Vec<FactionRule> = outline
        .factions
        .iter()
        .filter(|faction| {
            std::iter::once(&faction.leader)
                .chain(faction.members.iter())
                .any(|person| actors.iter().any(|actor| loose_match(actor, person)))
        })
        .map(to_rule)
        .collect();

    if !matched.is_empty() {
        return matched;
    }

    outline.factions.iter().take(FALLBACK_FACTIONS).map(to_rule).collect()
}

/// Resolve either cliffhanger form into a typed cliffhanger
pub fn normalize_cliffhanger(source: &CliffhangerSource) -> Cliffhanger {
    match source {
        CliffhangerSource::Text(text) => Cliffhanger {
            kind: classify_cliffhanger(text),
            description: text.trim().to_string(),
            open_question: extract_open_question(text),
        },
        CliffhangerSource::Structured { kind, description, open_question } => {
            let kind = CliffhangerKind::parse(kind).unwrap_or_else(|| classify_cliffhanger(description));
            let open_question = if open_question.trim().is_empty() {
                extract_open_question(description)
            } else {
                open_question.trim().to_string()
            };
            Cliffhanger {
                kind,
                description: description.trim().to_string(),
                open_question,
            }
        }
    }
}

fn derive_moral_dilemma(outline: &Outline, beat: &EpisodeBeat, episode_number: u32) -> Option<MoralDilemma> {
    if let Some(explicit) = &beat.moral_dilemma {
        let question = explicit.text().trim();
        if !question.is_empty() {
            return Some(MoralDilemma {
                question: question.to_string(),
                source: DilemmaSource::Episode,
            });
        }
    }

    let total = outline.episode_beats.len();
    let in_finale = episode_number as usize + FINALE_SLOTS > total;
    let final_choice = outline.season_arc.final_choice.trim();
    if in_finale && !final_choice.is_empty() {
        return Some(MoralDilemma {
            question: final_choice.to_string(),
            source: DilemmaSource::SeasonFinale,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outline() -> Outline {
        serde_json::from_value(json!({
            "title": "Herencia",
            "season_arc": { "final_choice": "Marta must choose between family and justice" },
            "threads": [
                { "id": "T_MAIN", "question": "Will Marta recover the inheritance?", "stake": "the family house" },
                { "id": "T_LOVE", "question": "Will Marta trust Leo?", "stake": "her heart" }
            ],
            "factions": [
                { "name": "Cartel", "leader": "Don Ramiro", "members": ["Tito"], "red_line": "harming children" },
                { "name": "Police", "leader": "Inspector Vega" },
                { "name": "Church", "leader": "Father Luis" },
                { "name": "Press", "leader": "Clara" }
            ],
            "episode_beats": [
                {
                    "title": "Pilot",
                    "turning_points": [
                        { "agent": "Marta", "event": "finds the will", "consequence": "she confronts Leo" },
                        "Tito: burns the office -> the will is lost",
                        { "event": "a storm hits" }
                    ],
                    "setpiece": { "name": "The fire", "participants": ["Marta", "Tito"], "stakes": "the will" },
                    "cliffhanger": "Leo reveals he is Ramiro's son. Who sent him?",
                    "thread_usage": { "A": "t_main", "B": "T_LOVE", "C": "T_GHOST" },
                    "characters_present": ["Leo", "marta"],
                    "stakes": ["The will", "Marta's job"]
                },
                { "title": "Two" },
                { "title": "Three" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_threads_resolved_with_primary() {
        let contract = extract_contract(&outline(), 1);
        let ids: Vec<&str> = contract.threads_required.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T_MAIN", "T_LOVE", "T_GHOST"]);
        assert!(contract.threads_required[0].is_primary);
        assert!(!contract.threads_required[1].is_primary);
        assert!(contract.threads_required[2].question.is_empty());
    }

    #[test]
    fn test_turning_points_normalized() {
        let contract = extract_contract(&outline(), 1);
        let tps = &contract.turning_points;
        assert_eq!(tps.len(), 3);
        assert_eq!(tps[1].id, "tp_2");
        assert_eq!(tps[1].agent, "Tito");
        assert_eq!(tps[1].consequence, "the will is lost");
        assert_eq!(tps[2].agent, UNKNOWN_AGENT);
    }

    #[test]
    fn test_factions_matched_by_members() {
        let contract = extract_contract(&outline(), 1);
        assert_eq!(contract.factions_in_play.len(), 1);
        assert_eq!(contract.factions_in_play[0].name, "Cartel");
        assert_eq!(contract.factions_in_play[0].red_line, "harming children");
    }

    #[test]
    fn test_factions_fall_back_when_nobody_matches() {
        let contract = extract_contract(&outline(), 2);
        assert_eq!(contract.factions_in_play.len(), FALLBACK_FACTIONS);
        assert_eq!(contract.factions_in_play[2].name, "Church");
    }

    #[test]
    fn test_cliffhanger_classified() {
        let contract = extract_contract(&outline(), 1);
        assert_eq!(contract.cliffhanger.kind, CliffhangerKind::Revelation);
        assert_eq!(contract.cliffhanger.open_question, "Who sent him?");
    }

    #[test]
    fn test_declared_unknown_kind_is_kept() {
        let declared = |kind: &str| CliffhangerSource::Structured {
            kind: kind.to_string(),
            description: "A stranger arrives at the funeral".to_string(),
            open_question: String::new(),
        };
        assert_eq!(normalize_cliffhanger(&declared("unknown")).kind, CliffhangerKind::Unknown);
        assert_eq!(normalize_cliffhanger(&declared("")).kind, CliffhangerKind::Arrival);
        assert_eq!(normalize_cliffhanger(&declared("twist")).kind, CliffhangerKind::Arrival);
    }

    #[test]
    fn test_moral_dilemma_projected_into_finale() {
        let o = outline();
        assert!(extract_contract(&o, 1).moral_dilemma.is_none());
        let dilemma = extract_contract(&o, 2).moral_dilemma.unwrap();
        assert_eq!(dilemma.source, DilemmaSource::SeasonFinale);
        assert!(extract_contract(&o, 3).moral_dilemma.is_some());
    }

    #[test]
    fn test_stakes_and_characters_deduplicated() {
        let contract = extract_contract(&outline(), 1);
        assert_eq!(contract.stakes, vec!["the will", "the family house", "her heart", "Marta's job"]);
        assert_eq!(contract.characters_required, vec!["Marta", "Tito", "Leo"]);
    }

    #[test]
    fn test_missing_episode_degrades() {
        let contract = extract_contract(&outline(), 9);
        assert_eq!(contract.episode_number, 9);
        assert!(contract.turning_points.is_empty());
        assert!(!contract.has_cliffhanger());
    }

    #[test]
    fn test_extract_all() {
        assert_eq!(extract_all_contracts(&outline()).len(), 3);
    }
}
