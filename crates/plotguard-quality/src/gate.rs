//! Pre-generation outline gate
//!
//! Checks that an outline carries enough structure to be expanded into
//! episodes: a complete season arc, the expected episode count and, per
//! episode, a conflict, four structured turning points, a setpiece, a
//! cliffhanger, an A thread and a crossover event.

use crate::findings::Findings;
use crate::profile::{GateRules, QcProfile};
use plotguard_contract::normalize;
use plotguard_core::{EpisodeBeat, Outline, TurningPointSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineQuality {
    Ok,
    Degraded,
    Rejected,
}

impl fmt::Display for OutlineQuality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Degraded => "degraded",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Outline gate verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcResult {
    pub passed: bool,
    pub quality: OutlineQuality,
    pub blockers: Vec<String>,
    pub warnings: Vec<String>,
    /// Numeric score (0-100)
    pub score: u32,
}

/// Gate an outline with the standard profile.
///
/// `expected_episodes == 0` skips the episode count check.
pub fn validate_outline(outline: &Outline, expected_episodes: u32) -> QcResult {
    validate_outline_with_profile(outline, expected_episodes, &QcProfile::standard())
}

pub fn validate_outline_with_profile(
    outline: &Outline,
    expected_episodes: u32,
    profile: &QcProfile,
) -> QcResult {
    let rules = &profile.gate;
    let mut findings = Findings::new();
    let blocker = rules.blocker_weight;

    // === Outline ===
    if outline.title.trim().is_empty() {
        findings.blocker("OUTLINE:title_missing", blocker);
    }
    let main_characters = outline
        .main_characters
        .iter()
        .filter(|c| !c.name().trim().is_empty())
        .count();
    if main_characters < rules.min_main_characters {
        findings.blocker(
            format!(
                "OUTLINE:main_characters_insufficient({}/{})",
                main_characters, rules.min_main_characters
            ),
            blocker,
        );
    }

    // === Season arc ===
    for (i, (field, value)) in outline.season_arc.milestones().iter().enumerate() {
        let min_chars = if i < 3 { rules.arc_opening_min_chars } else { rules.arc_closing_min_chars };
        let len = value.trim().chars().count();
        if len == 0 {
            findings.blocker(format!("SEASON_ARC:{}_missing", field), blocker);
        } else if len < min_chars {
            findings.blocker(format!("SEASON_ARC:{}_too_short", field), blocker);
        }
    }

    // === Episode count ===
    let got = outline.episode_beats.len();
    if expected_episodes > 0 && got != expected_episodes as usize {
        findings.blocker(
            format!("EPISODE_COUNT:expected_{}_got_{}", expected_episodes, got),
            blocker,
        );
    }

    // === Episodes ===
    for (index, beat) in outline.episode_beats.iter().enumerate() {
        let number = if beat.episode > 0 { beat.episode } else { index as u32 + 1 };
        check_episode(&mut findings, rules, number, beat);
    }

    let score = findings.score();
    let quality = if findings.has_blockers() {
        if score < rules.reject_below {
            OutlineQuality::Rejected
        } else {
            OutlineQuality::Degraded
        }
    } else if score >= rules.ok_score {
        OutlineQuality::Ok
    } else {
        OutlineQuality::Degraded
    };

    let result = QcResult {
        passed: !findings.has_blockers(),
        quality,
        blockers: findings.blockers(),
        warnings: findings.warnings(),
        score,
    };

    if result.passed {
        info!(score, %quality, warnings = result.warnings.len(), "outline gate passed");
    } else {
        warn!(score, %quality, blockers = result.blockers.len(), "outline gate failed");
    }
    result
}

fn check_episode(findings: &mut Findings, rules: &GateRules, number: u32, beat: &EpisodeBeat) {
    let blocker = rules.blocker_weight;
    let ep = format!("EP{}:", number);

    if beat.central_conflict.trim().chars().count() < rules.min_conflict_chars {
        findings.blocker(format!("{}central_conflict_missing", ep), blocker);
    }

    let tp_count = beat.turning_points.len();
    if tp_count < rules.min_turning_points {
        findings.blocker(
            format!("{}turning_points_insufficient({}/{})", ep, tp_count, rules.min_turning_points),
            blocker,
        );
    }

    for (i, source) in beat.turning_points.iter().enumerate() {
        let tp = format!("{}TP{}:", ep, i + 1);
        let structured = match source {
            TurningPointSource::Structured(tp) => tp,
            TurningPointSource::Legacy(_) => {
                findings.blocker(format!("{}not_structured", tp), blocker);
                continue;
            }
        };
        let fields = [
            ("agent", &structured.agent),
            ("event", &structured.event),
            ("consequence", &structured.consequence),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                findings.blocker(format!("{}{}_missing", tp, field), blocker);
            } else if is_generic(value, &rules.generic_phrases) {
                findings.warning(format!("{}{}_generic", tp, field), rules.warning_weight);
            }
        }
    }

    match &beat.setpiece {
        None => findings.blocker(format!("{}setpiece_missing", ep), blocker),
        Some(setpiece) => {
            if setpiece.name.trim().is_empty() {
                findings.blocker(format!("{}setpiece_name_missing", ep), blocker);
            }
            if setpiece.stakes.trim().is_empty() {
                findings.blocker(format!("{}setpiece_stakes_missing", ep), blocker);
            }
            if setpiece.participants.iter().all(|p| p.trim().is_empty()) {
                findings.blocker(format!("{}setpiece_participants_missing", ep), blocker);
            }
        }
    }

    let cliffhanger_len = beat
        .cliffhanger
        .as_ref()
        .map(|c| c.text().trim().chars().count())
        .unwrap_or(0);
    if cliffhanger_len < rules.min_cliffhanger_chars {
        findings.blocker(format!("{}cliffhanger_missing", ep), blocker);
    }

    if beat.thread_usage.a.trim().is_empty() {
        findings.blocker(format!("{}thread_usage_A_missing", ep), blocker);
    }
    if beat.crossover_event.trim().is_empty() {
        findings.blocker(format!("{}crossover_event_missing", ep), blocker);
    }
}

/// Whether the text contains one of the vague phrases as whole words
fn is_generic(text: &str, phrases: &[String]) -> bool {
    let padded = format!(" {} ", normalize(text));
    phrases
        .iter()
        .map(|p| normalize(p))
        .filter(|p| !p.is_empty())
        .any(|p| padded.contains(&format!(" {} ", p)))
}
