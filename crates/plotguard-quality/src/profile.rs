//! QC profiles: every threshold and weight the validators use
//!
//! `standard` reproduces the engine's historical constants; `strict` is
//! meant for final drafts.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("PROFILE/IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("PROFILE/YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// QC profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcProfile {
    /// Profile name (e.g. "standard@1.0")
    pub name: String,
    pub gate: GateRules,
    pub batch: BatchRules,
    pub script: ScriptRules,
}

/// Pre-generation outline gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateRules {
    pub blocker_weight: u32,
    pub warning_weight: u32,
    /// Minimum score for `ok` when there are no blockers
    pub ok_score: u32,
    /// Below this score, blockers make the outline `rejected`
    pub reject_below: u32,
    /// Minimum length of inciting_incident, first_turn, midpoint_reversal
    pub arc_opening_min_chars: usize,
    /// Minimum length of all_is_lost, final_choice
    pub arc_closing_min_chars: usize,
    pub min_turning_points: usize,
    pub min_main_characters: usize,
    pub min_conflict_chars: usize,
    pub min_cliffhanger_chars: usize,
    /// Phrases that mark a turning-point field as placeholder writing
    pub generic_phrases: Vec<String>,
}

/// Per-batch validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchRules {
    pub event_threshold: f64,
    pub cliffhanger_threshold: f64,
    /// Batches with more blockers than this are not repaired
    pub max_repairable_blockers: usize,
}

/// Whole-script validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptRules {
    // === Threads ===
    pub thread_min_mentions: usize,
    pub thread_question_threshold: f64,
    pub thread_block_below: f64,
    pub thread_warn_below: f64,
    pub thread_block_weight: u32,
    pub thread_warn_weight: u32,

    // === Turning points ===
    pub event_threshold: f64,
    pub consequence_threshold: f64,
    pub turning_point_weight: u32,
    pub consequence_weight: u32,

    // === Cliffhanger ===
    pub cliffhanger_threshold: f64,
    pub cliffhanger_present_score: u32,
    pub cliffhanger_min_chars: usize,
    pub cliffhanger_weight: u32,
    pub cliffhanger_keyword_weight: u32,

    // === Characters, setpiece, red lines ===
    pub character_warn_below: f64,
    pub character_low_weight: u32,
    pub character_missing_weight: u32,
    pub setpiece_weight: u32,
    pub red_line_threshold: f64,
    pub red_line_weight: u32,

    // === Scene depth ===
    pub min_raw_chars: usize,
    pub min_action_chars: usize,
    pub placeholders: Vec<String>,
    pub depth_block_above: f64,
    pub depth_warn_from: f64,
    pub depth_block_weight: u32,
    pub depth_warn_weight: u32,

    // === Tiers ===
    pub excellent_score: u32,
    pub good_score: u32,
    pub acceptable_score: u32,
    /// With blockers, scores at or above this are `poor` instead of `failed`
    pub poor_floor: u32,
}

impl Default for GateRules {
    fn default() -> Self {
        Self {
            blocker_weight: 15,
            warning_weight: 3,
            ok_score: 80,
            reject_below: 60,
            arc_opening_min_chars: 20,
            arc_closing_min_chars: 15,
            min_turning_points: 4,
            min_main_characters: 3,
            min_conflict_chars: 12,
            min_cliffhanger_chars: 12,
            generic_phrases: [
                "something happens",
                "things get complicated",
                "things change",
                "everything changes",
                "conflict arises",
                "tension rises",
                "a problem appears",
                "algo pasa",
                "algo sucede",
                "las cosas se complican",
                "todo cambia",
                "surge un conflicto",
                "aumenta la tension",
                "aparece un problema",
                "etc",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for BatchRules {
    fn default() -> Self {
        Self {
            event_threshold: 0.6,
            cliffhanger_threshold: 0.7,
            max_repairable_blockers: 2,
        }
    }
}

impl Default for ScriptRules {
    fn default() -> Self {
        Self {
            thread_min_mentions: 2,
            thread_question_threshold: 0.7,
            thread_block_below: 0.5,
            thread_warn_below: 0.8,
            thread_block_weight: 25,
            thread_warn_weight: 10,
            event_threshold: 0.6,
            consequence_threshold: 0.5,
            turning_point_weight: 25,
            consequence_weight: 5,
            cliffhanger_threshold: 0.7,
            cliffhanger_present_score: 50,
            cliffhanger_min_chars: 100,
            cliffhanger_weight: 20,
            cliffhanger_keyword_weight: 5,
            character_warn_below: 0.5,
            character_low_weight: 15,
            character_missing_weight: 5,
            setpiece_weight: 10,
            red_line_threshold: 0.7,
            red_line_weight: 5,
            min_raw_chars: 300,
            min_action_chars: 80,
            placeholders: [
                "pendiente",
                "tbd",
                "todo:",
                "lorem ipsum",
                "placeholder",
                "[insert",
                "por definir",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            depth_block_above: 0.5,
            depth_warn_from: 0.25,
            depth_block_weight: 20,
            depth_warn_weight: 10,
            excellent_score: 90,
            good_score: 75,
            acceptable_score: 60,
            poor_floor: 50,
        }
    }
}

impl QcProfile {
    /// Thresholds and weights the engine has always used
    pub fn standard() -> Self {
        Self {
            name: "standard@1.0".to_string(),
            gate: GateRules::default(),
            batch: BatchRules::default(),
            script: ScriptRules::default(),
        }
    }

    /// Tighter matching and heavier penalties for final drafts
    pub fn strict() -> Self {
        let mut profile = Self::standard();
        profile.name = "strict@1.0".to_string();

        profile.gate.warning_weight = 5;
        profile.gate.ok_score = 90;

        profile.batch.event_threshold = 0.7;
        profile.batch.max_repairable_blockers = 1;

        profile.script.thread_warn_below = 1.0;
        profile.script.event_threshold = 0.7;
        profile.script.consequence_threshold = 0.6;
        profile.script.consequence_weight = 10;
        profile.script.character_missing_weight = 10;
        profile.script.min_raw_chars = 500;
        profile.script.min_action_chars = 120;
        profile.script.depth_warn_from = 0.1;
        profile
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ProfileError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Get profile by name; unknown names fall back to `standard`
    pub fn for_name(name: &str) -> Self {
        match name.split('@').next().unwrap_or(name) {
            "strict" => Self::strict(),
            _ => Self::standard(),
        }
    }
}

impl Default for QcProfile {
    fn default() -> Self {
        Self::standard()
    }
}
