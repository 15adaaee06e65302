//! Derived records: EpisodeContract and BatchPlan
//!
//! Both are produced by the engine itself, once per episode, and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent used when a structured turning point omits its agent.
pub const UNKNOWN_AGENT: &str = "UNKNOWN";

/// Agent used when a legacy turning-point string cannot be split.
pub const UNSPECIFIED_AGENT: &str = "UNSPECIFIED";

/// Non-negotiable structural obligations of one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeContract {
    pub episode_number: u32,
    pub title: String,
    pub central_conflict: String,
    pub threads_required: Vec<ThreadRequirement>,
    pub turning_points: Vec<TurningPoint>,
    pub factions_in_play: Vec<FactionRule>,
    pub setpiece: Setpiece,
    pub cliffhanger: Cliffhanger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moral_dilemma: Option<MoralDilemma>,
    pub stakes: Vec<String>,
    pub characters_required: Vec<String>,
    pub crossover_event: String,
}

impl EpisodeContract {
    /// The thread marked primary (the episode's A story)
    pub fn primary_thread(&self) -> Option<&ThreadRequirement> {
        self.threads_required.iter().find(|t| t.is_primary)
    }

    pub fn thread(&self, id: &str) -> Option<&ThreadRequirement> {
        self.threads_required.iter().find(|t| t.id.eq_ignore_ascii_case(id))
    }

    pub fn has_cliffhanger(&self) -> bool {
        !self.cliffhanger.description.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRequirement {
    pub id: String,
    pub question: String,
    pub engine: String,
    pub stake: String,
    pub is_primary: bool,
}

/// A mandatory plot event: who does what, and what it causes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurningPoint {
    /// Stable id, `tp_<ordinal>` unless the caller supplied one
    pub id: String,
    /// 1-based position within the episode
    pub ordinal: u32,
    pub agent: String,
    pub event: String,
    pub consequence: String,
}

impl TurningPoint {
    /// Whether the agent is a placeholder rather than a character
    pub fn has_placeholder_agent(&self) -> bool {
        let agent = self.agent.trim();
        agent.is_empty() || agent == UNKNOWN_AGENT || agent == UNSPECIFIED_AGENT
    }
}

impl fmt::Display for TurningPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.agent, self.event, self.consequence)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionRule {
    pub name: String,
    pub objective: String,
    pub method: String,
    pub red_line: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setpiece {
    pub name: String,
    pub participants: Vec<String>,
    pub stakes: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliffhangerKind {
    Revelation,
    Danger,
    Decision,
    Arrival,
    Betrayal,
    #[default]
    Unknown,
}

impl CliffhangerKind {
    /// Parse a declared type name; unrecognized names are `None`, while an
    /// explicit "unknown" is `Unknown`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "revelation" | "revelacion" | "revelación" | "reveal" => Some(Self::Revelation),
            "danger" | "peligro" | "threat" => Some(Self::Danger),
            "decision" | "decisión" | "choice" => Some(Self::Decision),
            "arrival" | "llegada" => Some(Self::Arrival),
            "betrayal" | "traicion" | "traición" => Some(Self::Betrayal),
            "unknown" | "desconocido" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revelation => "revelation",
            Self::Danger => "danger",
            Self::Decision => "decision",
            Self::Arrival => "arrival",
            Self::Betrayal => "betrayal",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CliffhangerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cliffhanger {
    pub kind: CliffhangerKind,
    pub description: String,
    /// Question the audience carries into the next episode
    pub open_question: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DilemmaSource {
    Episode,
    SeasonFinale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoralDilemma {
    pub question: String,
    pub source: DilemmaSource,
}

// ============================================================================
// Batch plan
// ============================================================================

/// Coverage obligations for one generation batch of an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub episode_number: u32,
    /// 0-based position in the plan list
    pub batch_index: u32,
    pub batch_count: u32,
    pub required_threads: Vec<String>,
    pub required_turning_points: Vec<TurningPoint>,
    pub required_characters: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_factions: Vec<String>,
    pub scene_focus: String,
    /// Scenes the generator is asked to write for this batch
    pub scene_count: u32,
    pub is_last_batch: bool,
    pub must_include_cliffhanger: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliffhanger: Option<String>,
}

impl BatchPlan {
    /// Ids of the turning points owned by this batch
    pub fn turning_point_ids(&self) -> Vec<&str> {
        self.required_turning_points.iter().map(|tp| tp.id.as_str()).collect()
    }
}
