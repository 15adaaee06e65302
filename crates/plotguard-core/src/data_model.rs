//! Data Model: Outline, Script, BatchResult
//!
//! Records produced outside the engine (the outline editor and the scene
//! generator). All of them are untrusted: every field is optional and
//! decoded through [`crate::lenient`].

use crate::{lenient, PlotguardError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether a document path names YAML (`.yaml`/`.yml`); anything else is JSON
pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("yaml") | Some("yml")
    )
}

/// Read a JSON or YAML document, chosen by extension
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, PlotguardError> {
    let text = std::fs::read_to_string(path)?;
    let parsed = if is_yaml_path(path) {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| PlotguardError::Parse(format!("{}: {}", path.display(), e)))
}

// ============================================================================
// Outline
// ============================================================================

/// Full story outline as drafted before episode generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outline {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub main_characters: Vec<Character>,
    #[serde(default, deserialize_with = "lenient::record")]
    pub season_arc: SeasonArc,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub threads: Vec<Thread>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub factions: Vec<Faction>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub entity_rules: Vec<EntityRule>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub episode_beats: Vec<EpisodeBeat>,
}

impl Outline {
    /// Parse an outline from JSON text
    pub fn from_json(json: &str) -> Result<Self, PlotguardError> {
        serde_json::from_str(json).map_err(|e| PlotguardError::Parse(e.to_string()))
    }

    /// Parse an outline from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self, PlotguardError> {
        serde_yaml::from_str(yaml).map_err(|e| PlotguardError::Parse(e.to_string()))
    }

    /// Read an outline file, JSON or YAML by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlotguardError> {
        load_document(path.as_ref())
    }

    /// Beat for a 1-based episode number
    pub fn beat(&self, episode_number: u32) -> Option<&EpisodeBeat> {
        let index = episode_number.checked_sub(1)? as usize;
        self.episode_beats.get(index)
    }

    /// Thread by id, compared case-insensitively
    pub fn thread(&self, id: &str) -> Option<&Thread> {
        let id = id.trim();
        self.threads.iter().find(|t| t.id.trim().eq_ignore_ascii_case(id))
    }
}

/// A main character, given either as a bare name or a small profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Character {
    Name(String),
    Profile {
        #[serde(default, deserialize_with = "lenient::string")]
        name: String,
        #[serde(default, deserialize_with = "lenient::string")]
        role: String,
    },
}

impl Character {
    pub fn name(&self) -> &str {
        match self {
            Character::Name(name) => name,
            Character::Profile { name, .. } => name,
        }
    }
}

/// The five season milestones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonArc {
    #[serde(default, deserialize_with = "lenient::string")]
    pub inciting_incident: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub first_turn: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub midpoint_reversal: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub all_is_lost: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub final_choice: String,
}

impl SeasonArc {
    /// Milestones in story order, paired with their field names
    pub fn milestones(&self) -> [(&'static str, &str); 5] {
        [
            ("inciting_incident", self.inciting_incident.as_str()),
            ("first_turn", self.first_turn.as_str()),
            ("midpoint_reversal", self.midpoint_reversal.as_str()),
            ("all_is_lost", self.all_is_lost.as_str()),
            ("final_choice", self.final_choice.as_str()),
        ]
    }
}

/// A narrative lane running across episodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Dramatic question the thread keeps open
    #[serde(default, alias = "dramatic_question", deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub engine: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub stake: String,
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub milestones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub leader: String,
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub members: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub objective: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub method: String,
    /// What the faction must never do on screen
    #[serde(default, deserialize_with = "lenient::string")]
    pub red_line: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRule {
    #[serde(default, deserialize_with = "lenient::string")]
    pub entity: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub rule: String,
}

/// Outline beat for a single episode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeBeat {
    #[serde(default, deserialize_with = "lenient::number")]
    pub episode: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub central_conflict: String,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub turning_points: Vec<TurningPointSource>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub setpiece: Option<SetpieceSource>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub cliffhanger: Option<CliffhangerSource>,
    #[serde(default, deserialize_with = "lenient::record")]
    pub thread_usage: ThreadUsage,
    #[serde(default, deserialize_with = "lenient::string")]
    pub crossover_event: String,
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub characters_present: Vec<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub moral_dilemma: Option<MoralDilemmaSource>,
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub stakes: Vec<String>,
}

/// Turning point as written in the outline.
///
/// Older outlines carry one delimiter-separated string per turning point;
/// it is resolved into a structured triple once, at contract extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurningPointSource {
    Structured(StructuredTurningPoint),
    Legacy(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredTurningPoint {
    #[serde(default, deserialize_with = "lenient::string")]
    pub agent: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub event: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub consequence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetpieceSource {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub participants: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub stakes: String,
}

/// Cliffhanger as written in the outline: free text or typed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CliffhangerSource {
    Text(String),
    Structured {
        #[serde(default, rename = "type", alias = "kind", deserialize_with = "lenient::string")]
        kind: String,
        #[serde(default, deserialize_with = "lenient::string")]
        description: String,
        #[serde(default, deserialize_with = "lenient::string")]
        open_question: String,
    },
}

impl CliffhangerSource {
    /// Descriptive text regardless of form
    pub fn text(&self) -> &str {
        match self {
            CliffhangerSource::Text(text) => text,
            CliffhangerSource::Structured { description, .. } => description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoralDilemmaSource {
    Text(String),
    Structured {
        #[serde(default, alias = "description", deserialize_with = "lenient::string")]
        question: String,
    },
}

impl MoralDilemmaSource {
    pub fn text(&self) -> &str {
        match self {
            MoralDilemmaSource::Text(text) => text,
            MoralDilemmaSource::Structured { question } => question,
        }
    }
}

/// Pointers from an episode to its A/B/C threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadUsage {
    #[serde(default, rename = "A", alias = "a", deserialize_with = "lenient::string")]
    pub a: String,
    #[serde(default, rename = "B", alias = "b", deserialize_with = "lenient::string")]
    pub b: String,
    #[serde(default, rename = "C", alias = "c", deserialize_with = "lenient::string")]
    pub c: String,
}

impl ThreadUsage {
    /// Non-blank pointers in A, B, C order
    pub fn pointers(&self) -> Vec<(&'static str, &str)> {
        [("A", self.a.as_str()), ("B", self.b.as_str()), ("C", self.c.as_str())]
            .into_iter()
            .map(|(slot, id)| (slot, id.trim()))
            .filter(|(_, id)| !id.is_empty())
            .collect()
    }
}

// ============================================================================
// Generator output
// ============================================================================

/// One generated scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default, deserialize_with = "lenient::number")]
    pub scene_number: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub slugline: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub action_summary: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub raw_content: String,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub dialogue: Vec<DialogueLine>,
    #[serde(default, alias = "characters_present", deserialize_with = "lenient::string_vec")]
    pub characters: Vec<String>,
    /// Set by the generator on the scene meant to close the episode
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_cliffhanger: bool,
}

impl Scene {
    /// All text of the scene joined with newlines
    pub fn combined_text(&self) -> String {
        let mut parts: Vec<&str> = vec![&self.slugline, &self.action_summary, &self.raw_content];
        for line in &self.dialogue {
            parts.push(&line.character);
            parts.push(&line.line);
        }
        parts.extend(self.characters.iter().map(String::as_str));
        parts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueLine {
    #[serde(default, alias = "speaker", deserialize_with = "lenient::string")]
    pub character: String,
    #[serde(default, alias = "text", deserialize_with = "lenient::string")]
    pub line: String,
}

/// Coverage the generator claims for one batch, plus its scenes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub threads_advanced: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub turning_points_executed: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub characters_appeared: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_vec")]
    pub factions_shown: Vec<String>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub scenes: Vec<Scene>,
}

impl BatchResult {
    pub fn from_json(json: &str) -> Result<Self, PlotguardError> {
        serde_json::from_str(json).map_err(|e| PlotguardError::Parse(e.to_string()))
    }
}

/// Whole episode script assembled from all batches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, deserialize_with = "lenient::string")]
    pub synopsis: String,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub scenes: Vec<Scene>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, PlotguardError> {
        serde_json::from_str(json).map_err(|e| PlotguardError::Parse(e.to_string()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PlotguardError> {
        serde_yaml::from_str(yaml).map_err(|e| PlotguardError::Parse(e.to_string()))
    }

    /// Read a script file, JSON or YAML by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlotguardError> {
        load_document(path.as_ref())
    }

    /// Flattened text corpus: synopsis and every scene's text
    pub fn corpus(&self) -> String {
        let mut parts = vec![self.synopsis.clone()];
        parts.extend(self.scenes.iter().map(Scene::combined_text));
        parts.retain(|p| !p.trim().is_empty());
        parts.join("\n")
    }
}
