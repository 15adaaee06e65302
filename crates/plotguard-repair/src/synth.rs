//! Repair synthesis: turn a failed validation into targeted scene edits
//!
//! A repair never restructures the episode. It names the scenes to touch,
//! what each must gain, and how the repaired output will be judged.

use plotguard_contract::{MatchCorpus, DEFAULT_THRESHOLD};
use plotguard_core::{BatchPlan, BatchResult, EpisodeContract, Scene, Script, TurningPoint};
use plotguard_quality::{character_appeared, BatchValidationResult, ScriptQcResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Constraints carried by every repair
pub const BASE_CONSTRAINTS: [&str; 3] = [
    "Do not add new scenes.",
    "Do not delete scenes.",
    "Do not rewrite scenes that already pass; change only the scenes listed in the edits.",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEdit {
    /// 0-based position of the scene in the batch or script
    pub scene_index: usize,
    pub scene_number: u32,
    pub directives: Vec<String>,
}

/// Targeted repair request for one batch or one whole script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairSpec {
    pub episode_number: u32,
    /// Batch being repaired; `None` for a whole-script repair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_index: Option<u32>,
    pub scene_edits: Vec<SceneEdit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_to_advance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turning_point_to_dramatize: Option<TurningPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliffhanger: Option<String>,
    pub characters_to_insert: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub constraints: Vec<String>,
    /// Blockers the repair must clear
    pub blockers: Vec<String>,
}

impl RepairSpec {
    /// Whether the repair asks for anything at all
    pub fn is_empty(&self) -> bool {
        self.scene_edits.is_empty()
            && self.thread_to_advance.is_none()
            && self.turning_point_to_dramatize.is_none()
            && self.cliffhanger.is_none()
            && self.characters_to_insert.is_empty()
    }

    /// Directives for the scene at `index`, if it is edited
    pub fn edit_for(&self, index: usize) -> Option<&SceneEdit> {
        self.scene_edits.iter().find(|e| e.scene_index == index)
    }
}

/// Directives grouped per scene, in scene order
#[derive(Default)]
struct EditList {
    edits: BTreeMap<usize, SceneEdit>,
}

impl EditList {
    fn push(&mut self, scenes: &[Scene], index: usize, directive: String) {
        let Some(scene) = scenes.get(index) else {
            return;
        };
        self.edits
            .entry(index)
            .or_insert_with(|| SceneEdit {
                scene_index: index,
                scene_number: if scene.scene_number > 0 { scene.scene_number } else { index as u32 + 1 },
                directives: Vec::new(),
            })
            .directives
            .push(directive);
    }

    fn into_vec(self) -> Vec<SceneEdit> {
        self.edits.into_values().collect()
    }
}

/// First scene mentioning the agent, else the middle scene
fn scene_for_agent(scenes: &[Scene], agent: &str) -> usize {
    scenes
        .iter()
        .position(|s| MatchCorpus::new(&s.combined_text()).contains(agent, DEFAULT_THRESHOLD))
        .unwrap_or(scenes.len() / 2)
}

fn turning_point_directive(tp: &TurningPoint) -> String {
    let mut directive = format!("Dramatize on screen: {} {}.", tp.agent, tp.event);
    if !tp.consequence.trim().is_empty() {
        directive.push_str(&format!(" Show the consequence: {}.", tp.consequence));
    }
    directive
}

fn base_constraints() -> Vec<String> {
    BASE_CONSTRAINTS.iter().map(|c| c.to_string()).collect()
}

// ============================================================================
// Batch repair
// ============================================================================

pub fn synthesize_batch_repair(
    result: &BatchResult,
    plan: &BatchPlan,
    validation: &BatchValidationResult,
) -> RepairSpec {
    let scenes = &result.scenes;
    let mut edits = EditList::default();
    let mut spec = RepairSpec {
        episode_number: plan.episode_number,
        batch_index: Some(plan.batch_index),
        blockers: validation.blockers.clone(),
        constraints: base_constraints(),
        ..Default::default()
    };

    for item in &validation.repair_priority {
        if let Some(id) = item.strip_prefix("thread:") {
            if spec.thread_to_advance.is_some() {
                continue;
            }
            edits.push(
                scenes,
                0,
                format!("Make thread {} advance explicitly: its question must move forward on screen.", id),
            );
            spec.acceptance_criteria.push(format!("threads_advanced includes {}", id));
            spec.thread_to_advance = Some(id.to_string());
        } else if let Some(id) = item.strip_prefix("turning_point:") {
            if spec.turning_point_to_dramatize.is_some() {
                continue;
            }
            let Some(tp) = plan.required_turning_points.iter().find(|tp| tp.id == id) else {
                continue;
            };
            edits.push(scenes, scene_for_agent(scenes, &tp.agent), turning_point_directive(tp));
            spec.acceptance_criteria.push(format!("turning_points_executed includes {}", tp.id));
            spec.turning_point_to_dramatize = Some(tp.clone());
        }
    }

    let cliffhanger_missed = validation.warnings.iter().any(|w| w.starts_with("CLIFFHANGER:"));
    if plan.must_include_cliffhanger && cliffhanger_missed {
        if let Some(text) = &plan.cliffhanger {
            edits.push(
                scenes,
                scenes.len().saturating_sub(1),
                format!("End the scene on the cliffhanger: {}", text),
            );
            spec.acceptance_criteria.push("final scene has is_cliffhanger = true".to_string());
            spec.cliffhanger = Some(text.clone());
        }
    }

    spec.characters_to_insert = plan
        .required_characters
        .iter()
        .filter(|name| !character_appeared(name, result))
        .cloned()
        .collect();
    for name in &spec.characters_to_insert {
        spec.acceptance_criteria.push(format!("characters_appeared includes {}", name));
    }

    spec.constraints.push(format!("Keep exactly {} scenes.", scenes.len().max(plan.scene_count as usize)));
    spec.scene_edits = edits.into_vec();

    debug!(
        episode = spec.episode_number,
        batch = plan.batch_index,
        edits = spec.scene_edits.len(),
        "batch repair synthesized"
    );
    spec
}

// ============================================================================
// Script repair
// ============================================================================

pub fn synthesize_script_repair(
    script: &Script,
    contract: &EpisodeContract,
    qc: &ScriptQcResult,
) -> RepairSpec {
    let scenes = &script.scenes;
    let mut edits = EditList::default();
    let mut spec = RepairSpec {
        episode_number: contract.episode_number,
        blockers: qc.blockers.clone(),
        constraints: base_constraints(),
        ..Default::default()
    };

    // === Threads ===
    for id in &qc.thread_coverage.missing {
        let question = contract.thread(id).map(|t| t.question.as_str()).unwrap_or("");
        let directive = if question.trim().is_empty() {
            format!("Weave in thread {}.", id)
        } else {
            format!("Weave in thread {}: raise the question \"{}\".", id, question)
        };
        edits.push(scenes, 0, directive);
        spec.acceptance_criteria.push(format!("thread {} is present", id));
    }
    spec.thread_to_advance = qc.thread_coverage.missing.first().cloned();

    // === Turning points ===
    for id in &qc.turning_point_coverage.missing {
        let Some(tp) = contract.turning_points.iter().find(|tp| &tp.id == id) else {
            continue;
        };
        edits.push(scenes, scene_for_agent(scenes, &tp.agent), turning_point_directive(tp));
        spec.acceptance_criteria.push(format!("{} is executed: {} {}", tp.id, tp.agent, tp.event));
        if spec.turning_point_to_dramatize.is_none() {
            spec.turning_point_to_dramatize = Some(tp.clone());
        }
    }
    for id in &qc.turning_point_coverage.consequences_missing {
        if let Some(tp) = contract.turning_points.iter().find(|tp| &tp.id == id) {
            edits.push(
                scenes,
                scene_for_agent(scenes, &tp.agent),
                format!("Show the consequence of {}: {}.", tp.id, tp.consequence),
            );
        }
    }

    // === Cliffhanger ===
    if contract.has_cliffhanger() && !qc.cliffhanger_match.present {
        edits.push(
            scenes,
            scenes.len().saturating_sub(1),
            format!(
                "End the episode on the {} cliffhanger: {}",
                contract.cliffhanger.kind, contract.cliffhanger.description
            ),
        );
        spec.acceptance_criteria.push("the final scene lands the cliffhanger".to_string());
        spec.cliffhanger = Some(contract.cliffhanger.description.clone());
    }

    // === Characters and setpiece ===
    spec.characters_to_insert = qc.character_coverage.missing.clone();
    for name in &spec.characters_to_insert {
        spec.acceptance_criteria.push(format!("{} appears on screen", name));
    }
    if !contract.setpiece.name.trim().is_empty() && !qc.setpiece_execution.name_found {
        edits.push(
            scenes,
            scenes.len() / 2,
            format!(
                "Stage the setpiece \"{}\" with {}.",
                contract.setpiece.name,
                contract.setpiece.participants.join(", ")
            ),
        );
        spec.acceptance_criteria.push(format!("setpiece \"{}\" is staged", contract.setpiece.name));
    }

    // === Red lines ===
    for name in &qc.red_line_violations {
        if let Some(faction) = contract.factions_in_play.iter().find(|f| &f.name == name) {
            spec.constraints.push(format!("{} never crosses its red line: {}.", faction.name, faction.red_line));
        }
    }

    // === Scene depth ===
    for issue in &qc.scene_depth_issues {
        edits.push(
            scenes,
            issue.scene_index,
            format!("Expand this scene with concrete action and dialogue ({}).", issue.reasons.join(", ")),
        );
    }
    if !qc.scene_depth_issues.is_empty() {
        spec.acceptance_criteria.push("no scene is flagged as shallow".to_string());
    }

    spec.scene_edits = edits.into_vec();

    debug!(
        episode = spec.episode_number,
        edits = spec.scene_edits.len(),
        blockers = spec.blockers.len(),
        "script repair synthesized"
    );
    spec
}
