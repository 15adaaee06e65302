//! Per-batch validation against the batch plan
//!
//! Compares what the generator declares it covered with what the plan
//! required. Only zero coverage of threads or turning points blocks; the
//! rest is reported as warnings.

use crate::findings::Findings;
use crate::profile::QcProfile;
use plotguard_contract::{fuzzy_contains, loose_match};
use plotguard_core::{BatchPlan, BatchResult, TurningPoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchValidationResult {
    pub passed: bool,
    pub blockers: Vec<String>,
    pub warnings: Vec<String>,
    /// Whether a targeted repair is worth attempting
    pub can_repair: bool,
    /// `thread:<id>` / `turning_point:<id>` items, most urgent first
    pub repair_priority: Vec<String>,
}

pub fn validate_batch_against_plan(result: &BatchResult, plan: &BatchPlan) -> BatchValidationResult {
    validate_batch_with_profile(result, plan, &QcProfile::standard())
}

pub fn validate_batch_with_profile(
    result: &BatchResult,
    plan: &BatchPlan,
    profile: &QcProfile,
) -> BatchValidationResult {
    let rules = &profile.batch;
    let mut findings = Findings::new();
    let mut repair_priority = Vec::new();

    // === Threads ===
    let missing_threads: Vec<&String> = plan
        .required_threads
        .iter()
        .filter(|id| !result.threads_advanced.iter().any(|d| loose_match(d, id)))
        .collect();
    if !plan.required_threads.is_empty() {
        if missing_threads.len() == plan.required_threads.len() {
            findings.blocker(format!("THREADS:none_advanced({})", join(&missing_threads)), 0);
            repair_priority.push(format!("thread:{}", missing_threads[0]));
        } else if !missing_threads.is_empty() {
            findings.warning(format!("THREADS:partial({})", join(&missing_threads)), 0);
        }
    }

    // === Turning points ===
    let missing_tps: Vec<&TurningPoint> = plan
        .required_turning_points
        .iter()
        .filter(|tp| !turning_point_executed(tp, &result.turning_points_executed, rules.event_threshold))
        .collect();
    if !plan.required_turning_points.is_empty() {
        let ids: Vec<&String> = missing_tps.iter().map(|tp| &tp.id).collect();
        if missing_tps.len() == plan.required_turning_points.len() {
            findings.blocker(format!("TURNING_POINTS:none_executed({})", join(&ids)), 0);
            repair_priority.push(format!("turning_point:{}", ids[0]));
        } else if !missing_tps.is_empty() {
            findings.warning(format!("TURNING_POINTS:partial({})", join(&ids)), 0);
        }
    }

    // === Characters ===
    let missing_characters: Vec<&String> = plan
        .required_characters
        .iter()
        .filter(|name| !character_appeared(name, result))
        .collect();
    if !missing_characters.is_empty() {
        findings.warning(format!("CHARACTERS:missing({})", join(&missing_characters)), 0);
    }

    // === Cliffhanger ===
    if plan.must_include_cliffhanger {
        let landed = result.scenes.last().is_some_and(|scene| {
            scene.is_cliffhanger
                || plan
                    .cliffhanger
                    .as_deref()
                    .is_some_and(|c| fuzzy_contains(&scene.combined_text(), c, rules.cliffhanger_threshold))
        });
        if !landed {
            findings.warning("CLIFFHANGER:not_in_final_scene", 0);
        }
    }

    // === Scene count ===
    if result.scenes.len() < plan.scene_count as usize {
        findings.warning(
            format!("SCENES:expected_{}_got_{}", plan.scene_count, result.scenes.len()),
            0,
        );
    }

    let blockers = findings.blockers();
    let can_repair = !blockers.is_empty() && blockers.len() <= rules.max_repairable_blockers;
    let validation = BatchValidationResult {
        passed: blockers.is_empty(),
        blockers,
        warnings: findings.warnings(),
        can_repair,
        repair_priority,
    };

    if validation.passed {
        debug!(
            episode = plan.episode_number,
            batch = plan.batch_index,
            warnings = validation.warnings.len(),
            "batch validated"
        );
    } else {
        warn!(
            episode = plan.episode_number,
            batch = plan.batch_index,
            blockers = ?validation.blockers,
            can_repair = validation.can_repair,
            "batch failed validation"
        );
    }
    validation
}

/// A declared entry executes a turning point when it names its id or
/// paraphrases its event.
fn turning_point_executed(tp: &TurningPoint, declared: &[String], threshold: f64) -> bool {
    declared
        .iter()
        .any(|d| loose_match(d, &tp.id) || fuzzy_contains(d, &tp.event, threshold))
}

/// A character appeared when the batch declares it or any scene lists it
/// in its cast.
pub fn character_appeared(name: &str, result: &BatchResult) -> bool {
    let name = name.trim();
    result.characters_appeared.iter().any(|c| c.trim().eq_ignore_ascii_case(name))
        || result
            .scenes
            .iter()
            .flat_map(|s| s.characters.iter())
            .any(|c| c.trim().eq_ignore_ascii_case(name))
}

fn join(items: &[&String]) -> String {
    items.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",")
}
