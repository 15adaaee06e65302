//! Generation state: what has been covered so far in an episode
//!
//! The state is threaded by value. Each update returns a new state; sets
//! only grow and counters only increase.

use plotguard_core::{BatchPlan, BatchResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationState {
    pub threads_advanced: BTreeSet<String>,
    pub turning_points_done: BTreeSet<String>,
    /// Lower-cased character names
    pub characters_used: BTreeSet<String>,
    pub factions_shown: BTreeSet<String>,
    pub scenes_generated: u32,
    pub batches_completed: u32,
    pub repair_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_repair_reason: Option<String>,
}

impl GenerationState {
    pub fn has_thread(&self, id: &str) -> bool {
        self.threads_advanced.iter().any(|t| t.eq_ignore_ascii_case(id))
    }

    pub fn has_turning_point(&self, id: &str) -> bool {
        self.turning_points_done.contains(id)
    }

    pub fn has_character(&self, name: &str) -> bool {
        self.characters_used.contains(&name.trim().to_lowercase())
    }

    /// Ids of plan turning points not yet absorbed
    pub fn pending_turning_points<'a>(&self, plans: &'a [BatchPlan]) -> Vec<&'a str> {
        plans
            .iter()
            .flat_map(|p| p.required_turning_points.iter())
            .map(|tp| tp.id.as_str())
            .filter(|id| !self.has_turning_point(id))
            .collect()
    }
}

pub fn create_initial_state() -> GenerationState {
    GenerationState::default()
}

fn absorb(target: &mut BTreeSet<String>, values: &[String]) {
    target.extend(
        values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string),
    );
}

/// Fold a batch result into the state.
///
/// Only what the batch result declares is absorbed; the plan is used for
/// logging. Callers validate the batch before updating.
pub fn update_generation_state(
    state: &GenerationState,
    result: &BatchResult,
    plan: &BatchPlan,
) -> GenerationState {
    let mut next = state.clone();

    absorb(&mut next.threads_advanced, &result.threads_advanced);
    absorb(&mut next.turning_points_done, &result.turning_points_executed);
    absorb(&mut next.factions_shown, &result.factions_shown);
    next.characters_used.extend(
        result
            .characters_appeared
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty()),
    );

    next.scenes_generated += result.scenes.len() as u32;
    next.batches_completed += 1;

    let unmet_threads: Vec<&str> = plan
        .required_threads
        .iter()
        .map(String::as_str)
        .filter(|id| !next.has_thread(id))
        .collect();

    debug!(
        episode = plan.episode_number,
        batch = plan.batch_index,
        scenes = next.scenes_generated,
        threads = next.threads_advanced.len(),
        turning_points = next.turning_points_done.len(),
        unmet_threads = ?unmet_threads,
        "generation state updated"
    );

    next
}

pub fn record_repair_attempt(state: &GenerationState, reason: &str) -> GenerationState {
    let mut next = state.clone();
    next.repair_attempts += 1;
    next.last_repair_reason = Some(reason.to_string());
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotguard_core::Scene;

    fn result(threads: &[&str], tps: &[&str], chars: &[&str], scenes: usize) -> BatchResult {
        BatchResult {
            threads_advanced: threads.iter().map(|s| s.to_string()).collect(),
            turning_points_executed: tps.iter().map(|s| s.to_string()).collect(),
            characters_appeared: chars.iter().map(|s| s.to_string()).collect(),
            factions_shown: vec![],
            scenes: (0..scenes).map(|_| Scene::default()).collect(),
        }
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = create_initial_state();
        assert!(state.threads_advanced.is_empty());
        assert_eq!(state.scenes_generated, 0);
        assert_eq!(state.batches_completed, 0);
    }

    #[test]
    fn test_update_unions_and_counts() {
        let plan = BatchPlan::default();
        let s0 = create_initial_state();
        let s1 = update_generation_state(&s0, &result(&["T_A"], &["tp_1"], &["Marta", " "], 3), &plan);
        let s2 = update_generation_state(&s1, &result(&["T_A", "T_B"], &["tp_2"], &["MARTA", "Leo"], 2), &plan);

        assert_eq!(s2.threads_advanced.len(), 2);
        assert_eq!(s2.turning_points_done.len(), 2);
        assert_eq!(s2.characters_used.len(), 2);
        assert!(s2.has_character("marta"));
        assert!(s2.has_thread("t_b"));
        assert!(!s2.has_thread("T_C"));
        assert_eq!(s2.scenes_generated, 5);
        assert_eq!(s2.batches_completed, 2);
        // input untouched
        assert_eq!(s0, create_initial_state());
    }

    #[test]
    fn test_state_is_monotonic() {
        let plan = BatchPlan::default();
        let batches = [
            result(&["T_A"], &["tp_1", "tp_2"], &["Ana"], 2),
            result(&[], &[], &[], 0),
            result(&["T_B"], &["tp_1"], &["Bruno", "ana"], 4),
        ];
        let mut state = create_initial_state();
        for batch in &batches {
            let next = update_generation_state(&state, batch, &plan);
            assert!(next.threads_advanced.is_superset(&state.threads_advanced));
            assert!(next.turning_points_done.is_superset(&state.turning_points_done));
            assert!(next.characters_used.is_superset(&state.characters_used));
            assert!(next.scenes_generated >= state.scenes_generated);
            assert_eq!(next.batches_completed, state.batches_completed + 1);
            state = next;
        }
    }

    #[test]
    fn test_record_repair_attempt() {
        let state = record_repair_attempt(&create_initial_state(), "THREADS:none_advanced(T_A)");
        let state = record_repair_attempt(&state, "TURNING_POINTS:none_executed(tp_1)");
        assert_eq!(state.repair_attempts, 2);
        assert_eq!(state.last_repair_reason.as_deref(), Some("TURNING_POINTS:none_executed(tp_1)"));
    }

    #[test]
    fn test_pending_turning_points() {
        let plan = BatchPlan {
            required_turning_points: vec![
                plotguard_core::TurningPoint { id: "tp_1".into(), ..Default::default() },
                plotguard_core::TurningPoint { id: "tp_2".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        let state = update_generation_state(&create_initial_state(), &result(&[], &["tp_1"], &[], 1), &plan);
        assert_eq!(state.pending_turning_points(&[plan]), vec!["tp_2"]);
    }
}
