//! Batch planning: split an episode's obligations across generation batches
//!
//! Threads rotate one per batch, turning points are chunked contiguously,
//! characters are sliced front-loaded and factions rotate. The last batch
//! owns the cliffhanger.

use plotguard_core::{BatchPlan, EpisodeContract, ThreadRequirement, TurningPoint};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Everything the planner needs for one episode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchPlanInput {
    pub episode_number: u32,
    pub threads: Vec<ThreadRequirement>,
    pub turning_points: Vec<TurningPoint>,
    pub characters: Vec<String>,
    pub factions: Vec<String>,
    pub batch_count: u32,
    pub scenes_per_batch: u32,
    pub cliffhanger: Option<String>,
}

impl BatchPlanInput {
    /// Build planner input from an extracted contract
    pub fn from_contract(contract: &EpisodeContract, batch_count: u32, scenes_per_batch: u32) -> Self {
        Self {
            episode_number: contract.episode_number,
            threads: contract.threads_required.clone(),
            turning_points: contract.turning_points.clone(),
            characters: contract.characters_required.clone(),
            factions: contract.factions_in_play.iter().map(|f| f.name.clone()).collect(),
            batch_count,
            scenes_per_batch,
            cliffhanger: contract
                .has_cliffhanger()
                .then(|| contract.cliffhanger.description.clone()),
        }
    }

    fn effective_batch_count(&self) -> usize {
        self.batch_count.max(1) as usize
    }

    fn cliffhanger_text(&self) -> Option<&str> {
        self.cliffhanger.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Synthetic id for the thread at `index`: thread_A .. thread_Z, then thread_27..
pub fn synthetic_thread_id(index: usize) -> String {
    if index < 26 {
        format!("thread_{}", (b'A' + index as u8) as char)
    } else {
        format!("thread_{}", index + 1)
    }
}

/// Thread ids with blanks replaced by synthetic ids
pub fn normalize_thread_ids(threads: &[ThreadRequirement]) -> Vec<String> {
    threads
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let id = t.id.trim();
            if id.is_empty() { synthetic_thread_id(i) } else { id.to_string() }
        })
        .collect()
}

/// Turning points with blank ids replaced by `tp_<n>`
pub fn normalize_turning_point_ids(turning_points: &[TurningPoint]) -> Vec<TurningPoint> {
    turning_points
        .iter()
        .enumerate()
        .map(|(i, tp)| {
            let mut tp = tp.clone();
            if tp.id.trim().is_empty() {
                tp.id = format!("tp_{}", i + 1);
            }
            if tp.ordinal == 0 {
                tp.ordinal = i as u32 + 1;
            }
            tp
        })
        .collect()
}

/// Partition an episode into ordered batch plans
pub fn build_batch_plan(input: &BatchPlanInput) -> Vec<BatchPlan> {
    let batch_count = input.effective_batch_count();
    let thread_ids = normalize_thread_ids(&input.threads);
    let turning_points = normalize_turning_point_ids(&input.turning_points);
    let cliffhanger = input.cliffhanger_text();

    let chunk = turning_points.len().div_ceil(batch_count);
    let character_count = input.characters.len();

    let plans: Vec<BatchPlan> = (0..batch_count)
        .map(|i| {
            let required_threads = if thread_ids.is_empty() {
                Vec::new()
            } else {
                vec![thread_ids[i % thread_ids.len()].clone()]
            };

            let tp_start = (i * chunk).min(turning_points.len());
            let tp_end = ((i + 1) * chunk).min(turning_points.len());
            let required_turning_points = turning_points[tp_start..tp_end].to_vec();

            // floor(i/n*len) .. ceil((i+1)/n*len), in integer arithmetic
            let char_start = i * character_count / batch_count;
            let char_end = ((i + 1) * character_count).div_ceil(batch_count).min(character_count);
            let required_characters = input.characters[char_start..char_end].to_vec();

            let required_factions = if input.factions.is_empty() {
                Vec::new()
            } else {
                vec![input.factions[i % input.factions.len()].clone()]
            };

            let is_last_batch = i + 1 == batch_count;
            let must_include_cliffhanger = is_last_batch && cliffhanger.is_some();

            let scene_focus = describe_focus(
                i,
                batch_count,
                &required_threads,
                &required_turning_points,
                must_include_cliffhanger,
            );

            BatchPlan {
                episode_number: input.episode_number,
                batch_index: i as u32,
                batch_count: batch_count as u32,
                required_threads,
                required_turning_points,
                required_characters,
                required_factions,
                scene_focus,
                scene_count: input.scenes_per_batch,
                is_last_batch,
                must_include_cliffhanger,
                cliffhanger: must_include_cliffhanger.then(|| cliffhanger.unwrap_or_default().to_string()),
            }
        })
        .collect();

    debug!(
        episode = input.episode_number,
        batches = plans.len(),
        threads = thread_ids.len(),
        turning_points = turning_points.len(),
        "batch plan built"
    );

    plans
}

fn describe_focus(
    index: usize,
    count: usize,
    threads: &[String],
    turning_points: &[TurningPoint],
    cliffhanger: bool,
) -> String {
    let mut parts = vec![format!("Batch {}/{}", index + 1, count)];
    if !threads.is_empty() {
        parts.push(format!("advance {}", threads.join(", ")));
    }
    if !turning_points.is_empty() {
        let events: Vec<String> = turning_points
            .iter()
            .map(|tp| format!("{} ({})", tp.id, tp.agent))
            .collect();
        parts.push(format!("dramatize {}", events.join(", ")));
    }
    if cliffhanger {
        parts.push("end on the cliffhanger".to_string());
    }
    parts.join("; ")
}

/// Self-check of planner output.
///
/// Returns warnings only: the plan is usable even when a check fails, but
/// some obligation will have no owning batch.
pub fn validate_batch_plan(plans: &[BatchPlan], input: &BatchPlanInput) -> Vec<String> {
    let mut warnings = Vec::new();

    if plans.is_empty() {
        warnings.push("PLAN:empty".to_string());
        return warnings;
    }

    let assigned_threads: HashSet<&str> = plans
        .iter()
        .flat_map(|p| p.required_threads.iter().map(String::as_str))
        .collect();
    let uncovered_threads: Vec<String> = normalize_thread_ids(&input.threads)
        .into_iter()
        .filter(|id| !assigned_threads.contains(id.as_str()))
        .collect();
    if !uncovered_threads.is_empty() {
        warnings.push(format!("PLAN:threads_uncovered({})", uncovered_threads.join(",")));
    }

    let assigned_tps: HashSet<&str> = plans
        .iter()
        .flat_map(|p| p.required_turning_points.iter().map(|tp| tp.id.as_str()))
        .collect();
    let uncovered_tps: Vec<String> = normalize_turning_point_ids(&input.turning_points)
        .into_iter()
        .map(|tp| tp.id)
        .filter(|id| !assigned_tps.contains(id.as_str()))
        .collect();
    if !uncovered_tps.is_empty() {
        warnings.push(format!("PLAN:turning_points_uncovered({})", uncovered_tps.join(",")));
    }

    if input.cliffhanger_text().is_some() {
        let last_ok = plans
            .last()
            .map(|p| p.is_last_batch && p.must_include_cliffhanger)
            .unwrap_or(false);
        if !last_ok {
            warnings.push("PLAN:last_batch_missing_cliffhanger".to_string());
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(id: &str) -> ThreadRequirement {
        ThreadRequirement { id: id.to_string(), ..Default::default() }
    }

    fn tp(n: u32) -> TurningPoint {
        TurningPoint {
            id: format!("tp_{}", n),
            ordinal: n,
            agent: format!("Agent{}", n),
            event: format!("event {}", n),
            consequence: String::new(),
        }
    }

    fn input(threads: usize, tps: u32, batches: u32) -> BatchPlanInput {
        BatchPlanInput {
            episode_number: 1,
            threads: (0..threads).map(|i| thread(&format!("T{}", i))).collect(),
            turning_points: (1..=tps).map(tp).collect(),
            characters: vec!["Ana".into(), "Bruno".into(), "Clara".into(), "Dario".into(), "Eva".into()],
            factions: vec!["Cartel".into(), "Police".into()],
            batch_count: batches,
            scenes_per_batch: 3,
            cliffhanger: Some("The door opens".into()),
        }
    }

    #[test]
    fn test_threads_round_robin() {
        let plans = build_batch_plan(&input(3, 4, 4));
        let threads: Vec<&str> = plans.iter().map(|p| p.required_threads[0].as_str()).collect();
        assert_eq!(threads, vec!["T0", "T1", "T2", "T0"]);
    }

    #[test]
    fn test_thread_coverage_iff_enough_batches() {
        for threads in 1..6 {
            for batches in 1..6u32 {
                let input = input(threads, 4, batches);
                let plans = build_batch_plan(&input);
                let covered: HashSet<String> =
                    plans.iter().flat_map(|p| p.required_threads.clone()).collect();
                let complete = covered.len() == threads;
                assert_eq!(complete, batches as usize >= threads, "T={} B={}", threads, batches);
                let warned = validate_batch_plan(&plans, &input)
                    .iter()
                    .any(|w| w.starts_with("PLAN:threads_uncovered"));
                assert_eq!(warned, !complete);
            }
        }
    }

    #[test]
    fn test_turning_points_partition() {
        for tps in 0..9 {
            for batches in 1..6 {
                let input = input(2, tps, batches);
                let plans = build_batch_plan(&input);
                let concatenated: Vec<TurningPoint> = plans
                    .iter()
                    .flat_map(|p| p.required_turning_points.clone())
                    .collect();
                assert_eq!(concatenated, input.turning_points, "tps={} B={}", tps, batches);
            }
        }
    }

    #[test]
    fn test_turning_point_chunks_use_ceil_division() {
        let plans = build_batch_plan(&input(1, 5, 3));
        let sizes: Vec<usize> = plans.iter().map(|p| p.required_turning_points.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        // last chunks may be empty
        let plans = build_batch_plan(&input(1, 4, 3));
        let sizes: Vec<usize> = plans.iter().map(|p| p.required_turning_points.len()).collect();
        assert_eq!(sizes, vec![2, 2, 0]);
    }

    #[test]
    fn test_characters_front_loaded() {
        let plans = build_batch_plan(&input(1, 0, 2));
        assert_eq!(plans[0].required_characters, vec!["Ana", "Bruno", "Clara"]);
        assert_eq!(plans[1].required_characters, vec!["Clara", "Dario", "Eva"]);
    }

    #[test]
    fn test_factions_rotate() {
        let plans = build_batch_plan(&input(1, 0, 3));
        let factions: Vec<&str> = plans.iter().map(|p| p.required_factions[0].as_str()).collect();
        assert_eq!(factions, vec!["Cartel", "Police", "Cartel"]);
    }

    #[test]
    fn test_only_last_batch_owns_cliffhanger() {
        let plans = build_batch_plan(&input(2, 4, 3));
        let flags: Vec<bool> = plans.iter().map(|p| p.must_include_cliffhanger).collect();
        assert_eq!(flags, vec![false, false, true]);
        assert!(plans[2].is_last_batch);
        assert_eq!(plans[2].cliffhanger.as_deref(), Some("The door opens"));
        assert!(plans[0].cliffhanger.is_none());
    }

    #[test]
    fn test_no_cliffhanger_no_flag() {
        let mut input = input(1, 2, 2);
        input.cliffhanger = Some("   ".into());
        let plans = build_batch_plan(&input);
        assert!(plans.iter().all(|p| !p.must_include_cliffhanger));
        assert!(validate_batch_plan(&plans, &input).is_empty());
    }

    #[test]
    fn test_zero_batches_clamped_to_one() {
        let plans = build_batch_plan(&input(2, 3, 0));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].required_turning_points.len(), 3);
    }

    #[test]
    fn test_synthetic_ids() {
        let mut input = input(0, 0, 2);
        input.threads = vec![thread(""), thread("  "), thread("T_X")];
        input.turning_points = vec![TurningPoint::default(), TurningPoint::default()];
        input.batch_count = 3;
        let plans = build_batch_plan(&input);
        assert_eq!(plans[0].required_threads, vec!["thread_A"]);
        assert_eq!(plans[1].required_threads, vec!["thread_B"]);
        assert_eq!(plans[2].required_threads, vec!["T_X"]);
        assert_eq!(plans[0].turning_point_ids(), vec!["tp_1"]);
        assert_eq!(synthetic_thread_id(26), "thread_27");
    }

    #[test]
    fn test_missing_cliffhanger_flag_warns() {
        let input = input(1, 1, 2);
        let mut plans = build_batch_plan(&input);
        plans[1].must_include_cliffhanger = false;
        let warnings = validate_batch_plan(&plans, &input);
        assert!(warnings.contains(&"PLAN:last_batch_missing_cliffhanger".to_string()));
    }

    #[test]
    fn test_scene_focus_is_readable() {
        let plans = build_batch_plan(&input(2, 2, 2));
        assert_eq!(plans[0].scene_focus, "Batch 1/2; advance T0; dramatize tp_1 (Agent1)");
        assert!(plans[1].scene_focus.ends_with("end on the cliffhanger"));
    }
}
