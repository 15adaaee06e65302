//! Planner tests against the fixture outline.

use plotguard_contract::extract_contract;
use plotguard_core::{BatchResult, Outline};
use plotguard_planner::{
    build_batch_plan, create_initial_state, update_generation_state, validate_batch_plan,
    BatchPlanInput,
};
use std::collections::HashSet;

const OUTLINE_PATH: &str = "testing/fixtures/outlines/valid.json";

fn load_outline() -> Outline {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let json = std::fs::read_to_string(workspace_root.join(OUTLINE_PATH)).unwrap();
    Outline::from_json(&json).unwrap()
}

#[test]
fn test_plan_from_contract_covers_everything() {
    let outline = load_outline();
    let contract = extract_contract(&outline, 1);
    let input = BatchPlanInput::from_contract(&contract, 4, 3);
    let plans = build_batch_plan(&input);

    assert_eq!(plans.len(), 4);
    assert!(validate_batch_plan(&plans, &input).is_empty());

    let threads: HashSet<&str> = plans
        .iter()
        .flat_map(|p| p.required_threads.iter().map(String::as_str))
        .collect();
    assert_eq!(threads, HashSet::from(["T_MAIN", "T_LOVE", "T_CARTEL"]));

    let tp_ids: Vec<&str> = plans.iter().flat_map(|p| p.turning_point_ids()).collect();
    assert_eq!(tp_ids, vec!["tp_1", "tp_2", "tp_3", "tp_4"]);

    let last = plans.last().unwrap();
    assert!(last.must_include_cliffhanger);
    assert!(last.cliffhanger.as_deref().unwrap().contains("Who forged the will?"));
    assert!(plans.iter().all(|p| p.scene_count == 3));
}

#[test]
fn test_two_batches_leave_a_thread_uncovered() {
    let outline = load_outline();
    let contract = extract_contract(&outline, 1);
    let input = BatchPlanInput::from_contract(&contract, 2, 3);
    let plans = build_batch_plan(&input);

    let warnings = validate_batch_plan(&plans, &input);
    assert_eq!(warnings, vec!["PLAN:threads_uncovered(T_CARTEL)".to_string()]);
}

#[test]
fn test_state_accumulates_over_plan() {
    let outline = load_outline();
    let contract = extract_contract(&outline, 1);
    let plans = build_batch_plan(&BatchPlanInput::from_contract(&contract, 4, 3));

    let mut state = create_initial_state();
    for plan in &plans {
        let result = BatchResult {
            threads_advanced: plan.required_threads.clone(),
            turning_points_executed: plan.turning_point_ids().iter().map(|s| s.to_string()).collect(),
            characters_appeared: plan.required_characters.clone(),
            ..Default::default()
        };
        state = update_generation_state(&state, &result, plan);
    }

    assert_eq!(state.batches_completed, 4);
    assert_eq!(state.threads_advanced.len(), 3);
    assert!(state.pending_turning_points(&plans).is_empty());
    assert!(state.has_character("don ramiro"));
}
