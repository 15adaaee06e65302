//! QC tests against the fixture outlines and script.

use plotguard_contract::extract_contract;
use plotguard_core::{BatchPlan, BatchResult, Outline, Scene, Script};
use plotguard_quality::{
    validate_batch_against_plan, validate_outline, validate_script, validate_script_with_profile,
    OutlineQuality, QcProfile, ScriptQuality,
};

fn fixture(relative: &str) -> String {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    std::fs::read_to_string(workspace_root.join("testing/fixtures").join(relative)).unwrap()
}

fn valid_outline() -> Outline {
    Outline::from_json(&fixture("outlines/valid.json")).unwrap()
}

fn broken_outline() -> Outline {
    Outline::from_yaml(&fixture("outlines/broken.yaml")).unwrap()
}

fn episode_one_script() -> Script {
    Script::from_json(&fixture("scripts/episode1.json")).unwrap()
}

// =============================================================================
// Outline gate
// =============================================================================

#[test]
fn test_valid_outline_passes_gate() {
    let result = validate_outline(&valid_outline(), 3);
    assert!(result.passed, "{:?}", result.blockers);
    assert_eq!(result.quality, OutlineQuality::Ok);
    assert_eq!(result.score, 100);
}

#[test]
fn test_missing_midpoint_rejects_outline() {
    let result = validate_outline(&broken_outline(), 2);
    assert!(!result.passed);
    assert!(result.blockers.contains(&"SEASON_ARC:midpoint_reversal_missing".to_string()));
    assert!(result.score < 60);
    assert_eq!(result.quality, OutlineQuality::Rejected);
}

#[test]
fn test_broken_outline_findings() {
    let result = validate_outline(&broken_outline(), 2);
    let expected_blockers = [
        "OUTLINE:main_characters_insufficient(2/3)",
        "EP1:central_conflict_missing",
        "EP1:turning_points_insufficient(3/4)",
        "EP1:TP1:not_structured",
        "EP1:TP3:agent_missing",
        "EP1:setpiece_stakes_missing",
        "EP1:cliffhanger_missing",
        "EP1:crossover_event_missing",
        "EP2:turning_points_insufficient(0/4)",
        "EP2:setpiece_missing",
        "EP2:thread_usage_A_missing",
    ];
    for code in expected_blockers {
        assert!(result.blockers.contains(&code.to_string()), "missing {}", code);
    }
    assert_eq!(
        result.warnings,
        vec!["EP1:TP2:event_generic", "EP1:TP2:consequence_generic"]
    );
}

// =============================================================================
// Batch validation
// =============================================================================

#[test]
fn test_thread_id_variant_is_covered() {
    let plan = BatchPlan {
        required_threads: vec!["T_MAIN".into()],
        ..Default::default()
    };
    let result = BatchResult {
        threads_advanced: vec!["t_main_arc".into()],
        ..Default::default()
    };
    let validation = validate_batch_against_plan(&result, &plan);
    assert!(validation.passed);
    assert!(validation.blockers.is_empty());
}

// =============================================================================
// Script QC
// =============================================================================

#[test]
fn test_episode_one_script_passes() {
    let contract = extract_contract(&valid_outline(), 1);
    let result = validate_script(&episode_one_script(), &contract);
    assert!(result.passed, "{:?}", result.blockers);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.quality, ScriptQuality::Excellent);
    assert_eq!(result.turning_point_coverage.executed, 4);
    assert_eq!(result.thread_coverage.found, 3);
    assert!(result.cliffhanger_match.present);
    assert!(result.red_line_violations.is_empty());
}

#[test]
fn test_empty_final_scene_misses_cliffhanger() {
    let contract = extract_contract(&valid_outline(), 1);
    let mut script = episode_one_script();
    if let Some(last) = script.scenes.last_mut() {
        *last = Scene { scene_number: last.scene_number, ..Default::default() };
    }
    let result = validate_script(&script, &contract);
    assert!(!result.cliffhanger_match.present);
    assert!(result.blockers.contains(&"CLIFFHANGER: no detectado".to_string()));
    assert!(!result.passed);
}

#[test]
fn test_six_of_ten_shallow_scenes_block() {
    let contract = extract_contract(&valid_outline(), 1);
    let mut script = episode_one_script();
    let template = script.scenes[0].clone();
    while script.scenes.len() < 10 {
        script.scenes.insert(0, template.clone());
    }
    for scene in script.scenes.iter_mut().take(6) {
        scene.raw_content.truncate(200);
    }

    let result = validate_script(&script, &contract);
    assert_eq!(result.scene_depth_issues.len(), 6);
    assert!(result.blockers.contains(&"SCENE_DEPTH:6/10".to_string()));
    assert!(!result.passed);
}

#[test]
fn test_strict_profile_flags_short_scenes() {
    let contract = extract_contract(&valid_outline(), 1);
    let result = validate_script_with_profile(&episode_one_script(), &contract, &QcProfile::strict());
    // every fixture scene is under 500 chars
    assert_eq!(result.scene_depth_issues.len(), 5);
    assert!(!result.passed);
}

#[test]
fn test_blockers_imply_failure_everywhere() {
    let contract = extract_contract(&valid_outline(), 2);
    let result = validate_script(&episode_one_script(), &contract);
    assert!(!result.blockers.is_empty());
    assert!(!result.passed);
    assert!(matches!(result.quality, ScriptQuality::Poor | ScriptQuality::Failed));
}
