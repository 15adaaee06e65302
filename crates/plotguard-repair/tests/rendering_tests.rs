//! Instruction rendering against the fixture outline.

use plotguard_contract::extract_contract;
use plotguard_core::{BatchResult, Outline};
use plotguard_planner::{build_batch_plan, BatchPlanInput};
use plotguard_quality::validate_batch_against_plan;
use plotguard_repair::{
    render_batch_instructions, render_repair_instructions, synthesize_batch_repair, InstructionRenderer,
};

fn load_outline() -> Outline {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let json = std::fs::read_to_string(workspace_root.join("testing/fixtures/outlines/valid.json")).unwrap();
    Outline::from_json(&json).unwrap()
}

#[test]
fn test_last_batch_instructions() {
    let contract = extract_contract(&load_outline(), 1);
    let plans = build_batch_plan(&BatchPlanInput::from_contract(&contract, 4, 3));
    let text = render_batch_instructions(&plans[3], &contract).unwrap();

    assert!(text.starts_with("EPISODE 1: The Will | BATCH 4/4"));
    assert!(text.contains("Write exactly 3 scenes."));
    assert!(text.contains("- T_MAIN: Will Marta recover the family house?"));
    assert!(text.contains("- [tp_4] Don Ramiro offers to buy the house for cash -> Marta refuses and makes an enemy"));
    assert!(text.contains("THE FINAL SCENE MUST END ON THIS CLIFFHANGER (revelation):"));
    assert!(text.contains("her father's real signature"));
    assert!(text.contains("Leave the audience asking: Who forged the will?"));
    assert!(text.contains("Cut on the reveal itself, before anyone reacts."));
    assert!(!text.contains("SETPIECE:"));
}

#[test]
fn test_middle_batch_carries_setpiece() {
    let contract = extract_contract(&load_outline(), 1);
    let plans = build_batch_plan(&BatchPlanInput::from_contract(&contract, 4, 3));
    let text = render_batch_instructions(&plans[2], &contract).unwrap();

    assert!(text.contains("SETPIECE: The harbor warehouse chase with Marta and Tito (stakes: the original deed)"));
    assert!(text.contains("- [tp_3] Tito threatens Marta at the harbor warehouse"));
    assert!(!text.contains("CLIFFHANGER"));
}

#[test]
fn test_repair_instructions_list_edits_and_constraints() {
    let contract = extract_contract(&load_outline(), 1);
    let plans = build_batch_plan(&BatchPlanInput::from_contract(&contract, 4, 3));
    let result = BatchResult::from_json(
        r#"{"threads_advanced": [], "turning_points_executed": [],
            "scenes": [{"scene_number": 7, "raw_content": "Don Ramiro waits on his yacht."}]}"#,
    )
    .unwrap();
    let validation = validate_batch_against_plan(&result, &plans[3]);
    let spec = synthesize_batch_repair(&result, &plans[3], &validation);
    let text = render_repair_instructions(&spec).unwrap();

    assert!(text.starts_with("REPAIR EPISODE 1, BATCH 4"));
    assert!(text.contains("EDITS (scenes 7 only)"));
    assert!(text.contains("- Scene 7 (position 0):"));
    assert!(text.contains("Thread to advance: T_MAIN"));
    assert!(text.contains("- Do not add new scenes."));
    assert!(text.contains("- threads_advanced includes T_MAIN"));
}

#[test]
fn test_template_override_from_file() {
    let dir = std::env::temp_dir().join(format!("plotguard-templates-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("custom.yaml");
    std::fs::write(
        &path,
        "version: \"1.0\"\ntemplates:\n  batch_instructions:\n    template: \"{{episode_number}}/{{batch_number}}\"\n  repair_instructions:\n    template: \"fix {{episode_number}}\"\n",
    )
    .unwrap();

    let renderer = InstructionRenderer::load(path.to_str().unwrap()).unwrap();
    let contract = extract_contract(&load_outline(), 2);
    let plans = build_batch_plan(&BatchPlanInput::from_contract(&contract, 2, 3));
    assert_eq!(renderer.render_batch_instructions(&plans[1], &contract).unwrap(), "2/2");
    std::fs::remove_dir_all(&dir).ok();
}
