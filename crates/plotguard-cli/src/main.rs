use anyhow::{bail, Context, Result};
use clap::Parser;
use plotguard_contract::extract_contract;
use plotguard_core::{Outline, Script};
use plotguard_planner::{build_batch_plan, validate_batch_plan, BatchPlanInput};
use plotguard_quality::{validate_outline_with_profile, validate_script_with_profile, QcProfile};
use plotguard_repair::{synthesize_script_repair, InstructionRenderer};
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;

mod cli;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Execute one command; `Ok(false)` means a check ran and failed
fn run(cli: Cli) -> Result<bool> {
    let profile = resolve_profile(&cli.profile)?;

    match cli.command {
        Commands::Gate { outline, episodes } => {
            let outline = load_outline(&outline)?;
            let qc = validate_outline_with_profile(&outline, episodes, &profile);
            print_json(&qc)?;
            Ok(qc.passed)
        }

        Commands::Contract { outline, episode } => {
            let outline = load_outline(&outline)?;
            ensure_episode(&outline, episode)?;
            print_json(&extract_contract(&outline, episode))?;
            Ok(true)
        }

        Commands::Plan { outline, episode, batches, scenes } => {
            let outline = load_outline(&outline)?;
            ensure_episode(&outline, episode)?;
            let contract = extract_contract(&outline, episode);
            let input = BatchPlanInput::from_contract(&contract, batches, scenes);
            let plans = build_batch_plan(&input);
            let warnings = validate_batch_plan(&plans, &input);
            print_json(&json!({ "plans": plans, "warnings": warnings }))?;
            Ok(true)
        }

        Commands::Script { outline, script, episode } => {
            let outline = load_outline(&outline)?;
            ensure_episode(&outline, episode)?;
            let script = load_script(&script)?;
            let contract = extract_contract(&outline, episode);
            let qc = validate_script_with_profile(&script, &contract, &profile);
            let repair = (!qc.passed).then(|| synthesize_script_repair(&script, &contract, &qc));
            print_json(&json!({ "qc": qc, "repair": repair }))?;
            Ok(qc.passed)
        }

        Commands::Instructions { outline, episode, batch, batches, scenes, templates } => {
            let outline = load_outline(&outline)?;
            ensure_episode(&outline, episode)?;
            let contract = extract_contract(&outline, episode);
            let plans = build_batch_plan(&BatchPlanInput::from_contract(&contract, batches, scenes));
            let Some(plan) = batch.checked_sub(1).and_then(|i| plans.get(i as usize)) else {
                bail!("batch {} out of range 1..={}", batch, plans.len());
            };
            let renderer = match templates {
                Some(path) => InstructionRenderer::load(&path.to_string_lossy())?,
                None => InstructionRenderer::builtin()?,
            };
            println!("{}", renderer.render_batch_instructions(plan, &contract)?);
            Ok(true)
        }
    }
}

/// A preset name, or a path to a profile YAML file
fn resolve_profile(profile: &str) -> Result<QcProfile> {
    if Path::new(profile).is_file() {
        return QcProfile::load(profile).with_context(|| format!("loading profile {}", profile));
    }
    Ok(QcProfile::for_name(profile))
}

fn load_outline(path: &Path) -> Result<Outline> {
    Outline::load(path).with_context(|| format!("loading outline {}", path.display()))
}

fn load_script(path: &Path) -> Result<Script> {
    Script::load(path).with_context(|| format!("loading script {}", path.display()))
}

fn ensure_episode(outline: &Outline, episode: u32) -> Result<()> {
    if outline.beat(episode).is_none() {
        bail!("episode {} not in outline ({} beats)", episode, outline.episode_beats.len());
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
