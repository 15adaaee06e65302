//! Episode Runner: contract → plan → generate/validate/repair → script QC
use crate::generator::{BatchGenerator, GenerationRequest, GeneratorError};
use crate::repair_loop::{RepairLoop, RepairPhase};
use chrono::{DateTime, Utc};
use plotguard_contract::extract_contract;
use plotguard_core::{
    fingerprint, BatchPlan, BatchResult, EpisodeContract, Outline, PlotguardError, RunContext, Script,
    PLOTGUARD_VERSION,
};
use plotguard_planner::{
    build_batch_plan, create_initial_state, record_repair_attempt, update_generation_state,
    validate_batch_plan, BatchPlanInput, GenerationState,
};
use plotguard_quality::{validate_batch_with_profile, validate_script_with_profile, QcProfile, ScriptQcResult};
use plotguard_repair::{synthesize_batch_repair, synthesize_script_repair, InstructionRenderer, RenderError, RepairSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("RUN/EPISODE: episode {0} not in outline")]
    EpisodeNotFound(u32),

    #[error("RUN/TRANSITION: cannot apply {event} in phase {from}")]
    InvalidTransition { from: String, event: &'static str },

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Batching and retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub batch_count: u32,
    pub scenes_per_batch: u32,
    pub max_repair_attempts: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            batch_count: 4,
            scenes_per_batch: 3,
            max_repair_attempts: 1,
        }
    }
}

impl RunnerConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, PlotguardError> {
        serde_yaml::from_str(yaml).map_err(|e| PlotguardError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOutcome {
    /// Passed validation
    Accepted,
    /// Still failing after the last repair; absorbed as degraded
    Exhausted,
    /// Not repairable; scenes dropped
    Abandoned,
}

/// One generator call and its validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub batch_index: u32,
    pub attempt: u32,
    pub plan_hash: String,
    pub result_hash: String,
    pub passed: bool,
    pub blockers: Vec<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub index: u32,
    pub outcome: BatchOutcome,
    pub attempts: Vec<AttemptRecord>,
    /// Warnings of the final attempt
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub run_id: String,
    /// Engine version that produced the report
    pub engine_version: String,
    pub episode_number: u32,
    pub profile: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub contract: EpisodeContract,
    pub plans: Vec<BatchPlan>,
    pub plan_warnings: Vec<String>,
    pub state: GenerationState,
    pub batches: Vec<BatchReport>,
    pub script: Script,
    pub script_qc: ScriptQcResult,
    /// Repair request for the assembled script when its QC failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_repair: Option<RepairSpec>,
}

impl EpisodeReport {
    /// Script passed QC and no batch was abandoned
    pub fn passed(&self) -> bool {
        self.script_qc.passed && self.batches.iter().all(|b| b.outcome != BatchOutcome::Abandoned)
    }

    pub fn outcome_count(&self, outcome: BatchOutcome) -> usize {
        self.batches.iter().filter(|b| b.outcome == outcome).count()
    }
}

struct BatchRun {
    outcome: BatchOutcome,
    result: BatchResult,
    report: BatchReport,
    state: GenerationState,
}

pub struct EpisodeRunner<G: BatchGenerator> {
    generator: G,
    config: RunnerConfig,
    profile: QcProfile,
    renderer: InstructionRenderer,
}

impl<G: BatchGenerator> EpisodeRunner<G> {
    pub fn new(generator: G, config: RunnerConfig) -> Result<Self, RunError> {
        Ok(Self {
            generator,
            config,
            profile: QcProfile::standard(),
            renderer: InstructionRenderer::builtin()?,
        })
    }

    pub fn with_profile(mut self, profile: QcProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_renderer(mut self, renderer: InstructionRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn run_episode(&self, outline: &Outline, episode_number: u32) -> Result<EpisodeReport, RunError> {
        if outline.beat(episode_number).is_none() {
            return Err(RunError::EpisodeNotFound(episode_number));
        }
        let ctx = RunContext::new(episode_number).with_profile(self.profile.name.clone());

        let contract = extract_contract(outline, episode_number);
        let input = BatchPlanInput::from_contract(&contract, self.config.batch_count, self.config.scenes_per_batch);
        let plans = build_batch_plan(&input);
        let plan_warnings = validate_batch_plan(&plans, &input);
        for warning in &plan_warnings {
            warn!(run_id = %ctx.run_id, episode = episode_number, %warning, "plan warning");
        }

        info!(
            run_id = %ctx.run_id,
            episode = episode_number,
            batches = plans.len(),
            profile = %ctx.profile,
            version = PLOTGUARD_VERSION,
            "episode run started"
        );

        let mut state = create_initial_state();
        let mut scenes = Vec::new();
        let mut batches = Vec::with_capacity(plans.len());

        for plan in &plans {
            let run = self.run_batch(&ctx, plan, &contract, state).await?;
            state = run.state;
            match run.outcome {
                BatchOutcome::Accepted | BatchOutcome::Exhausted => {
                    state = update_generation_state(&state, &run.result, plan);
                    scenes.extend(run.result.scenes);
                }
                BatchOutcome::Abandoned => {
                    warn!(run_id = %ctx.run_id, episode = episode_number, batch = plan.batch_index, "batch abandoned");
                }
            }
            batches.push(run.report);
        }

        for (i, scene) in scenes.iter_mut().enumerate() {
            scene.scene_number = i as u32 + 1;
        }
        let script = Script { synopsis: String::new(), scenes };
        let script_qc = validate_script_with_profile(&script, &contract, &self.profile);
        let script_repair = (!script_qc.passed).then(|| synthesize_script_repair(&script, &contract, &script_qc));

        info!(
            run_id = %ctx.run_id,
            episode = episode_number,
            score = script_qc.score,
            quality = %script_qc.quality,
            scenes = script.scenes.len(),
            "episode run finished"
        );

        Ok(EpisodeReport {
            run_id: ctx.run_id,
            engine_version: PLOTGUARD_VERSION.to_string(),
            episode_number,
            profile: ctx.profile,
            started_at: ctx.started_at,
            finished_at: Utc::now(),
            contract,
            plans,
            plan_warnings,
            state,
            batches,
            script,
            script_qc,
            script_repair,
        })
    }

    async fn run_batch(
        &self,
        ctx: &RunContext,
        plan: &BatchPlan,
        contract: &EpisodeContract,
        mut state: GenerationState,
    ) -> Result<BatchRun, RunError> {
        let plan_hash = fingerprint(plan);
        let instructions = self.renderer.render_batch_instructions(plan, contract)?;
        let mut request = GenerationRequest::first_draft(plan.clone(), instructions);
        let mut repair_loop = RepairLoop::new(self.config.max_repair_attempts);
        let mut attempts = Vec::new();

        loop {
            let result = self.generator.generate(&request).await?;
            repair_loop.generated()?;

            let validation = validate_batch_with_profile(&result, plan, &self.profile);
            repair_loop.validated(&validation)?;
            attempts.push(AttemptRecord {
                batch_index: plan.batch_index,
                attempt: request.attempt,
                plan_hash: plan_hash.clone(),
                result_hash: fingerprint(&result),
                passed: validation.passed,
                blockers: validation.blockers.clone(),
                at: Utc::now(),
            });

            let phase = repair_loop.advance()?;
            info!(
                run_id = %ctx.run_id,
                episode = plan.episode_number,
                batch = plan.batch_index,
                attempt = request.attempt,
                %phase,
                "batch attempt validated"
            );

            let outcome = match phase {
                RepairPhase::Accepted { .. } => BatchOutcome::Accepted,
                RepairPhase::Exhausted { .. } => BatchOutcome::Exhausted,
                RepairPhase::Abandoned { .. } => BatchOutcome::Abandoned,
                RepairPhase::Repairing { attempt } => {
                    state = record_repair_attempt(&state, &validation.blockers.join("; "));
                    let spec = synthesize_batch_repair(&result, plan, &validation);
                    request.repair_instructions = Some(self.renderer.render_repair_instructions(&spec)?);
                    request.repair = Some(spec);
                    request.previous = Some(result);
                    request.attempt = attempt;
                    continue;
                }
                other => {
                    return Err(RunError::InvalidTransition {
                        from: other.to_string(),
                        event: "advance",
                    })
                }
            };

            return Ok(BatchRun {
                outcome,
                report: BatchReport {
                    index: plan.batch_index,
                    outcome,
                    attempts,
                    warnings: validation.warnings,
                },
                result,
                state,
            });
        }
    }
}
