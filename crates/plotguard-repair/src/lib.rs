//! Plotguard Repair: targeted repair specs and generator instructions
//!
//! [`synthesize_batch_repair`] and [`synthesize_script_repair`] turn a
//! failed validation into a [`RepairSpec`]. The [`InstructionRenderer`]
//! turns plans and repair specs into the text handed to the generator.
//!
//! # Example
//!
//! ```ignore
//! use plotguard_repair::{render_batch_instructions, synthesize_batch_repair};
//!
//! let instructions = render_batch_instructions(&plan, &contract)?;
//! let validation = validate_batch_against_plan(&result, &plan);
//! if validation.can_repair {
//!     let spec = synthesize_batch_repair(&result, &plan, &validation);
//!     println!("{}", render_repair_instructions(&spec)?);
//! }
//! ```

pub mod renderer;
pub mod synth;
pub mod templates;

pub use renderer::{batch_data, InstructionRenderer};
pub use synth::{synthesize_batch_repair, synthesize_script_repair, RepairSpec, SceneEdit, BASE_CONSTRAINTS};
pub use templates::{TemplatesFile, BUILTIN_TEMPLATES};

use plotguard_core::{BatchPlan, EpisodeContract};
use thiserror::Error;

/// Errors that can occur while loading or rendering templates
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("RENDER/TEMPLATE: {0}")]
    Template(String),
    #[error("RENDER/FAILED: {0}")]
    Render(String),
}

/// Render batch instructions with the built-in templates
pub fn render_batch_instructions(plan: &BatchPlan, contract: &EpisodeContract) -> Result<String, RenderError> {
    InstructionRenderer::builtin()?.render_batch_instructions(plan, contract)
}

/// Render repair instructions with the built-in templates
pub fn render_repair_instructions(spec: &RepairSpec) -> Result<String, RenderError> {
    InstructionRenderer::builtin()?.render_repair_instructions(spec)
}
