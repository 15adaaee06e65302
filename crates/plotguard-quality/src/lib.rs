//! Plotguard Quality: narrative QC
//!
//! Three validators share one finding ledger and one profile:
//!
//! - [`validate_outline`]: pre-generation gate on the outline
//! - [`validate_batch_against_plan`]: one batch against its plan
//! - [`validate_script`]: the assembled script against the episode contract
//!
//! # Example
//!
//! ```ignore
//! use plotguard_quality::{validate_script, ScriptQuality};
//!
//! let result = validate_script(&script, &contract);
//! if !result.passed {
//!     println!("{} (score: {}): {:?}", result.quality, result.score, result.blockers);
//! }
//! ```

pub mod batch;
pub mod findings;
pub mod gate;
pub mod profile;
pub mod script;

pub use batch::{
    character_appeared, validate_batch_against_plan, validate_batch_with_profile, BatchValidationResult,
};
pub use findings::{Finding, Findings, Severity};
pub use gate::{validate_outline, validate_outline_with_profile, OutlineQuality, QcResult};
pub use profile::{BatchRules, GateRules, ProfileError, QcProfile, ScriptRules};
pub use script::{
    validate_script, validate_script_with_profile, CliffhangerMatch, CoverageReport,
    SceneDepthIssue, ScriptQcResult, ScriptQuality, SetpieceExecution, TurningPointCoverage,
};
