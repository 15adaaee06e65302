//! Plotguard Core: data model shared by every stage of the engine
//!
//! Outline and generator payloads (untrusted, leniently decoded), the
//! derived episode contract and batch plans, the run context and content
//! fingerprints.

pub mod contract;
pub mod context;
pub mod data_model;
pub mod error;
pub mod fingerprint;
pub mod lenient;

pub use context::RunContext;
pub use contract::{
    BatchPlan, Cliffhanger, CliffhangerKind, DilemmaSource, EpisodeContract, FactionRule,
    MoralDilemma, Setpiece, ThreadRequirement, TurningPoint, UNKNOWN_AGENT, UNSPECIFIED_AGENT,
};
pub use data_model::{
    is_yaml_path, BatchResult, Character, CliffhangerSource, DialogueLine, EntityRule, EpisodeBeat, Faction,
    MoralDilemmaSource, Outline, Scene, Script, SeasonArc, SetpieceSource, StructuredTurningPoint,
    Thread, ThreadUsage, TurningPointSource,
};
pub use error::PlotguardError;
pub use fingerprint::{fingerprint, hash_bytes};

/// Engine version stamped into reports
pub const PLOTGUARD_VERSION: &str = "1.0.0";
