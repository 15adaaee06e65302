//! Plotguard Stages: run one episode against a batch generator
//!
//! ```text
//! Outline ─► EpisodeContract ─► [BatchPlan]
//!                                   │ for each plan, in order
//!                                   ▼
//!        BatchGenerator ─► validate ─► accept | repair (bounded) | abandon
//!                                   │
//!                                   ▼
//!                 GenerationState + Script ─► script QC ─► EpisodeReport
//! ```

pub mod generator;
pub mod repair_loop;
pub mod runner;

pub use generator::{BatchGenerator, GenerationRequest, GeneratorError};
pub use repair_loop::{RepairLoop, RepairPhase};
pub use runner::{
    AttemptRecord, BatchOutcome, BatchReport, EpisodeReport, EpisodeRunner, RunError, RunnerConfig,
};
