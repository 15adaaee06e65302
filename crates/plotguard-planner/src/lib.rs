//! Plotguard Planner: batch partitioning and generation state
//!
//! ```text
//! EpisodeContract → BatchPlanInput → [BatchPlan; B]
//!                                        │
//!                 BatchResult ──► update_generation_state
//! ```

pub mod plan;
pub mod state;

pub use plan::{
    build_batch_plan, normalize_thread_ids, normalize_turning_point_ids, synthetic_thread_id,
    validate_batch_plan, BatchPlanInput,
};
pub use state::{create_initial_state, record_repair_attempt, update_generation_state, GenerationState};
