//! Generator boundary: the only place the engine waits on the outside world

use async_trait::async_trait;
use plotguard_core::{BatchPlan, BatchResult};
use plotguard_repair::RepairSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the generator is asked to write for one attempt at one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub plan: BatchPlan,
    /// Rendered batch instructions
    pub instructions: String,
    /// 0 for the first draft, then one per repair
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_instructions: Option<String>,
    /// Output of the attempt being repaired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<BatchResult>,
}

impl GenerationRequest {
    pub fn first_draft(plan: BatchPlan, instructions: String) -> Self {
        Self {
            plan,
            instructions,
            attempt: 0,
            repair: None,
            repair_instructions: None,
            previous: None,
        }
    }

    pub fn is_repair(&self) -> bool {
        self.repair.is_some()
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("GENERATOR/UNAVAILABLE: {0}")]
    Unavailable(String),

    #[error("GENERATOR/MALFORMED: {0}")]
    Malformed(String),
}

/// Produces scenes for a batch plan.
///
/// Implementations wrap a model client; the engine never calls a model
/// directly.
#[async_trait]
pub trait BatchGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<BatchResult, GeneratorError>;
}
