//! Run Context: identity and settings of one episode generation run
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    pub episode_number: u32,
    pub started_at: DateTime<Utc>,
    /// Name of the QC profile in force (ex: "standard@1.0")
    pub profile: String,
}

impl RunContext {
    pub fn new(episode_number: u32) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            episode_number,
            started_at: Utc::now(),
            profile: "standard@1.0".to_string(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }
}
