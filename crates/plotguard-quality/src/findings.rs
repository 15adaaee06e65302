//! Finding ledger shared by the validators
//!
//! Every check pushes a coded blocker or warning with its score impact.
//! The score starts at 100 and is clamped to [0, 100] when read.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Blocker,
    Warning,
}

/// Single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// `AREA:detail` code
    pub code: String,
    pub severity: Severity,
    /// Score impact (negative or zero)
    pub impact: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Findings {
    entries: Vec<Finding>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocker(&mut self, code: impl Into<String>, weight: u32) {
        self.push(code.into(), Severity::Blocker, weight);
    }

    pub fn warning(&mut self, code: impl Into<String>, weight: u32) {
        self.push(code.into(), Severity::Warning, weight);
    }

    fn push(&mut self, code: String, severity: Severity, weight: u32) {
        tracing::debug!(code = %code, ?severity, weight, "qc finding");
        self.entries.push(Finding {
            code,
            severity,
            impact: -(weight as i32),
        });
    }

    pub fn score(&self) -> u32 {
        let total: i32 = 100 + self.entries.iter().map(|f| f.impact).sum::<i32>();
        total.clamp(0, 100) as u32
    }

    pub fn has_blockers(&self) -> bool {
        self.entries.iter().any(|f| f.severity == Severity::Blocker)
    }

    pub fn blockers(&self) -> Vec<String> {
        self.codes(Severity::Blocker)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.codes(Severity::Warning)
    }

    fn codes(&self, severity: Severity) -> Vec<String> {
        self.entries
            .iter()
            .filter(|f| f.severity == severity)
            .map(|f| f.code.clone())
            .collect()
    }
}

/// Whole-number percentage of `ratio`
pub fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round().clamp(0.0, 100.0) as u32
}
