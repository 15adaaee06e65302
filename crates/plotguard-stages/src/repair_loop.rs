//! Bounded repair loop for one batch
//!
//! ```text
//! Planned ─► Generated ─► Validated ─┬─► Accepted
//!               ▲                     ├─► Abandoned   (not repairable)
//!               │                     ├─► Exhausted   (out of attempts)
//!               └──── Repairing ◄─────┘
//! ```

use crate::runner::RunError;
use plotguard_quality::BatchValidationResult;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RepairPhase {
    Planned,
    Generated { attempt: u32 },
    Validated { attempt: u32, passed: bool, can_repair: bool },
    Repairing { attempt: u32 },
    Accepted { attempt: u32 },
    Exhausted { attempt: u32 },
    Abandoned { attempt: u32 },
}

impl RepairPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted { .. } | Self::Exhausted { .. } | Self::Abandoned { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Generated { .. } => "generated",
            Self::Validated { .. } => "validated",
            Self::Repairing { .. } => "repairing",
            Self::Accepted { .. } => "accepted",
            Self::Exhausted { .. } => "exhausted",
            Self::Abandoned { .. } => "abandoned",
        }
    }
}

impl fmt::Display for RepairPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct RepairLoop {
    phase: RepairPhase,
    max_repair_attempts: u32,
}

impl RepairLoop {
    pub fn new(max_repair_attempts: u32) -> Self {
        Self {
            phase: RepairPhase::Planned,
            max_repair_attempts,
        }
    }

    pub fn phase(&self) -> RepairPhase {
        self.phase
    }

    fn invalid(&self, event: &'static str) -> RunError {
        RunError::InvalidTransition {
            from: self.phase.to_string(),
            event,
        }
    }

    /// The generator returned output for the current attempt
    pub fn generated(&mut self) -> Result<RepairPhase, RunError> {
        self.phase = match self.phase {
            RepairPhase::Planned => RepairPhase::Generated { attempt: 0 },
            RepairPhase::Repairing { attempt } => RepairPhase::Generated { attempt },
            _ => return Err(self.invalid("generated")),
        };
        Ok(self.phase)
    }

    /// The output was validated against its plan
    pub fn validated(&mut self, validation: &BatchValidationResult) -> Result<RepairPhase, RunError> {
        self.phase = match self.phase {
            RepairPhase::Generated { attempt } => RepairPhase::Validated {
                attempt,
                passed: validation.passed,
                can_repair: validation.can_repair,
            },
            _ => return Err(self.invalid("validated")),
        };
        Ok(self.phase)
    }

    /// Decide what follows a validation
    pub fn advance(&mut self) -> Result<RepairPhase, RunError> {
        self.phase = match self.phase {
            RepairPhase::Validated { attempt, passed: true, .. } => RepairPhase::Accepted { attempt },
            RepairPhase::Validated { attempt, can_repair: false, .. } => RepairPhase::Abandoned { attempt },
            RepairPhase::Validated { attempt, .. } if attempt >= self.max_repair_attempts => {
                RepairPhase::Exhausted { attempt }
            }
            RepairPhase::Validated { attempt, .. } => RepairPhase::Repairing { attempt: attempt + 1 },
            _ => return Err(self.invalid("advance")),
        };
        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(passed: bool, can_repair: bool) -> BatchValidationResult {
        BatchValidationResult { passed, can_repair, ..Default::default() }
    }

    #[test]
    fn test_pass_on_first_draft() {
        let mut lp = RepairLoop::new(1);
        lp.generated().unwrap();
        lp.validated(&validation(true, false)).unwrap();
        assert_eq!(lp.advance().unwrap(), RepairPhase::Accepted { attempt: 0 });
        assert!(lp.phase().is_terminal());
    }

    #[test]
    fn test_repair_then_exhaust() {
        let mut lp = RepairLoop::new(1);
        lp.generated().unwrap();
        lp.validated(&validation(false, true)).unwrap();
        assert_eq!(lp.advance().unwrap(), RepairPhase::Repairing { attempt: 1 });
        assert_eq!(lp.generated().unwrap(), RepairPhase::Generated { attempt: 1 });
        lp.validated(&validation(false, true)).unwrap();
        assert_eq!(lp.advance().unwrap(), RepairPhase::Exhausted { attempt: 1 });
    }

    #[test]
    fn test_unrepairable_is_abandoned() {
        let mut lp = RepairLoop::new(3);
        lp.generated().unwrap();
        lp.validated(&validation(false, false)).unwrap();
        assert_eq!(lp.advance().unwrap(), RepairPhase::Abandoned { attempt: 0 });
    }

    #[test]
    fn test_zero_attempts_exhausts_immediately() {
        let mut lp = RepairLoop::new(0);
        lp.generated().unwrap();
        lp.validated(&validation(false, true)).unwrap();
        assert_eq!(lp.advance().unwrap(), RepairPhase::Exhausted { attempt: 0 });
    }

    #[test]
    fn test_invalid_transitions() {
        let mut lp = RepairLoop::new(1);
        let err = lp.advance().unwrap_err();
        assert_eq!(err.to_string(), "RUN/TRANSITION: cannot apply advance in phase planned");
        assert!(lp.validated(&validation(true, false)).is_err());

        lp.generated().unwrap();
        assert!(lp.generated().is_err());
        lp.validated(&validation(true, false)).unwrap();
        lp.advance().unwrap();
        assert!(lp.generated().is_err());
        assert!(lp.advance().is_err());
    }
}
