//! Unified Error Model
//!
//! Content problems in outlines and scripts are never errors; they surface
//! as QC blockers. Only unreadable or syntactically invalid documents fail.
//! Rendering and generator failures have their own types in the crates
//! that own them.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotguardError {
    #[error("PARSE/{0}")]
    Parse(String),

    #[error("IO/{0}")]
    Io(#[from] std::io::Error),
}
