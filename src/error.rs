//! Orchestrator error taxonomy.
//!
//! Only `InvalidTarget` and `NoSteps` abort a run. The step-level variants
//! are recorded in the step's result and the run moves on.

use crate::models::{LAUNCH_FAILURE_CODE, TIMEOUT_CODE};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid target {}: {reason}", .path.display())]
    InvalidTarget { path: PathBuf, reason: String },

    #[error("no analysis steps configured")]
    NoSteps,

    #[error("step '{step}' failed to launch `{command}`: {source}")]
    StepLaunch {
        step: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("step '{step}' timed out after {}s", .timeout.as_secs_f64())]
    StepTimeout { step: String, timeout: Duration },

    #[error("step '{step}' failed while collecting output: {source}")]
    StepIo {
        step: String,
        #[source]
        source: std::io::Error,
    },
}

impl OrchestratorError {
    /// The sentinel exit code recorded for a step-level error.
    ///
    /// `None` for the errors that abort the run instead.
    pub fn sentinel_code(&self) -> Option<i32> {
        match self {
            Self::StepLaunch { .. } | Self::StepIo { .. } => Some(LAUNCH_FAILURE_CODE),
            Self::StepTimeout { .. } => Some(TIMEOUT_CODE),
            Self::InvalidTarget { .. } | Self::NoSteps => None,
        }
    }
}
