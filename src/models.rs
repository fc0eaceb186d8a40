//! Data models for the quality gate.
//!
//! This module contains the step definitions handed to the orchestrator
//! and the results it produces for each of them.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

/// Exit code recorded when a step's executable could not be started.
pub const LAUNCH_FAILURE_CODE: i32 = -1;

/// Exit code recorded when a step exceeded its timeout and was killed.
pub const TIMEOUT_CODE: i32 = -2;

/// Exit code recorded when a step was terminated by a signal.
pub const TERMINATED_CODE: i32 = -3;

/// One external analysis tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisStep {
    /// Human-readable step name, used in headers.
    pub name: String,
    /// Executable to run (looked up on `PATH` when not absolute).
    pub command: String,
    /// Arguments passed before the target path.
    pub args: Vec<String>,
    /// Kill the step after this long.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "as_secs")]
    pub timeout: Option<Duration>,
}

impl AnalysisStep {
    /// Creates a step with no timeout.
    pub fn new(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            timeout: None,
        }
    }

    /// Returns the step with the given timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The full command line as it will be executed against `target`.
    pub fn command_line(&self, target: &str) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        parts.push(self.command.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(target);
        parts.join(" ")
    }
}

/// Outcome of running a single step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// The step that was executed.
    pub step: AnalysisStep,
    /// Tool exit code, or one of the sentinel codes.
    pub exit_code: i32,
    /// Captured standard output.
    #[serde(serialize_with = "lossy_utf8")]
    pub stdout: Vec<u8>,
    /// Captured standard error.
    #[serde(serialize_with = "lossy_utf8")]
    pub stderr: Vec<u8>,
    /// Why the tool did not run to completion, if it didn't.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent on the step.
    pub duration_seconds: f64,
}

impl StepResult {
    /// Whether the tool ran and reported no issues.
    pub fn is_clean(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether the exit code is one of the sentinels rather than the tool's own.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.exit_code,
            LAUNCH_FAILURE_CODE | TIMEOUT_CODE | TERMINATED_CODE
        )
    }

    /// Short status label for summaries.
    pub fn status_label(&self) -> String {
        match self.exit_code {
            0 => "clean".to_string(),
            LAUNCH_FAILURE_CODE => "launch failed".to_string(),
            TIMEOUT_CODE => "timed out".to_string(),
            TERMINATED_CODE => "terminated".to_string(),
            code => format!("exit {}", code),
        }
    }

    /// Returns an emoji representation of the status.
    pub fn emoji(&self) -> &'static str {
        if self.is_clean() {
            "✅"
        } else if self.is_sentinel() {
            "❌"
        } else {
            "⚠️"
        }
    }
}

/// Results of one orchestrator run, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Target path every step was run against.
    pub target: PathBuf,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// One entry per attempted step.
    pub results: Vec<StepResult>,
}

impl RunReport {
    /// Creates an empty report for `target`.
    pub fn new(target: PathBuf) -> Self {
        Self {
            target,
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepResult> {
        self.results.iter()
    }

    /// Total wall-clock time across all steps.
    pub fn total_duration_seconds(&self) -> f64 {
        self.results.iter().map(|r| r.duration_seconds).sum()
    }
}

fn lossy_utf8<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

fn as_secs<S: Serializer>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match timeout {
        Some(d) => serializer.serialize_some(&d.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}
