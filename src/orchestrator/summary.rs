//! Aggregate exit code for a run.

use crate::models::RunReport;

/// Collapse a report into a single process exit code.
///
/// Returns 0 when every step exited 0, otherwise the first non-zero code
/// (tool or sentinel) in step order.
pub fn summarize(report: &RunReport) -> i32 {
    report
        .iter()
        .map(|result| result.exit_code)
        .find(|&code| code != 0)
        .unwrap_or(0)
}

/// Names of the steps that did not exit 0, in step order.
pub fn failing_steps(report: &RunReport) -> Vec<&str> {
    report
        .iter()
        .filter(|result| !result.is_clean())
        .map(|result| result.step.name.as_str())
        .collect()
}
