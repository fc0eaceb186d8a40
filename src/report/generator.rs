//! End-of-run summary generation.
//!
//! Renders the run report as a short text table or as JSON. The summary
//! is printed after all relayed tool output; nothing is written to disk.

use crate::models::{RunReport, StepResult};
use crate::orchestrator::{failing_steps, summarize};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Generate the human-readable summary block.
pub fn generate_text_summary(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str("\n📊 Summary:\n");
    output.push_str(&format!("   Target: {}\n", report.target.display()));

    let width = report
        .iter()
        .map(|r| r.step.name.chars().count())
        .max()
        .unwrap_or(0);

    for result in report.iter() {
        output.push_str(&generate_step_line(result, width));
    }

    output.push_str(&format!(
        "   Duration: {:.1}s\n",
        report.total_duration_seconds()
    ));

    let code = summarize(report);
    if code == 0 {
        output.push_str("\n✅ All steps clean.\n");
    } else {
        output.push_str(&format!(
            "\n⛔ Issues reported by: {} (exit code {}).\n",
            failing_steps(report).join(", "),
            code
        ));
    }

    output
}

/// One line per step: status, padded name, label and duration.
fn generate_step_line(result: &StepResult, width: usize) -> String {
    format!(
        "   {} {:<width$}  {} ({:.1}s)\n",
        result.emoji(),
        result.step.name,
        result.status_label(),
        result.duration_seconds,
        width = width
    )
}

/// JSON view of a run, including the aggregate exit code.
#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a Path,
    started_at: DateTime<Utc>,
    exit_code: i32,
    duration_seconds: f64,
    steps: &'a [StepResult],
}

/// Generate a JSON summary including the aggregate exit code.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    let json = JsonReport {
        target: &report.target,
        started_at: report.started_at,
        exit_code: summarize(report),
        duration_seconds: report.total_duration_seconds(),
        steps: &report.results,
    };
    serde_json::to_string_pretty(&json).map_err(Into::into)
}
