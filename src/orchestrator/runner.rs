//! Sequential execution of analysis steps.
//!
//! Each step is spawned, awaited to completion (or timeout), and its
//! captured output relayed before the next step is started.

use super::relay::Relay;
use crate::error::OrchestratorError;
use crate::models::{AnalysisStep, RunReport, StepResult, TERMINATED_CODE};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Options controlling a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Stop after the first step that does not exit 0.
    pub fail_fast: bool,
    /// Draw a spinner on stderr while a step is running.
    pub show_progress: bool,
}

/// Runs an ordered list of analysis steps against one target.
pub struct Orchestrator {
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Run every step against `target`, in order.
    ///
    /// Fails only when the target is unusable or no steps were given, and
    /// then before anything is printed. A step that cannot be launched or
    /// that times out is recorded with a sentinel exit code; later steps
    /// still run.
    pub async fn run<O: Write, E: Write>(
        &self,
        target: &Path,
        steps: &[AnalysisStep],
        relay: &mut Relay<O, E>,
    ) -> Result<RunReport, OrchestratorError> {
        if steps.is_empty() {
            return Err(OrchestratorError::NoSteps);
        }
        validate_target(target)?;

        let target_display = target.display().to_string();
        let mut report = RunReport::new(target.to_path_buf());
        info!(
            "Running {} step(s) against {}",
            steps.len(),
            target_display
        );

        for (index, step) in steps.iter().enumerate() {
            if let Err(e) = relay.header(index, steps.len(), step, &target_display) {
                warn!("Failed to write header for '{}': {}", step.name, e);
            }

            let result = self.run_step(step, target).await;
            debug!(
                "Step '{}' finished with exit code {} in {:.2}s",
                step.name, result.exit_code, result.duration_seconds
            );

            if let Err(e) = relay.step_output(&result) {
                warn!("Failed to relay output for '{}': {}", step.name, e);
            }

            let stop = self.options.fail_fast && !result.is_clean();
            report.results.push(result);

            if stop {
                info!(
                    "Stopping after '{}' (fail-fast); {} step(s) skipped",
                    step.name,
                    steps.len() - index - 1
                );
                break;
            }
        }

        Ok(report)
    }

    /// Execute one step and turn whatever happened into a `StepResult`.
    async fn run_step(&self, step: &AnalysisStep, target: &Path) -> StepResult {
        let spinner = self.options.show_progress.then(|| spinner_for(step));
        let started = Instant::now();

        let Captured {
            stdout,
            stderr,
            status,
        } = execute_step(step, target).await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        let duration_seconds = started.elapsed().as_secs_f64();

        let (exit_code, error) = match status {
            Ok(status) => match status.code() {
                Some(code) => (code, None),
                None => (
                    TERMINATED_CODE,
                    Some(format!("step '{}' was terminated by a signal", step.name)),
                ),
            },
            Err(e) => {
                debug!("{}", e);
                (
                    e.sentinel_code().unwrap_or(TERMINATED_CODE),
                    Some(e.to_string()),
                )
            }
        };

        StepResult {
            step: step.clone(),
            exit_code,
            stdout,
            stderr,
            error,
            duration_seconds,
        }
    }
}

/// Whatever a step wrote, plus how it ended.
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    status: Result<ExitStatus, OrchestratorError>,
}

/// Check that `target` exists and can be read.
pub fn validate_target(target: &Path) -> Result<(), OrchestratorError> {
    let invalid = |reason: String| OrchestratorError::InvalidTarget {
        path: target.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(target).map_err(|e| invalid(e.to_string()))?;

    if metadata.is_dir() {
        std::fs::read_dir(target).map_err(|e| invalid(format!("cannot read directory: {}", e)))?;
    } else {
        std::fs::File::open(target).map_err(|e| invalid(format!("cannot read file: {}", e)))?;
    }

    Ok(())
}

/// Spawn the step's process and wait for it to exit with both streams drained.
///
/// Output is read into buffers owned here, so a step that times out still
/// returns everything it wrote before it was killed.
async fn execute_step(step: &AnalysisStep, target: &Path) -> Captured {
    debug!("Spawning: {}", step.command_line(&target.display().to_string()));

    let mut command = Command::new(&step.command);
    command
        .args(&step.args)
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(source) => {
            return Captured {
                stdout,
                stderr,
                status: Err(OrchestratorError::StepLaunch {
                    step: step.name.clone(),
                    command: step.command.clone(),
                    source,
                }),
            }
        }
    };

    let mut out_pipe = child.stdout.take();
    let mut err_pipe = child.stderr.take();

    let status = {
        let collect = async {
            let (out_read, err_read) = tokio::join!(
                drain(out_pipe.as_mut(), &mut stdout),
                drain(err_pipe.as_mut(), &mut stderr)
            );
            out_read?;
            err_read?;
            let status = child.wait().await?;
            Ok::<_, io::Error>(status)
        };

        let io_error = |source| OrchestratorError::StepIo {
            step: step.name.clone(),
            source,
        };

        match step.timeout {
            Some(limit) => match tokio::time::timeout(limit, collect).await {
                Ok(result) => result.map_err(io_error),
                Err(_) => Err(OrchestratorError::StepTimeout {
                    step: step.name.clone(),
                    timeout: limit,
                }),
            },
            None => collect.await.map_err(io_error),
        }
    };

    if matches!(status, Err(OrchestratorError::StepTimeout { .. })) {
        if let Err(e) = child.kill().await {
            warn!("Failed to kill timed-out step '{}': {}", step.name, e);
        }
    }

    Captured {
        stdout,
        stderr,
        status,
    }
}

/// Read a pipe to EOF, appending to `buf` as data arrives.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> io::Result<()> {
    if let Some(pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

fn spinner_for(step: &AnalysisStep) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("running {}...", step.name));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LAUNCH_FAILURE_CODE, TIMEOUT_CODE};
    use crate::orchestrator::summarize;
    use tempfile::TempDir;

    fn quiet_orchestrator() -> Orchestrator {
        Orchestrator::new(RunOptions {
            fail_fast: false,
            show_progress: false,
        })
    }

    /// A step running `script` under `sh -c`; the target lands in `$0`.
    fn sh_step(name: &str, script: &str) -> AnalysisStep {
        AnalysisStep::new(name, "sh", vec!["-c".to_string(), script.to_string()])
    }

    fn buffers() -> Relay<Vec<u8>, Vec<u8>> {
        Relay::new(Vec::new(), Vec::new())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_style_and_security_scenario() {
        let dir = TempDir::new().unwrap();
        let steps = vec![
            sh_step("style", "printf '3 issues found'; exit 1"),
            sh_step("security", "printf 'no issues'; exit 0"),
        ];
        let mut relay = buffers();

        let report = quiet_orchestrator()
            .run(dir.path(), &steps, &mut relay)
            .await
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.results[0].step.name, "style");
        assert_eq!(report.results[0].exit_code, 1);
        assert_eq!(report.results[0].stdout, b"3 issues found");
        assert_eq!(report.results[1].step.name, "security");
        assert_eq!(report.results[1].exit_code, 0);
        assert_eq!(report.results[1].stdout, b"no issues");
        assert_eq!(summarize(&report), 1);

        let (out, _) = relay.into_inner();
        let out = String::from_utf8(out).unwrap();
        let style_header = out.find("style:").unwrap();
        let style_output = out.find("3 issues found").unwrap();
        let security_header = out.find("security:").unwrap();
        let security_output = out.find("no issues").unwrap();
        assert!(style_header < style_output);
        assert!(style_output < security_header);
        assert!(security_header < security_output);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_target_is_appended_as_last_argument() {
        let dir = TempDir::new().unwrap();
        let steps = vec![sh_step("echo", "printf '%s' \"$0\"")];
        let mut relay = buffers();

        let report = quiet_orchestrator()
            .run(dir.path(), &steps, &mut relay)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8_lossy(&report.results[0].stdout),
            dir.path().display().to_string()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_executable_does_not_stop_run() {
        let dir = TempDir::new().unwrap();
        let steps = vec![
            AnalysisStep::new("missing", "lintgate-no-such-tool-7f3a", vec![]),
            sh_step("after", "printf 'still ran'"),
        ];
        let mut relay = buffers();

        let report = quiet_orchestrator()
            .run(dir.path(), &steps, &mut relay)
            .await
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.results[0].exit_code, LAUNCH_FAILURE_CODE);
        assert!(report.results[0].error.is_some());
        assert_eq!(report.results[1].exit_code, 0);
        assert_eq!(report.results[1].stdout, b"still ran");
        assert_eq!(summarize(&report), LAUNCH_FAILURE_CODE);

        let (_, err) = relay.into_inner();
        assert!(String::from_utf8(err).unwrap().contains("failed to launch"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_recorded_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let steps = vec![
            sh_step("slow", "sleep 5").with_timeout(Some(Duration::from_millis(200))),
            sh_step("fast", "exit 3"),
        ];
        let mut relay = buffers();

        let started = Instant::now();
        let report = quiet_orchestrator()
            .run(dir.path(), &steps, &mut relay)
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(report.len(), 2);
        assert_eq!(report.results[0].exit_code, TIMEOUT_CODE);
        assert!(report.results[0].error.as_deref().unwrap().contains("timed out"));
        assert_eq!(report.results[1].exit_code, 3);
        assert_eq!(summarize(&report), TIMEOUT_CODE);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_keeps_partial_output() {
        let dir = TempDir::new().unwrap();
        let steps = vec![
            sh_step("slow", "printf 'partial'; printf 'warn' >&2; sleep 5")
                .with_timeout(Some(Duration::from_millis(200))),
        ];
        let mut relay = buffers();

        let report = quiet_orchestrator()
            .run(dir.path(), &steps, &mut relay)
            .await
            .unwrap();

        assert_eq!(report.results[0].exit_code, TIMEOUT_CODE);
        assert_eq!(report.results[0].stdout, b"partial");
        assert_eq!(report.results[0].stderr, b"warn");

        let (out, _) = relay.into_inner();
        let out = String::from_utf8(out).unwrap();
        assert!(out.find("slow:").unwrap() < out.find("partial").unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_termination_is_recorded() {
        let dir = TempDir::new().unwrap();
        let steps = vec![
            sh_step("sig", "kill -9 $$"),
            sh_step("after", "printf 'still ran'"),
        ];
        let mut relay = buffers();

        let report = quiet_orchestrator()
            .run(dir.path(), &steps, &mut relay)
            .await
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.results[0].exit_code, TERMINATED_CODE);
        assert!(report.results[0].error.is_some());
        assert_eq!(report.results[1].exit_code, 0);
        assert_eq!(report.results[1].stdout, b"still ran");
        assert_eq!(summarize(&report), TERMINATED_CODE);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fail_fast_stops_after_first_failure() {
        let dir = TempDir::new().unwrap();
        let steps = vec![
            sh_step("first", "exit 0"),
            sh_step("second", "exit 2"),
            sh_step("third", "printf 'should not run'"),
        ];
        let mut relay = buffers();
        let orchestrator = Orchestrator::new(RunOptions {
            fail_fast: true,
            show_progress: false,
        });

        let report = orchestrator
            .run(dir.path(), &steps, &mut relay)
            .await
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(summarize(&report), 2);
        let (out, _) = relay.into_inner();
        assert!(!String::from_utf8(out).unwrap().contains("third"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_repeated_runs_summarize_identically() {
        let dir = TempDir::new().unwrap();
        let steps = vec![sh_step("a", "exit 0"), sh_step("b", "exit 4"), sh_step("c", "exit 1")];

        let first = quiet_orchestrator()
            .run(dir.path(), &steps, &mut buffers())
            .await
            .unwrap();
        let second = quiet_orchestrator()
            .run(dir.path(), &steps, &mut buffers())
            .await
            .unwrap();

        assert_eq!(summarize(&first), 4);
        assert_eq!(summarize(&first), summarize(&second));
    }

    #[tokio::test]
    async fn test_invalid_target_fails_before_any_step() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let steps = vec![AnalysisStep::new("style", "pylint", vec![])];
        let mut relay = buffers();

        let err = quiet_orchestrator()
            .run(&missing, &steps, &mut relay)
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::InvalidTarget { .. }));
        let (out, err_out) = relay.into_inner();
        assert!(out.is_empty());
        assert!(err_out.is_empty());
    }

    #[tokio::test]
    async fn test_empty_step_list_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = quiet_orchestrator()
            .run(dir.path(), &[], &mut buffers())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NoSteps));
    }

    #[test]
    fn test_validate_target_accepts_files_and_dirs() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("module.py");
        std::fs::write(&file, "print('hi')\n").unwrap();

        assert!(validate_target(dir.path()).is_ok());
        assert!(validate_target(&file).is_ok());
        assert!(validate_target(&dir.path().join("nope")).is_err());
    }
}
