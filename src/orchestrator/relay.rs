//! Relays step headers and captured tool output to the user.

use crate::models::{AnalysisStep, StepResult};
use std::io::{self, Write};

/// Writes step output to a pair of sinks.
///
/// Headers and tool stdout go to `out`, tool stderr and failure notices
/// go to `err`. Both sinks are flushed at the end of every step.
pub struct Relay<O: Write, E: Write> {
    out: O,
    err: E,
}

impl Relay<io::Stdout, io::Stderr> {
    /// Relay to the process's own stdout and stderr.
    pub fn console() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Relay<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    /// Print the header line announcing a step.
    pub fn header(
        &mut self,
        index: usize,
        total: usize,
        step: &AnalysisStep,
        target: &str,
    ) -> io::Result<()> {
        writeln!(
            self.out,
            "🔍 [{}/{}] {}: {}",
            index + 1,
            total,
            step.name,
            step.command_line(target)
        )?;
        self.out.flush()
    }

    /// Write a step's captured output verbatim, then flush both sinks.
    pub fn step_output(&mut self, result: &StepResult) -> io::Result<()> {
        self.out.write_all(&result.stdout)?;
        self.err.write_all(&result.stderr)?;

        if let Some(ref error) = result.error {
            writeln!(self.err, "❌ {}", error)?;
        }

        self.out.flush()?;
        self.err.flush()
    }

    /// Consume the relay, returning the sinks.
    #[cfg(test)]
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}
