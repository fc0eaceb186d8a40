//! Step orchestration.
//!
//! Runs the configured analysis tools one after another and reduces
//! their results to a single exit code.

pub mod relay;
pub mod runner;
pub mod summary;

pub use relay::Relay;
pub use runner::{Orchestrator, RunOptions};
pub use summary::{failing_steps, summarize};
