//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// LintGate - run static-analysis tools and gate on their exit codes
///
/// Runs each configured tool (pylint, then bandit by default) against
/// the target path, prints their findings, and exits with the first
/// non-zero exit code.
///
/// Examples:
///   lintgate ./src
///   lintgate --only security --timeout 300
///   lintgate --config lintgate.toml --format json
///   lintgate --dry-run
///   lintgate --print-config > lintgate.toml
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory (or file) to analyze
    ///
    /// Defaults to the config file's target, or the current directory.
    #[arg(value_name = "TARGET", env = "LINTGATE_TARGET")]
    pub target: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// Only read when given; there is no automatic lookup.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Per-step timeout in seconds
    ///
    /// A step running longer is killed and recorded as timed out.
    /// Per-step timeouts in the config file take precedence.
    #[arg(long, value_name = "SECS", env = "LINTGATE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Only run these steps (comma-separated)
    ///
    /// Example: --only style,security
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub only: Option<Vec<String>>,

    /// Stop after the first step that reports issues
    #[arg(long)]
    pub fail_fast: bool,

    /// Format of the summary printed after all tool output
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Print the commands that would run and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (tool output only)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Format of the end-of-run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Text,
    /// JSON document with every step result
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.print_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref only) = self.only {
            if only.iter().any(|name| name.trim().is_empty()) {
                return Err("--only must not contain empty step names".to_string());
            }
        }

        if let Some(ref config) = self.config {
            if !config.is_file() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
