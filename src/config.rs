//! Configuration file handling.
//!
//! A TOML file describing the target and the step list. It is only read
//! when passed explicitly with `--config`; otherwise the built-in
//! defaults (pylint, then bandit) are used.

use crate::models::AnalysisStep;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis steps, in execution order.
    #[serde(default = "default_steps")]
    pub steps: Vec<StepConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            steps: default_steps(),
        }
    }
}

/// General run settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default target path, used when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,

    /// Default per-step timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Stop after the first step that reports issues.
    #[serde(default)]
    pub fail_fast: bool,
}

/// A single step as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Step name shown in headers.
    pub name: String,

    /// Executable to run.
    pub command: String,

    /// Arguments placed before the target path.
    #[serde(default)]
    pub args: Vec<String>,

    /// Overrides the general timeout for this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

fn default_steps() -> Vec<StepConfig> {
    vec![
        StepConfig {
            name: "style".to_string(),
            command: "pylint".to_string(),
            args: Vec::new(),
            timeout_seconds: None,
        },
        StepConfig {
            name: "security".to_string(),
            command: "bandit".to_string(),
            args: vec!["-r".to_string()],
            timeout_seconds: None,
        },
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Check the step list for problems the orchestrator can't recover from.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            bail!("At least one [[steps]] entry is required");
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.name.trim().is_empty() {
                bail!("Step names must not be empty");
            }
            if step.command.trim().is_empty() {
                bail!("Step '{}' has an empty command", step.name);
            }
            if step.timeout_seconds == Some(0) {
                bail!("Step '{}' timeout must be at least 1 second", step.name);
            }
            if !seen.insert(step.name.as_str()) {
                bail!("Duplicate step name: {}", step.name);
            }
        }

        if self.general.timeout_seconds == Some(0) {
            bail!("General timeout must be at least 1 second");
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref target) = args.target {
            self.general.target = Some(target.clone());
        }

        if let Some(timeout) = args.timeout {
            self.general.timeout_seconds = Some(timeout);
        }

        if args.fail_fast {
            self.general.fail_fast = true;
        }
    }

    /// The target to analyze, falling back to the current directory.
    pub fn target(&self) -> PathBuf {
        self.general
            .target
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Build the analysis steps, optionally restricted to `only`.
    ///
    /// Selected steps keep their configured order. Unknown names are an error.
    pub fn steps(&self, only: Option<&[String]>) -> Result<Vec<AnalysisStep>> {
        if let Some(names) = only {
            for name in names {
                if !self.steps.iter().any(|s| &s.name == name) {
                    bail!("Unknown step '{}' in --only", name);
                }
            }
        }

        let default_timeout = self.general.timeout_seconds;

        Ok(self
            .steps
            .iter()
            .filter(|s| only.map_or(true, |names| names.contains(&s.name)))
            .map(|s| {
                let timeout = s
                    .timeout_seconds
                    .or(default_timeout)
                    .map(Duration::from_secs);
                AnalysisStep::new(s.name.clone(), s.command.clone(), s.args.clone())
                    .with_timeout(timeout)
            })
            .collect())
    }

    /// Generate the default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
