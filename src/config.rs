//! Configuration file parsing.
//!
//! ```toml
//! test_cmd = "npx jest --bail"
//! timeout_ms = 5000
//! ignore = ["^console\\."]
//! abort_on_fatal = false
//!
//! [exclude_mutations]
//! MATH = false          # switch a default-off rule on
//! LITERAL = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::{MutatorError, Result};
use crate::rules::RuleCode;
use crate::runner::RunOptions;

pub const DEFAULT_CONFIG_FILE: &str = "mutator.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Test command, program followed by its arguments
    pub test_cmd: Option<String>,
    /// Per-mutant timeout; derived from the baseline run when unset
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub abort_on_fatal: bool,
    #[serde(default)]
    pub exclude_mutations: BTreeMap<RuleCode, bool>,
}

impl Config {
    /// Load `path`, or `mutator.toml` in the working directory when it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| MutatorError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;
        let config = Self::parse(&content).map_err(|e| MutatorError::Config {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Compiled options for the orchestrator. `timeout` is used when the file
    /// does not set one.
    pub fn run_options(&self, timeout: Duration) -> Result<RunOptions> {
        let ignore = self
            .ignore
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| MutatorError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RunOptions {
            exclude_mutations: self.exclude_mutations.clone(),
            ignore,
            timeout: self.timeout_ms.map(Duration::from_millis).unwrap_or(timeout),
            abort_on_fatal: self.abort_on_fatal,
            ..RunOptions::default()
        })
    }
}
