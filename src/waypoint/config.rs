// SPDX-License-Identifier: MIT

//! Environment-driven settings
//!
//! - `WAYPOINT_WORKFLOW_DIR` - directory scanned for definitions (default `workflows`)
//! - `WAYPOINT_WORKFLOW_PREFIX` - prefix prepended to every workflow name
//! - `WAYPOINT_ASSIGNMENT_TIMEOUT_SECS` - bound on assignment resolver calls;
//!   unset or `0` means no bound

use std::path::PathBuf;
use std::time::Duration;

use crate::kit::EngineError;

pub const WORKFLOW_DIR_VAR: &str = "WAYPOINT_WORKFLOW_DIR";
pub const WORKFLOW_PREFIX_VAR: &str = "WAYPOINT_WORKFLOW_PREFIX";
pub const ASSIGNMENT_TIMEOUT_VAR: &str = "WAYPOINT_ASSIGNMENT_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub workflow_dir: PathBuf,
    pub prefix: String,
    pub assignment_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workflow_dir: PathBuf::from("workflows"),
            prefix: String::new(),
            assignment_timeout: None,
        }
    }
}

impl EngineConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(WORKFLOW_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.workflow_dir = PathBuf::from(dir.trim());
        }
        if let Some(prefix) = lookup(WORKFLOW_PREFIX_VAR) {
            config.prefix = prefix.trim().to_string();
        }
        if let Some(raw) = lookup(ASSIGNMENT_TIMEOUT_VAR).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                EngineError::config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ASSIGNMENT_TIMEOUT_VAR, raw
                ))
            })?;
            config.assignment_timeout = (secs > 0).then_some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
