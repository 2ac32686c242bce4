//! TOML-driven recorder configuration.
//!
//! Example:
//! ```toml
//! max_steps = 500
//! step_id_base = 1
//! ```
//!
//! Both keys are optional. Without `max_steps` the history is unbounded;
//! `step_id_base` defaults to 0.

use std::path::Path;

use serde::{Deserialize, Serialize};

use acp_contracts::error::{TraceError, TraceResult};

/// Limits and numbering rules applied by a `RunRecorder`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecorderConfig {
    /// Maximum number of steps handed to the sink. Steps past the limit are
    /// still counted but dropped, and the run is marked truncated.
    #[serde(default)]
    pub max_steps: Option<usize>,

    /// Smallest acceptable `step_id` for the first step of a run.
    #[serde(default)]
    pub step_id_base: u64,
}

impl RecorderConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `TraceError::Config` if the TOML is malformed, carries unknown
    /// keys, or sets `max_steps = 0`.
    pub fn from_toml_str(s: &str) -> TraceResult<Self> {
        let config: RecorderConfig = toml::from_str(s).map_err(|e| TraceError::Config {
            reason: format!("failed to parse recorder TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as recorder configuration.
    pub fn from_file(path: &Path) -> TraceResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| TraceError::Config {
            reason: format!("failed to read recorder config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> TraceResult<()> {
        if self.max_steps == Some(0) {
            return Err(TraceError::Config {
                reason: "max_steps must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }
}
