//! Run-level trace metadata.
//!
//! A `RunMeta` is created once when an agent run begins and is mutated in
//! place by the single driver that owns the run. Its fields are public so
//! the owner can update counters directly; `transition()` is the checked
//! path for status changes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TraceError, TraceResult};

/// Lifecycle state of a run.
///
/// `Active` is the only non-terminal status. Once a run leaves `Active` it
/// never returns and never moves to another terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Active,
    Success,
    Failure,
    Stopped,
    Exhausted,
}

impl RunStatus {
    /// All statuses, in declaration order.
    pub const ALL: [RunStatus; 5] = [
        RunStatus::Active,
        RunStatus::Success,
        RunStatus::Failure,
        RunStatus::Stopped,
        RunStatus::Exhausted,
    ];

    /// The wire name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Active => "active",
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
            RunStatus::Stopped => "stopped",
            RunStatus::Exhausted => "exhausted",
        }
    }

    /// True for every status except `Active`.
    pub fn is_terminal(self) -> bool {
        self != RunStatus::Active
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = TraceError;

    fn from_str(s: &str) -> TraceResult<Self> {
        RunStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                TraceError::validation(
                    "status",
                    format!(
                        "'{}' is not one of active, success, failure, stopped, exhausted",
                        s
                    ),
                )
            })
    }
}

/// Metadata describing one execution run of an agent.
///
/// Construct with `RunMeta::new` and the `with_*` setters. Every other field
/// starts at its documented default: no tools, no seed, temperature 0.0,
/// status `Active`, no termination reason, zero steps, not truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    /// Caller-assigned, non-empty identifier for the run.
    pub run_id: String,
    /// Version label of the agent implementation producing this run.
    pub agent_version: String,
    /// Identifier of the language-model backend.
    pub llm: String,
    /// Creation time in fractional seconds since the Unix epoch.
    pub created_at: f64,
    /// Tools available to the agent, in insertion order.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Random seed, present only when deterministic sampling was requested.
    #[serde(default)]
    pub seed: Option<i64>,
    /// Sampling temperature. Never negative.
    #[serde(default)]
    pub temperature: f64,
    /// Lifecycle state of the run.
    #[serde(default)]
    pub status: RunStatus,
    /// Set when the run leaves `Active`.
    #[serde(default)]
    pub termination_reason: Option<String>,
    /// Number of steps recorded so far. Only ever increases.
    #[serde(default)]
    pub step_count: u64,
    /// True if the step history was truncated, e.g. by a storage limit.
    #[serde(default)]
    pub truncated: bool,
}

impl RunMeta {
    /// Create an active run with default settings.
    ///
    /// Fails with `TraceError::Validation` if `run_id` is empty or
    /// `created_at` is not a finite number.
    pub fn new(
        run_id: impl Into<String>,
        agent_version: impl Into<String>,
        llm: impl Into<String>,
        created_at: f64,
    ) -> TraceResult<Self> {
        let meta = Self {
            run_id: run_id.into(),
            agent_version: agent_version.into(),
            llm: llm.into(),
            created_at,
            tools: Vec::new(),
            seed: None,
            temperature: 0.0,
            status: RunStatus::Active,
            termination_reason: None,
            step_count: 0,
            truncated: false,
        };
        meta.validate()?;
        Ok(meta)
    }

    /// Generate a fresh run identifier for drivers that do not assign their own.
    pub fn generate_run_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Replace the tool list, preserving the given order.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Request deterministic sampling with `seed`.
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the sampling temperature. Negative and non-finite values are rejected.
    pub fn with_temperature(mut self, temperature: f64) -> TraceResult<Self> {
        check_temperature(temperature)?;
        self.temperature = temperature;
        Ok(self)
    }

    /// Move the run out of `Active` into a terminal status.
    ///
    /// Sets `termination_reason` to `reason`. Terminal statuses are terminal:
    /// any request made after the run has left `Active`, and any request to
    /// "transition" to `Active` itself, fails with
    /// `TraceError::InvalidTransition` and leaves the record untouched.
    pub fn transition(&mut self, to: RunStatus, reason: impl Into<String>) -> TraceResult<()> {
        if self.status.is_terminal() || !to.is_terminal() {
            return Err(TraceError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        let reason = reason.into();
        if reason.is_empty() {
            return Err(TraceError::validation(
                "termination_reason",
                "must not be empty when leaving 'active'",
            ));
        }

        self.status = to;
        self.termination_reason = Some(reason);
        Ok(())
    }

    /// True once the run has left `Active`.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check every record invariant.
    ///
    /// - `run_id` is non-empty
    /// - `created_at` is finite
    /// - `temperature` is finite and not negative
    /// - `termination_reason` is present, and non-empty, exactly when the
    ///   status is terminal
    pub fn validate(&self) -> TraceResult<()> {
        if self.run_id.is_empty() {
            return Err(TraceError::validation("run_id", "must not be empty"));
        }
        if !self.created_at.is_finite() {
            return Err(TraceError::validation(
                "created_at",
                format!("must be a finite timestamp, got {}", self.created_at),
            ));
        }
        check_temperature(self.temperature)?;

        match (self.status.is_terminal(), &self.termination_reason) {
            (true, None) => Err(TraceError::validation(
                "termination_reason",
                format!("required when status is '{}'", self.status),
            )),
            (true, Some(reason)) if reason.is_empty() => Err(TraceError::validation(
                "termination_reason",
                format!("must not be empty when status is '{}'", self.status),
            )),
            (false, Some(_)) => Err(TraceError::validation(
                "termination_reason",
                "must be absent while the run is active",
            )),
            _ => Ok(()),
        }
    }

    /// Encode as compact JSON.
    pub fn to_json(&self) -> TraceResult<String> {
        serde_json::to_string(self).map_err(|e| TraceError::Serialization {
            reason: format!("run meta: {}", e),
        })
    }

    /// Encode as indented JSON.
    pub fn to_json_pretty(&self) -> TraceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TraceError::Serialization {
            reason: format!("run meta: {}", e),
        })
    }

    /// Decode from JSON and validate. Missing optional fields take their defaults.
    pub fn from_json(s: &str) -> TraceResult<Self> {
        let meta: RunMeta =
            serde_json::from_str(s).map_err(|e| TraceError::from_json_error("run meta", e))?;
        meta.validate()?;
        Ok(meta)
    }
}

fn check_temperature(temperature: f64) -> TraceResult<()> {
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(TraceError::validation(
            "temperature",
            format!("must be a finite value >= 0, got {}", temperature),
        ));
    }
    Ok(())
}
