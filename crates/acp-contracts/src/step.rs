//! Per-step trace records.
//!
//! An `AgentStep` is created once per discrete agent action and never
//! changes afterwards. Its fields are private; downstream consumers
//! (loggers, replay tools, analyzers) only read it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TraceError, TraceResult};

/// Opaque step payload: string keys mapped to arbitrary JSON values.
///
/// No schema is imposed; the structure depends on the step's phase and is
/// owned by whoever produced the step.
pub type Payload = Map<String, Value>;

/// Which stage of the agent loop a step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPhase {
    Reason,
    Tool,
    Observe,
    Memory,
    Retry,
    Terminate,
}

impl StepPhase {
    /// All phases, in declaration order.
    pub const ALL: [StepPhase; 6] = [
        StepPhase::Reason,
        StepPhase::Tool,
        StepPhase::Observe,
        StepPhase::Memory,
        StepPhase::Retry,
        StepPhase::Terminate,
    ];

    /// The wire name of this phase.
    pub fn as_str(self) -> &'static str {
        match self {
            StepPhase::Reason => "reason",
            StepPhase::Tool => "tool",
            StepPhase::Observe => "observe",
            StepPhase::Memory => "memory",
            StepPhase::Retry => "retry",
            StepPhase::Terminate => "terminate",
        }
    }
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StepPhase {
    type Err = TraceError;

    fn from_str(s: &str) -> TraceResult<Self> {
        StepPhase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| {
                TraceError::validation(
                    "phase",
                    format!(
                        "'{}' is not one of reason, tool, observe, memory, retry, terminate",
                        s
                    ),
                )
            })
    }
}

/// Outcome of a single step.
///
/// `Retry` means the agent loop will follow this step with another one that
/// continues the same logical action. That policy lives in the loop, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Ok,
    Error,
    Retry,
}

impl StepStatus {
    /// All step statuses, in declaration order.
    pub const ALL: [StepStatus; 3] = [StepStatus::Ok, StepStatus::Error, StepStatus::Retry];

    /// The wire name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Ok => "ok",
            StepStatus::Error => "error",
            StepStatus::Retry => "retry",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = TraceError;

    fn from_str(s: &str) -> TraceResult<Self> {
        StepStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                TraceError::validation(
                    "status",
                    format!("'{}' is not one of ok, error, retry", s),
                )
            })
    }
}

/// One atomic unit of agent activity within a run.
///
/// Build with `AgentStep::new` plus the consuming `with_*` setters; once
/// built the step is read-only and safe to share across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    step_id: u64,
    timestamp: f64,
    phase: StepPhase,
    input: Payload,
    output: Payload,
    #[serde(default)]
    status: StepStatus,
    #[serde(default)]
    state_ref: Option<String>,
    #[serde(default)]
    diff_ref: Option<String>,
}

impl AgentStep {
    /// Create a step with status `Ok` and no state or diff references.
    ///
    /// Fails with `TraceError::Validation` if `timestamp` is not finite.
    pub fn new(
        step_id: u64,
        timestamp: f64,
        phase: StepPhase,
        input: Payload,
        output: Payload,
    ) -> TraceResult<Self> {
        let step = Self {
            step_id,
            timestamp,
            phase,
            input,
            output,
            status: StepStatus::Ok,
            state_ref: None,
            diff_ref: None,
        };
        step.validate()?;
        Ok(step)
    }

    /// Record the outcome of the step. Defaults to `Ok`.
    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach a handle to an external snapshot of agent state after this step.
    pub fn with_state_ref(mut self, state_ref: impl Into<String>) -> Self {
        self.state_ref = Some(state_ref.into());
        self
    }

    /// Attach a handle to an external delta artifact for this step.
    pub fn with_diff_ref(mut self, diff_ref: impl Into<String>) -> Self {
        self.diff_ref = Some(diff_ref.into());
        self
    }

    /// Sequence number of the step within its run.
    pub fn step_id(&self) -> u64 {
        self.step_id
    }

    /// Time the step was recorded, in fractional epoch seconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Agent-loop stage this step represents.
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Opaque input payload.
    pub fn input(&self) -> &Payload {
        &self.input
    }

    /// Opaque output payload.
    pub fn output(&self) -> &Payload {
        &self.output
    }

    /// Outcome of the step.
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Handle to the state snapshot taken after this step, if captured.
    pub fn state_ref(&self) -> Option<&str> {
        self.state_ref.as_deref()
    }

    /// Handle to the delta artifact for this step, if captured.
    pub fn diff_ref(&self) -> Option<&str> {
        self.diff_ref.as_deref()
    }

    /// Check the record invariants that the type system does not already cover.
    pub fn validate(&self) -> TraceResult<()> {
        if !self.timestamp.is_finite() {
            return Err(TraceError::validation(
                "timestamp",
                format!("must be a finite timestamp, got {}", self.timestamp),
            ));
        }
        Ok(())
    }

    /// Encode as compact JSON.
    pub fn to_json(&self) -> TraceResult<String> {
        serde_json::to_string(self).map_err(|e| TraceError::Serialization {
            reason: format!("agent step: {}", e),
        })
    }

    /// Encode as indented JSON.
    pub fn to_json_pretty(&self) -> TraceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TraceError::Serialization {
            reason: format!("agent step: {}", e),
        })
    }

    /// Decode from JSON and validate.
    ///
    /// A negative `step_id` or an unknown `phase`/`status` string is a
    /// `TraceError::Validation`.
    pub fn from_json(s: &str) -> TraceResult<Self> {
        let step: AgentStep =
            serde_json::from_str(s).map_err(|e| TraceError::from_json_error("agent step", e))?;
        step.validate()?;
        Ok(step)
    }
}
