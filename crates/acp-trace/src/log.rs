//! Exported trace type.
//!
//! `TraceLog` pairs a run's metadata with the steps a sink retained for it.
//! It is the unit handed to storage or transmission collaborators, and the
//! unit the demo CLI writes and reads back.

use serde::{Deserialize, Serialize};

use acp_contracts::{
    error::{TraceError, TraceResult},
    run::RunMeta,
    step::AgentStep,
};

/// One run and its retained steps, in ascending `step_id` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceLog {
    /// The run's metadata.
    pub meta: RunMeta,
    /// Steps the sink retained, oldest first.
    #[serde(default)]
    pub steps: Vec<AgentStep>,
}

impl TraceLog {
    /// Pair `meta` with its retained `steps`. Call `validate()` to check them.
    pub fn new(meta: RunMeta, steps: Vec<AgentStep>) -> Self {
        Self { meta, steps }
    }

    /// Check the run metadata and the step sequence against each other.
    ///
    /// - `meta` passes `RunMeta::validate`
    /// - every step passes `AgentStep::validate`
    /// - `step_id`s are strictly ascending, hence unique
    /// - `meta.step_count` is at least the number of retained steps
    /// - fewer retained steps than `step_count` only when `meta.truncated`
    pub fn validate(&self) -> TraceResult<()> {
        self.meta.validate()?;

        let mut previous: Option<u64> = None;
        for step in &self.steps {
            step.validate()?;
            if let Some(prev) = previous {
                if step.step_id() <= prev {
                    return Err(TraceError::validation(
                        "step_id",
                        format!(
                            "step {} follows step {}; ids must be unique and ascending",
                            step.step_id(),
                            prev
                        ),
                    ));
                }
            }
            previous = Some(step.step_id());
        }

        let retained = self.steps.len() as u64;
        if self.meta.step_count < retained {
            return Err(TraceError::validation(
                "step_count",
                format!(
                    "run reports {} steps but the log holds {}",
                    self.meta.step_count, retained
                ),
            ));
        }
        if self.meta.step_count > retained && !self.meta.truncated {
            return Err(TraceError::validation(
                "truncated",
                format!(
                    "log holds {} of {} steps but the run is not marked truncated",
                    retained, self.meta.step_count
                ),
            ));
        }

        Ok(())
    }

    /// Encode as indented JSON.
    pub fn to_json_pretty(&self) -> TraceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TraceError::Serialization {
            reason: format!("trace log: {}", e),
        })
    }

    /// Decode from JSON and validate.
    pub fn from_json(s: &str) -> TraceResult<Self> {
        let log: TraceLog =
            serde_json::from_str(s).map_err(|e| TraceError::from_json_error("trace log", e))?;
        log.validate()?;
        Ok(log)
    }
}
