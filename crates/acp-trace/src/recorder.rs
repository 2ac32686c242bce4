//! The run recorder: single writer for one run's trace.
//!
//! A `RunRecorder` owns the run's `RunMeta` behind a mutex, so every update
//! to the counters and the status goes through one place. It enforces the
//! step ordering rules on the way in:
//!
//!   closed? → step_id ≥ base → step_id > previous → limit → sink → counters
//!
//! It never executes anything. The agent loop builds the steps and decides
//! when the run ends; the recorder only keeps the record consistent.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use acp_contracts::{
    error::{TraceError, TraceResult},
    run::{RunMeta, RunStatus},
    step::AgentStep,
};

use crate::{config::RecorderConfig, traits::TraceSink};

struct RecorderState {
    meta: RunMeta,
    /// `step_id` of the last accepted step, retained or not.
    last_step_id: Option<u64>,
    /// Number of steps handed to the sink.
    retained: usize,
}

/// Records the steps of a single run into a `TraceSink`.
pub struct RunRecorder {
    config: RecorderConfig,
    sink: Box<dyn TraceSink>,
    state: Mutex<RecorderState>,
}

impl RunRecorder {
    /// Start recording `meta`.
    ///
    /// Fails with `TraceError::Validation` if `meta` is invalid and with
    /// `TraceError::RunClosed` if it has already left `Active`.
    pub fn new(
        meta: RunMeta,
        sink: Box<dyn TraceSink>,
        config: RecorderConfig,
    ) -> TraceResult<Self> {
        meta.validate()?;
        if meta.is_finished() {
            return Err(TraceError::RunClosed {
                run_id: meta.run_id.clone(),
            });
        }

        info!(
            run_id = %meta.run_id,
            agent_version = %meta.agent_version,
            llm = %meta.llm,
            tools = meta.tools.len(),
            max_steps = ?config.max_steps,
            "run recording started"
        );

        Ok(Self {
            config,
            sink,
            state: Mutex::new(RecorderState {
                meta,
                last_step_id: None,
                retained: 0,
            }),
        })
    }

    /// Append one step to the run.
    ///
    /// # Errors
    ///
    /// - `RunClosed` once the run has left `Active`
    /// - `Validation` if `step_id` is below `step_id_base` or not strictly
    ///   greater than the previous step's id
    /// - whatever the sink returns; on sink failure the counters are left
    ///   unchanged so the caller may retry the same step
    ///
    /// When `max_steps` steps have already been handed to the sink, the step
    /// is counted but dropped and the run is marked truncated.
    pub fn record(&self, step: AgentStep) -> TraceResult<()> {
        let mut state = self.lock()?;

        if state.meta.is_finished() {
            return Err(TraceError::RunClosed {
                run_id: state.meta.run_id.clone(),
            });
        }

        let step_id = step.step_id();
        if step_id < self.config.step_id_base {
            return Err(TraceError::validation(
                "step_id",
                format!(
                    "step {} is below the configured base {}",
                    step_id, self.config.step_id_base
                ),
            ));
        }
        if let Some(last) = state.last_step_id {
            if step_id <= last {
                return Err(TraceError::validation(
                    "step_id",
                    format!(
                        "step {} does not follow step {}; ids must be unique and ascending",
                        step_id, last
                    ),
                ));
            }
        }

        let at_limit = self
            .config
            .max_steps
            .is_some_and(|max| state.retained >= max);

        if at_limit {
            if !state.meta.truncated {
                warn!(
                    run_id = %state.meta.run_id,
                    step_id,
                    max_steps = ?self.config.max_steps,
                    "step limit reached; further steps are counted but not retained"
                );
            }
            state.meta.truncated = true;
        } else {
            self.sink.write_step(&state.meta.run_id, &step)?;
            state.retained += 1;
        }

        state.last_step_id = Some(step_id);
        state.meta.step_count += 1;

        debug!(
            run_id = %state.meta.run_id,
            step_id,
            phase = %step.phase(),
            status = %step.status(),
            step_count = state.meta.step_count,
            retained = !at_limit,
            "step recorded"
        );

        Ok(())
    }

    /// End the run with a terminal `status` and hand the metadata to the sink.
    ///
    /// The status change is only committed once the sink accepts it. Returns
    /// the final metadata.
    pub fn finish(&self, status: RunStatus, reason: impl Into<String>) -> TraceResult<RunMeta> {
        let mut state = self.lock()?;

        let mut finished = state.meta.clone();
        finished.transition(status, reason)?;
        self.sink.finalize(&finished)?;
        state.meta = finished.clone();

        info!(
            run_id = %finished.run_id,
            status = %finished.status,
            reason = finished.termination_reason.as_deref().unwrap_or_default(),
            step_count = finished.step_count,
            truncated = finished.truncated,
            "run recording finished"
        );

        Ok(finished)
    }

    /// Snapshot of the current run metadata.
    pub fn meta(&self) -> TraceResult<RunMeta> {
        Ok(self.lock()?.meta.clone())
    }

    /// The smallest `step_id` the next call to `record()` will accept.
    ///
    /// Fails with `TraceError::Validation` once a step with id `u64::MAX`
    /// has been accepted, since no id can follow it.
    pub fn next_step_id(&self) -> TraceResult<u64> {
        let state = self.lock()?;
        match state.last_step_id {
            None => Ok(self.config.step_id_base),
            Some(last) => last.checked_add(1).ok_or_else(|| {
                TraceError::validation(
                    "step_id",
                    format!("step {} is the largest id; no step can follow it", last),
                )
            }),
        }
    }

    fn lock(&self) -> TraceResult<MutexGuard<'_, RecorderState>> {
        self.state.lock().map_err(|e| TraceError::SinkWriteFailed {
            reason: format!("recorder state lock poisoned: {}", e),
        })
    }
}
