//! In-memory implementation of `TraceSink`.
//!
//! `InMemoryTraceSink` keeps every step it receives in a `Vec` behind an
//! `Arc<Mutex<_>>`. Clones share the same store, so a caller can hand one
//! clone to a `RunRecorder` and keep another to export the trace afterwards.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use acp_contracts::{
    error::{TraceError, TraceResult},
    run::RunMeta,
    step::AgentStep,
};

use crate::{log::TraceLog, traits::TraceSink};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    /// Steps written so far, in append order.
    pub(crate) steps: Vec<AgentStep>,

    /// The terminal run metadata, once `finalize()` has been called.
    pub(crate) finalized: Option<RunMeta>,
}

// ── Public sink ───────────────────────────────────────────────────────────────

/// An append-only, in-memory sink for a single run.
#[derive(Clone)]
pub struct InMemoryTraceSink {
    run_id: String,
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryTraceSink {
    /// Create an empty sink that accepts steps for `run_id` only.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            state: Arc::new(Mutex::new(InMemoryState {
                steps: Vec::new(),
                finalized: None,
            })),
        }
    }

    /// The run this sink accepts steps for.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Snapshot of every step written so far.
    pub fn steps(&self) -> TraceResult<Vec<AgentStep>> {
        Ok(self.lock()?.steps.clone())
    }

    /// True once `finalize()` has stored the terminal run metadata.
    pub fn is_finalized(&self) -> TraceResult<bool> {
        Ok(self.lock()?.finalized.is_some())
    }

    /// Export the finalized trace, or `None` while the run is still open.
    pub fn finalized_log(&self) -> TraceResult<Option<TraceLog>> {
        let state = self.lock()?;
        Ok(state
            .finalized
            .as_ref()
            .map(|meta| TraceLog::new(meta.clone(), state.steps.clone())))
    }

    /// Export the steps written so far paired with a caller-supplied `meta`.
    ///
    /// Useful for snapshots of a run that has not finished yet.
    pub fn export_log(&self, meta: &RunMeta) -> TraceResult<TraceLog> {
        let state = self.lock()?;
        Ok(TraceLog::new(meta.clone(), state.steps.clone()))
    }

    fn lock(&self) -> TraceResult<MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| TraceError::SinkWriteFailed {
            reason: format!("trace sink lock poisoned: {}", e),
        })
    }

    fn check_run(&self, run_id: &str) -> TraceResult<()> {
        if run_id != self.run_id {
            return Err(TraceError::SinkWriteFailed {
                reason: format!(
                    "sink for run '{}' received data for run '{}'",
                    self.run_id, run_id
                ),
            });
        }
        Ok(())
    }
}

// ── TraceSink impl ────────────────────────────────────────────────────────────

impl TraceSink for InMemoryTraceSink {
    fn write_step(&self, run_id: &str, step: &AgentStep) -> TraceResult<()> {
        self.check_run(run_id)?;
        let mut state = self.lock()?;

        if state.finalized.is_some() {
            return Err(TraceError::RunClosed {
                run_id: run_id.to_string(),
            });
        }

        state.steps.push(step.clone());

        debug!(
            run_id = %run_id,
            step_id = step.step_id(),
            phase = %step.phase(),
            status = %step.status(),
            "step appended to in-memory sink"
        );

        Ok(())
    }

    /// Store the terminal metadata. A second call for the same run is rejected.
    fn finalize(&self, meta: &RunMeta) -> TraceResult<()> {
        self.check_run(&meta.run_id)?;
        let mut state = self.lock()?;

        if state.finalized.is_some() {
            return Err(TraceError::RunClosed {
                run_id: meta.run_id.clone(),
            });
        }
        state.finalized = Some(meta.clone());

        info!(
            run_id = %meta.run_id,
            status = %meta.status,
            step_count = meta.step_count,
            retained = state.steps.len(),
            truncated = meta.truncated,
            "trace finalized"
        );

        Ok(())
    }
}
