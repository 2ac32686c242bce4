//! Sink trait for recorded trace data.
//!
//! A `TraceSink` is the consumer side of a run: the recorder hands it every
//! retained step and, once the run terminates, the final run metadata.
//! What the sink does with them (keep in memory, ship, store) is its own
//! business.

use acp_contracts::{error::TraceResult, run::RunMeta, step::AgentStep};

/// Append-only consumer of recorded steps.
pub trait TraceSink: Send + Sync {
    /// Append one step for the run identified by `run_id`.
    ///
    /// Steps arrive in ascending `step_id` order and are never modified or
    /// deleted afterwards.
    fn write_step(&self, run_id: &str, step: &AgentStep) -> TraceResult<()>;

    /// Receive the terminal run metadata.
    ///
    /// Called exactly once per run, after the run has left `Active`.
    fn finalize(&self, meta: &RunMeta) -> TraceResult<()>;
}
