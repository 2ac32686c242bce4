//! # acp-trace
//!
//! Recording side of ACP agent traces.
//!
//! ## Overview
//!
//! A `RunRecorder` is the single writer for one run: it owns the run's
//! `RunMeta`, accepts `AgentStep`s in ascending `step_id` order, keeps
//! `step_count` and `truncated` up to date and forwards retained steps to a
//! `TraceSink`. `InMemoryTraceSink` is the reference sink; its exported
//! `TraceLog` is the structured-text form of a finished run.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use acp_trace::{InMemoryTraceSink, RecorderConfig, RunRecorder};
//!
//! let sink = InMemoryTraceSink::new("run-001");
//! let recorder = RunRecorder::new(meta, Box::new(sink.clone()), RecorderConfig::default())?;
//! recorder.record(step)?;
//! recorder.finish(RunStatus::Success, "answer delivered")?;
//!
//! let log = sink.finalized_log()?.expect("run finished");
//! println!("{}", log.to_json_pretty()?);
//! ```

pub mod address;
pub mod config;
pub mod log;
pub mod memory;
pub mod recorder;
pub mod traits;

pub use address::{content_address, is_content_address};
pub use config::RecorderConfig;
pub use log::TraceLog;
pub use memory::InMemoryTraceSink;
pub use recorder::RunRecorder;
pub use traits::TraceSink;

// ── Tests ─────────────────────────────────────────────────────────────────────
