//! Error types for trace records and the recording pipeline.
//!
//! All fallible operations across the ACP trace crates return `TraceResult<T>`.

use thiserror::Error;

/// The unified error type for ACP trace records.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A field violated its documented constraint at construction or decode time.
    #[error("validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A status change was requested out of a terminal run status.
    #[error("invalid run status transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// A step was offered to a run that has already terminated.
    #[error("run '{run_id}' is closed and accepts no further steps")]
    RunClosed { run_id: String },

    /// Structured text could not be encoded or parsed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A recorder configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A trace sink could not persist a record.
    #[error("trace sink write failed: {reason}")]
    SinkWriteFailed { reason: String },
}

impl TraceError {
    /// Shorthand for a `Validation` error on `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Classify a serde_json failure.
    ///
    /// Data errors (wrong type, unknown enum string, out-of-range integer)
    /// mean the text was well-formed but described an invalid record, so
    /// they surface as `Validation`. Everything else is `Serialization`.
    pub fn from_json_error(record: &str, err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Data => Self::Validation {
                field: record.to_string(),
                reason: err.to_string(),
            },
            _ => Self::Serialization {
                reason: format!("{}: {}", record, err),
            },
        }
    }
}

/// Convenience alias used throughout the ACP trace crates.
pub type TraceResult<T> = Result<T, TraceError>;
