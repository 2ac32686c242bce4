//! Wall-clock helper for record timestamps.

use chrono::Utc;

/// Current time in fractional seconds since the Unix epoch, microsecond precision.
pub fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
