//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Prefix a job log message with its wall-clock time (`[HH:MM:SS] msg`)
pub fn stamp_log_line(at: DateTime<Utc>, message: &str) -> String {
    format!("[{}] {}", at.format("%H:%M:%S"), message)
}
