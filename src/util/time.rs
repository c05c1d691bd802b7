//! Timestamp formatting for run directories and log entries.

use chrono::{DateTime, Local};

/// Format used in run directory names (`test_run_20250115_093000`).
pub const RUN_DIR_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Format used inside log files.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stamp for a run directory name.
#[must_use]
pub fn run_dir_stamp(at: &DateTime<Local>) -> String {
    at.format(RUN_DIR_FORMAT).to_string()
}

/// Human-readable log timestamp.
#[must_use]
pub fn log_timestamp(at: &DateTime<Local>) -> String {
    at.format(LOG_TIMESTAMP_FORMAT).to_string()
}

/// Current local time as a log timestamp.
#[must_use]
pub fn now_log_timestamp() -> String {
    log_timestamp(&Local::now())
}
