//! Wall-clock helpers shared by the PCB and the HTTP layer.
//!
//! `spec.md` stores timestamps as raw Unix seconds internally but renders
//! them as ISO-8601 on the wire (`RunInfo`, `ProcessStats`); these two
//! helpers are the single place that conversion happens.

use chrono::{TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix timestamp in seconds, used for `start_time`/`end_time`.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs()
}

/// Renders a Unix timestamp (seconds) as ISO-8601 UTC, e.g.
/// `2026-07-28T14:05:00+00:00`.
pub fn to_iso8601(timestamp: u64) -> String {
    match Utc.timestamp_opt(timestamp as i64, 0).single() {
        Some(dt) => dt.to_rfc3339(),
        None => String::from("invalid-timestamp"),
    }
}
