use chrono::{DateTime, Utc};

/// Source of "now" in unix seconds. Swapped for a fixed value in tests.
pub type Clock = fn() -> i64;

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

/// Human readable rendering of a unix timestamp for logs.
pub fn format_unix_ts(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
