//! Display helpers for counts, durations and ages.

use jiff::Timestamp;

/// Abbreviates large counts: `999`, `1.2K`, `3.4M`.
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Formats a length in seconds as `m:ss`. Minutes are not rolled over into hours.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Describes how long ago `then` was, in whole days relative to `now`.
///
/// Timestamps in the future count as today.
pub fn format_time_ago(then: Timestamp, now: Timestamp) -> String {
    let days = now.duration_since(then).as_secs().max(0) / 86_400;
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..7 => format!("{days} days ago"),
        7..30 => format!("{} weeks ago", days / 7),
        _ => format!("{} months ago", days / 30),
    }
}
