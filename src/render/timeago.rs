//! Relative "time ago" phrases for epoch timestamps.
//!
//! Used by the time-range renderer and the raw object listing. Phrases are
//! coarse on purpose: the largest whole unit wins, no compound output.

/// Unit table, largest first. Month is 30 days and year is 365 days, matching
/// the age-filter units in [`crate::query`].
const UNITS: &[(i64, &str)] = &[
    (365 * 86_400, "year"),
    (30 * 86_400, "month"),
    (7 * 86_400, "week"),
    (86_400, "day"),
    (3_600, "hour"),
    (60, "minute"),
    (1, "second"),
];

/// Render `then` relative to `now` (both epoch seconds).
///
/// Timestamps in the future (clock skew between client and backend) are
/// clamped to "just now".
pub fn ago(now: i64, then: i64) -> String {
    let diff = now - then;
    if diff < 1 {
        return "just now".to_string();
    }

    for &(secs, name) in UNITS {
        if diff >= secs {
            let n = diff / secs;
            let plural = if n == 1 { "" } else { "s" };
            return format!("{n} {name}{plural} ago");
        }
    }

    "just now".to_string()
}
