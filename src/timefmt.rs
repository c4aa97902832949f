//! Fixed-offset time formatting.
//!
//! All displayed times are Indian Standard Time (UTC+05:30), independent
//! of the host timezone.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

/// IST offset from UTC in seconds.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Rendered for epochs chrono cannot represent.
pub const INVALID_DATE: &str = "Invalid Date";

fn ist() -> FixedOffset {
    // 19800s is inside the ±86400s range east_opt accepts
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn to_ist(epoch_ms: i64) -> Option<DateTime<FixedOffset>> {
    ist().timestamp_millis_opt(epoch_ms).single()
}

/// Format an epoch-millisecond timestamp as `H:MM:SS AM|PM` in IST.
///
/// Hour `0` renders as `12`.
#[must_use]
pub fn format_ist(epoch_ms: i64) -> String {
    to_ist(epoch_ms).map_or_else(
        || INVALID_DATE.to_string(),
        |t| t.format("%-I:%M:%S %p").to_string(),
    )
}

/// Format an epoch-millisecond timestamp with its calendar date, in IST.
#[must_use]
pub fn format_ist_datetime(epoch_ms: i64) -> String {
    to_ist(epoch_ms).map_or_else(
        || INVALID_DATE.to_string(),
        |t| t.format("%Y-%m-%d %-I:%M:%S %p IST").to_string(),
    )
}

/// Format the current wall clock in IST.
#[must_use]
pub fn now_ist() -> String {
    format_ist(Utc::now().timestamp_millis())
}
