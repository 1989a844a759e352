//! Time and timestamp utilities

use std::fmt::Write;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use chrono::Utc;

/// Milliseconds in one day, the unit of the `rotationTime` option
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format the current UTC time with a strftime-style pattern
///
/// Returns `None` if the pattern contains an invalid specifier.
pub fn format_utc(format: &str) -> Option<String> {
    let mut formatted = String::new();
    write!(formatted, "{}", Utc::now().format(format)).ok()?;
    Some(formatted)
}

/// Check that a strftime-style pattern contains no invalid specifiers
pub fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Convert a fractional number of days into a duration
///
/// Returns `None` for values that are not finite, not positive, or round
/// down to zero milliseconds.
pub fn days_to_duration(days: f64) -> Option<Duration> {
    if !days.is_finite() || days <= 0.0 {
        return None;
    }

    let millis = (days * MILLIS_PER_DAY).round();
    if millis < 1.0 || millis > u64::MAX as f64 {
        return None;
    }

    Some(Duration::from_millis(millis as u64))
}
