//! Relative time arguments.
//!
//! Tools take their time range as `"now"` or a duration back from now
//! (`"1h"`, `"30m"`, `"1h30m"`, `"1.5h"`, `"500ms"`).

use crate::error::ToolError;
use chrono::{DateTime, Duration, Utc};

/// Unit suffix to nanoseconds multiplier (longer suffixes first).
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1_000.0),
    ("µs", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Resolve a time argument against the current instant.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, ToolError> {
    parse_time_at(s, Utc::now())
}

/// Resolve a time argument against `now`.
pub fn parse_time_at(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ToolError> {
    let trimmed = s.trim();
    if trimmed == "now" {
        return Ok(now);
    }
    let duration =
        parse_duration(trimmed).ok_or_else(|| ToolError::InvalidTimeFormat(s.to_string()))?;
    Ok(now - duration)
}

/// Parse a duration made of one or more `<number><unit>` segments.
///
/// Returns `None` for anything that is not a well-formed, non-negative duration.
pub fn parse_duration(s: &str) -> Option<Duration> {
    if s.is_empty() {
        return None;
    }

    let mut rest = s;
    let mut total_nanos = 0f64;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let (suffix, multiplier) = UNITS
            .iter()
            .filter(|(suffix, _)| rest.starts_with(suffix))
            .max_by_key(|(suffix, _)| suffix.len())?;
        total_nanos += value * multiplier;
        rest = &rest[suffix.len()..];
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return None;
    }
    Some(Duration::nanoseconds(total_nanos.round() as i64))
}
