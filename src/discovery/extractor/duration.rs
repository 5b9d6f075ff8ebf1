//! Duration parsing for the many ways minters write track length.
//!
//! Supported, in order of preference:
//! - plain seconds: `"247"`, or decimal seconds rounded: `"225.5"`
//! - `HH:MM:SS`: `"01:03:45"`
//! - `MM:SS`: `"03:45"`
//! - spelled out: `"3m 45s"`, `"3 min 45 sec"`, `"3 minutes 45 seconds"`
//! - last resort: the first two integers in the string as minutes, seconds
//!
//! Nothing here fails; callers get `None` (or the default) for garbage.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Duration used when nothing usable is found (3 minutes)
pub const DEFAULT_DURATION_SECS: u32 = 180;

static HOURS_MINUTES_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+):(\d{1,2}):(\d{1,2})").unwrap());

static MINUTES_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+):(\d{1,2})").unwrap());

static SPELLED_OUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:minutes?|mins?|m)\s*(\d+)\s*(?:seconds?|secs?|s)?").unwrap()
});

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Parse a duration string, falling back to [`DEFAULT_DURATION_SECS`].
pub fn parse_duration(input: &str) -> u32 {
    try_parse_duration(input).unwrap_or(DEFAULT_DURATION_SECS)
}

/// Parse a duration string; `None` when no supported shape matches.
pub fn try_parse_duration(input: &str) -> Option<u32> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.bytes().all(|b| b.is_ascii_digit()) {
        return input.parse().ok();
    }

    if input.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && let Ok(secs) = input.parse::<f64>()
    {
        return seconds_from_f64(secs);
    }

    if let Some(caps) = HOURS_MINUTES_SECONDS.captures(input) {
        return combine(&[caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str()]);
    }

    if let Some(caps) = MINUTES_SECONDS.captures(input) {
        return combine(&[caps.get(1)?.as_str(), caps.get(2)?.as_str()]);
    }

    if let Some(caps) = SPELLED_OUT.captures(input) {
        return combine(&[caps.get(1)?.as_str(), caps.get(2)?.as_str()]);
    }

    let numbers: Vec<&str> = INTEGER.find_iter(input).take(2).map(|m| m.as_str()).collect();
    if numbers.len() == 2 {
        return combine(&numbers);
    }

    None
}

/// Duration from a JSON value: positive numbers are seconds, strings are parsed.
pub fn duration_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().and_then(seconds_from_f64),
        Value::String(s) => try_parse_duration(s),
        _ => None,
    }
}

/// Positive, finite seconds rounded to whole seconds
pub fn seconds_from_f64(secs: f64) -> Option<u32> {
    if secs.is_finite() && secs >= 0.5 && secs <= u32::MAX as f64 {
        Some(secs.round() as u32)
    } else {
        None
    }
}

/// Fold `[.., hours, minutes, seconds]` components into seconds.
fn combine(parts: &[&str]) -> Option<u32> {
    parts.iter().try_fold(0u32, |acc, part| {
        let value: u32 = part.parse().ok()?;
        acc.checked_mul(60)?.checked_add(value)
    })
}
