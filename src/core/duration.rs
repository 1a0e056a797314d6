//! Task duration normalisation
//!
//! Durations reach us in several encodings: raw minutes (`"90"`), the stored
//! form (`"90 minutes"`), interval text (`"01:30:00"`, `"1 day 02:00:00"`),
//! ISO-8601 (`"PT1H30M"`) and free text (`"done in 45 minutes"`). Everything is
//! reduced to a whole, non-negative number of minutes.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::LazyLock;

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)\s+days?\s+)?(\d+):(\d{1,2})(?::\d{1,2}(?:\.\d+)?)?$")
        .expect("clock pattern is valid")
});

static ISO_8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:\d+(?:\.\d+)?S)?)?$")
        .expect("ISO-8601 pattern is valid")
});

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?)(\d+)").expect("number pattern is valid"));

/// The shapes a duration string can take, checked in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DurationShape {
    Iso8601,
    Clock,
    Minutes,
    FreeText,
}

fn classify(raw: &str) -> DurationShape {
    if raw.starts_with('P') || raw.starts_with('p') {
        DurationShape::Iso8601
    } else if raw.contains(':') {
        DurationShape::Clock
    } else if raw.parse::<i64>().is_ok() {
        DurationShape::Minutes
    } else {
        DurationShape::FreeText
    }
}

/// Normalise a duration string to whole minutes.
///
/// Returns `None` for empty input, negative values and text with no number in it.
pub fn normalize_duration(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match classify(raw) {
        DurationShape::Iso8601 => parse_iso_8601(raw).or_else(|| parse_free_text(raw)),
        DurationShape::Clock => parse_clock(raw).or_else(|| parse_free_text(raw)),
        DurationShape::Minutes => raw.parse::<u32>().ok(),
        DurationShape::FreeText => parse_free_text(raw),
    }
}

/// Normalise a JSON duration value (number, string or null) to whole minutes.
pub fn normalize_duration_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(minutes) = n.as_u64() {
                u32::try_from(minutes).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u32::MAX as f64)
                    .map(|f| f.trunc() as u32)
            }
        }
        Value::String(s) => normalize_duration(s),
        _ => None,
    }
}

/// Serde adapter for the `duration` column.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(normalize_duration_value))
}

fn parse_iso_8601(raw: &str) -> Option<u32> {
    let upper = raw.to_ascii_uppercase();
    let caps = ISO_8601.captures(&upper)?;
    let part = |idx: usize| -> Option<u32> {
        caps.get(idx)
            .map(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(Some(0))
    };

    let days = part(1)?;
    let hours = part(2)?;
    let minutes = part(3)?;
    days.checked_mul(24 * 60)?
        .checked_add(hours.checked_mul(60)?)?
        .checked_add(minutes)
}

fn parse_clock(raw: &str) -> Option<u32> {
    let caps = CLOCK.captures(raw)?;
    let days: u32 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let hours: u32 = caps.get(2)?.as_str().parse().ok()?;
    let minutes: u32 = caps.get(3)?.as_str().parse().ok()?;
    days.checked_mul(24 * 60)?
        .checked_add(hours.checked_mul(60)?)?
        .checked_add(minutes)
}

fn parse_free_text(raw: &str) -> Option<u32> {
    let caps = FIRST_NUMBER.captures(raw)?;
    // A leading minus sign right before the number marks a negative duration
    if !caps.get(1).map(|m| m.as_str().is_empty()).unwrap_or(true) {
        return None;
    }
    caps.get(2)?.as_str().parse().ok()
}
