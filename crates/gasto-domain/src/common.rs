//! Shared identifiers and the lenient numeric/date coercion rules used by stored records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};

/// Identifier of the authenticated user owning a set of expenses and settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns `value` when finite, otherwise `0.0`.
pub fn coerce_amount(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Parses the leading numeric portion of `raw` (optional sign, digits, one decimal point).
///
/// Used for loosely-typed stored settings: `"1500abc"` yields `1500.0`,
/// `"abc"` yields `None`.
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    trimmed[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parses an ISO calendar date, accepting a trailing time component (`2024-05-01T10:00:00Z`).
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Any stored value where a string is expected; everything else is kept as a marker.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawText {
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Number(f64),
    Flag(bool),
    Other(IgnoredAny),
}

impl RawText {
    pub(crate) fn into_text(self) -> Option<String> {
        match self {
            RawText::Text(text) => Some(text),
            RawText::Other(_) => None,
        }
    }
}

/// Decodes any stored amount into a finite number; non-numeric input becomes `0.0`.
pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    let value = match raw {
        Some(RawNumber::Number(value)) => coerce_amount(value),
        Some(RawNumber::Text(text)) => parse_leading_number(&text).unwrap_or(0.0),
        Some(RawNumber::Other(_)) | None => 0.0,
    };
    Ok(value)
}

/// Decodes a stored setting; negatives are treated like unparsable values.
pub(crate) fn lenient_setting<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_amount(deserializer).map(|value| value.max(0.0))
}

/// Decodes a stored date; malformed values become `None` instead of failing the record.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawText>::deserialize(deserializer)?;
    Ok(raw
        .and_then(RawText::into_text)
        .and_then(|text| parse_calendar_date(&text)))
}

/// Decodes free text; a stored number or boolean keeps its JSON rendering, anything else is empty.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawScalar>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawScalar::Text(text)) => text,
        Some(RawScalar::Number(value)) => value.to_string(),
        Some(RawScalar::Flag(flag)) => flag.to_string(),
        Some(RawScalar::Other(_)) | None => String::new(),
    })
}

/// Decodes an RFC 3339 timestamp, falling back to the current instant.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawText>::deserialize(deserializer)?;
    Ok(raw
        .and_then(RawText::into_text)
        .and_then(|text| DateTime::parse_from_rfc3339(text.trim()).ok())
        .map(|stamp| stamp.with_timezone(&Utc))
        .unwrap_or_else(Utc::now))
}
