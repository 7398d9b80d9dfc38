//! Keyword value normalization: comparison operator and literal coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Comparison operator of a filter term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FilterValue {
    /// A number, kept in the exact form the user typed it.
    Number(String),
    /// An ISO-8601 date or date-time as epoch milliseconds (UTC).
    Timestamp(i64),
    /// Anything else.
    Text(String),
}

/// Operator and value extracted from a raw keyword value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedValue {
    pub operator: Comparison,
    pub value: FilterValue,
}

/// Strip a leading `<` or `>` and coerce what remains.
///
/// Total: values that are neither numbers nor complete dates become text.
pub fn normalize(raw: &str) -> NormalizedValue {
    let trimmed = raw.trim();

    let (operator, rest) = if let Some(rest) = trimmed.strip_prefix('<') {
        (Comparison::Lt, rest.trim())
    } else if let Some(rest) = trimmed.strip_prefix('>') {
        (Comparison::Gt, rest.trim())
    } else {
        (Comparison::Eq, trimmed)
    };

    NormalizedValue {
        operator,
        value: coerce(rest),
    }
}

fn coerce(value: &str) -> FilterValue {
    if is_number(value) {
        FilterValue::Number(value.to_string())
    } else if let Some(millis) = parse_iso8601_millis(value) {
        FilterValue::Timestamp(millis)
    } else {
        FilterValue::Text(value.to_string())
    }
}

/// Finite decimal numbers only: `inf` and `NaN` parse as `f64` but are text
/// here.
fn is_number(value: &str) -> bool {
    value.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// Parse a complete ISO-8601 date or date-time into epoch milliseconds.
///
/// Accepted shapes: `2024-01-01`, `2024-01-01T10:30`, `2024-01-01T10:30:15`,
/// `2024-01-01T10:30:15.250` (all read as UTC) and RFC 3339 with an offset
/// such as `2024-01-01T10:30:15+02:00` or a trailing `Z`.
pub fn parse_iso8601_millis(value: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
