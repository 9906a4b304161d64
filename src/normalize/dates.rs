//! Calendar date and timestamp parsing

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Date layouts seen in the user and product extracts, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y %B %d", "%B %Y %d", "%d %B %Y"];

/// Timestamp layouts; `%.f` also accepts a missing fraction.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"];

/// Error raised when a date or timestamp cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unparsable {kind} '{input}'")]
pub struct DateParseError {
    pub kind: &'static str,
    pub input: String,
}

/// Parse a calendar date from any supported layout
///
/// Leading timestamps are accepted and truncated to their date.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let input = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .or_else(|| parse_timestamp(input).ok().map(|ts| ts.date()))
        .ok_or_else(|| DateParseError {
            kind: "date",
            input: raw.to_string(),
        })
}

/// Parse a timestamp
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DateParseError> {
    let input = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| DateParseError {
            kind: "timestamp",
            input: raw.to_string(),
        })
}

/// Compose separate year, month, day and time-of-day fields into a timestamp
///
/// The fields are joined as `"{year}-{month}-{day} {time}"` before parsing.
pub fn compose_timestamp(
    year: &str,
    month: &str,
    day: &str,
    time: &str,
) -> Result<NaiveDateTime, DateParseError> {
    let joined = format!("{}-{}-{} {}", year.trim(), month.trim(), day.trim(), time.trim());
    parse_timestamp(&joined)
}
