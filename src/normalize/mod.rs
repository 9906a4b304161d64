//! Unit and format normalisers
//!
//! Every normaliser is total: malformed input never panics. Scalar helpers that
//! can fail return a typed error; the column-level wrappers used by the
//! cleaners turn failures into [`Value::Null`] so the row filters can decide
//! what to drop.

mod dates;
mod weight;

pub use dates::{DateParseError, compose_timestamp, parse_calendar_date, parse_timestamp};
pub use weight::{KG_PER_OUNCE, WeightExpr, WeightParseError, WeightUnit, parse_weight_kg};

use crate::table::Value;

/// Erroneous three-letter alias and the ISO code it stands for
const COUNTRY_CODE_ALIASES: &[(&str, &str)] = &[("GGB", "GB")];

/// Rewrite known country-code aliases
pub fn canonical_country_code(code: &str) -> String {
    COUNTRY_CODE_ALIASES
        .iter()
        .fold(code.to_string(), |acc, &(alias, canonical)| acc.replace(alias, canonical))
}

/// Collapse the doubled `@@` artifact
pub fn canonical_email(email: &str) -> String {
    email.replace("@@", "@")
}

/// Flatten a multi-line address onto one line
pub fn flatten_address(address: &str) -> String {
    address.replace('\n', ", ")
}

/// Keep only the ASCII digits of a value
pub fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Apply a text normaliser to a cell, leaving non-text values alone
pub fn map_text<F>(value: &Value, f: F) -> Value
where
    F: FnOnce(&str) -> String,
{
    match value {
        Value::Text(s) => Value::Text(f(s)),
        other => other.clone(),
    }
}

/// Parse a cell into a calendar date; unparsable values become null
pub fn date_value(value: &Value) -> Value {
    match value {
        Value::Date(_) => value.clone(),
        Value::Timestamp(ts) => Value::Date(ts.date()),
        Value::Null => Value::Null,
        other => match other.to_text().map(|s| parse_calendar_date(&s)) {
            Some(Ok(date)) => Value::Date(date),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Date coerced to null");
                Value::Null
            }
            None => Value::Null,
        },
    }
}

/// Parse a cell into kilograms; unparsable values become null
pub fn weight_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Float(_) => value.clone(),
        other => other
            .to_text()
            .and_then(|s| parse_weight_kg(&s))
            .map(Value::Float)
            .unwrap_or(Value::Null),
    }
}
