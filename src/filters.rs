//! Row validity filters
//!
//! Filters only remove rows; they never rewrite the values of the rows they
//! keep. Each returns the number of rows it dropped so cleaners can report it.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::normalize::strip_non_digits;
use crate::table::{Table, Value};

/// Sentinel written by the store source for absent values
pub const PLACEHOLDER: &str = "NULL";

/// Marker injected into corrupted card numbers
const CARD_CORRUPTION_MARKER: char = '?';

static ALPHABETIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]").unwrap());

/// A filter was asked to inspect a column the table does not have
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Column '{0}' not found")]
pub struct MissingColumn(pub String);

/// Whether a string reads like a code rather than a real value
///
/// True when the text has cased characters and none of them are lowercase
/// (`"GB"`, `"9GO7GT3"`), or when every character is numeric.
pub fn looks_like_code(value: &str) -> bool {
    is_upper(value) || is_numeric(value)
}

fn is_upper(value: &str) -> bool {
    let mut cased = false;
    for c in value.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(char::is_numeric)
}

/// Drop rows in which every value equals the `"NULL"` placeholder
pub fn drop_placeholder_rows(table: &mut Table) -> usize {
    table.retain_rows(|row| !row.iter().all(|v| v.as_text() == Some(PLACEHOLDER)))
}

/// Drop rows in which every value is a code-like string
///
/// Rows holding any non-text value (numbers, nulls, dates) are kept.
// TODO: replace the structural heuristic with an enumerated sentinel list once
// the placeholder values of each source are catalogued.
pub fn drop_code_like_rows(table: &mut Table) -> usize {
    table.retain_rows(|row| {
        !row
            .iter()
            .all(|v| v.as_text().is_some_and(looks_like_code))
    })
}

/// Keep only rows whose email column contains `@`
pub fn retain_valid_emails(table: &mut Table, column: &str) -> Result<usize, MissingColumn> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| MissingColumn(column.to_string()))?;
    Ok(table.retain_rows(|row| row[idx].as_text().is_some_and(|s| s.contains('@'))))
}

/// Drop rows whose card number carries the `?` corruption marker
pub fn drop_invalid_card_numbers(table: &mut Table, column: &str) -> Result<usize, MissingColumn> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| MissingColumn(column.to_string()))?;
    Ok(table.retain_rows(|row| {
        !row[idx]
            .to_text()
            .is_some_and(|s| s.contains(CARD_CORRUPTION_MARKER))
    }))
}

/// Drop rows whose column cannot be coerced to an integer once non-digits are stripped
pub fn drop_non_integer_rows(table: &mut Table, column: &str) -> Result<usize, MissingColumn> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| MissingColumn(column.to_string()))?;
    Ok(table.retain_rows(|row| coerce_integer(&row[idx]).is_some()))
}

/// Integer reading of a value after stripping non-digit characters
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        Value::Null => None,
        other => other
            .to_text()
            .and_then(|s| strip_non_digits(&s).parse::<i64>().ok()),
    }
}

/// Row positions whose column contains alphabetic characters
///
/// Used to spot dates of birth that were replaced by codes or month names.
pub fn rows_with_alphabetic(table: &Table, column: &str) -> Result<Vec<usize>, MissingColumn> {
    let values = table
        .column_values(column)
        .ok_or_else(|| MissingColumn(column.to_string()))?;
    Ok(values
        .enumerate()
        .filter(|(_, v)| v.as_text().is_some_and(|s| ALPHABETIC_REGEX.is_match(s)))
        .map(|(i, _)| i)
        .collect())
}
