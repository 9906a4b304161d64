//! In-memory tabular records passed between pipeline stages
//!
//! Raw extracts and cleaned tables share one representation: an ordered list of
//! column names and rows of loosely typed [`Value`]s. Cleaners narrow the values
//! (text to dates, text to numbers) without changing the shape.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value
    Null,
    /// Free text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without zone
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Build a text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Check whether the value is missing
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text payload, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the float payload, if this is a float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Render the value as text, `None` for nulls
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        }
    }

    /// Convert a JSON scalar into a value
    ///
    /// Nested arrays and objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(s) => write!(f, "{}", s),
            None => write!(f, "NULL"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// An ordered set of named columns and rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Builder-style [`Table::push_row`]
    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.push_row(row);
        self
    }

    /// Build a table from JSON objects
    ///
    /// Columns are ordered by first appearance; keys missing from a record
    /// become nulls.
    pub fn from_json_records(records: &[serde_json::Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let serde_json::Value::Object(map) = record {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut table = Table::new(columns);
        for record in records {
            let row = table
                .columns
                .iter()
                .map(|c| record.get(c).map(Value::from_json).unwrap_or(Value::Null))
                .collect();
            table.rows.push(row);
        }
        table
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Get a cell by row number and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Iterate over one column's values
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Remove a column, returning false when it does not exist
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Rename a column, returning false when it does not exist
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Append a column computed from each row
    pub fn add_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(&Table, &[Value]) -> Value,
    {
        let values: Vec<Value> = self.rows.iter().map(|row| f(self, row)).collect();
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Replace every value of a column, returning false when it does not exist
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        true
    }

    /// Keep only rows matching the predicate, returning how many were dropped
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Value]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_records_orders_columns_by_first_appearance() {
        let records = vec![
            json!({"a": 1, "b": "x"}),
            json!({"b": "y", "c": 2.5}),
        ];
        let table = Table::from_json_records(&records);
        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.get(1, "a"), Some(&Value::Null));
        assert_eq!(table.get(1, "c"), Some(&Value::Float(2.5)));
        assert_eq!(table.get(0, "a"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_drop_and_rename_column() {
        let mut table = Table::new(["index", "weight"]).with_row(vec![0.into(), "1kg".into()]);
        assert!(table.drop_column("index"));
        assert!(!table.drop_column("index"));
        assert!(table.rename_column("weight", "weight (kg)"));
        assert_eq!(table.columns(), &["weight (kg)"]);
        assert_eq!(table.rows()[0], vec![Value::text("1kg")]);
    }

    #[test]
    fn test_retain_rows_reports_dropped_count() {
        let mut table = Table::new(["n"])
            .with_row(vec![1.into()])
            .with_row(vec![Value::Null])
            .with_row(vec![3.into()]);
        let dropped = table.retain_rows(|row| !row[0].is_null());
        assert_eq!(dropped, 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_to_text_renders_scalars() {
        assert_eq!(Value::Integer(42).to_text().as_deref(), Some("42"));
        assert_eq!(Value::Float(30.0).to_text().as_deref(), Some("30"));
        assert_eq!(Value::Null.to_text(), None);
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        assert_eq!(Value::Date(date).to_string(), "1990-01-01");
    }
}
