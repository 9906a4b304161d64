//! Warehouse access
//!
//! The pipeline talks to the warehouse through two small traits so the schema
//! sequencer and constraint manager can run against any engine. The bundled
//! implementation is DuckDB ([`WarehouseDb`]).

#[cfg(feature = "duckdb-backend")]
mod db;

#[cfg(feature = "duckdb-backend")]
pub use db::WarehouseDb;

use std::path::PathBuf;

use thiserror::Error;

use crate::constraints::ForeignKeySpec;
use crate::schema::SqlType;
use crate::table::{Table, Value};

/// Errors raised by a warehouse
#[derive(Error, Debug)]
pub enum StoreError {
    /// Engine error
    #[error("Database error: {0}")]
    Database(String),

    /// A single statement failed and was rolled back
    #[error("Statement failed: {message}")]
    Statement { sql: String, message: String },

    /// The database file could not be opened
    #[error("Cannot open warehouse at {path}: {message}")]
    Open { path: PathBuf, message: String },
}

impl StoreError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Open { path, message } => format!(
                "Cannot open warehouse at {}: {message}\n\n\
                Hint: Check the [warehouse] database path in your configuration.",
                path.display()
            ),
            StoreError::Statement { sql, message } => {
                format!("Statement failed: {message}\nStatement: {sql}")
            }
            _ => self.to_string(),
        }
    }
}

/// Executes schema and constraint statements
///
/// Each call to [`SchemaExecutor::execute`] runs in its own transaction that is
/// committed or rolled back before the call returns.
pub trait SchemaExecutor {
    /// Execute one statement, returning the number of affected rows
    fn execute(&mut self, sql: &str) -> Result<usize, StoreError>;

    /// Run a query returning a single count
    fn query_count(&mut self, sql: &str) -> Result<i64, StoreError>;

    /// Columns of the table's primary key, empty when it has none
    fn primary_key_columns(&mut self, table: &str) -> Result<Vec<String>, StoreError>;

    /// Check whether a table exists
    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError>;

    /// Add a foreign key to an existing table
    ///
    /// The default issues `ALTER TABLE ... ADD CONSTRAINT`. Engines that only
    /// accept foreign keys at table creation override this.
    fn add_foreign_key(&mut self, spec: &ForeignKeySpec) -> Result<(), StoreError> {
        self.execute(&spec.statement()).map(|_| ())
    }
}

/// Replaces warehouse tables with cleaned tables
pub trait TableLoader {
    /// Replace `name` with the contents of `table`, returning the rows written
    fn load_table(&mut self, name: &str, table: &Table) -> Result<usize, StoreError>;
}

/// Column type for loading a set of values
///
/// Integers mixed with floats widen to float; any other mix, or a column with
/// no non-null values, is loaded as text.
pub fn infer_column_type<'a, I>(values: I) -> SqlType
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut inferred: Option<SqlType> = None;
    for value in values {
        let ty = match value {
            Value::Null => continue,
            Value::Text(_) => SqlType::Varchar(None),
            Value::Integer(_) => SqlType::BigInt,
            Value::Float(_) => SqlType::Float,
            Value::Bool(_) => SqlType::Boolean,
            Value::Date(_) => SqlType::Date,
            Value::Timestamp(_) => SqlType::Timestamp,
        };
        inferred = Some(match inferred {
            None => ty,
            Some(current) if current == ty => current,
            Some(SqlType::BigInt | SqlType::Float)
                if matches!(ty, SqlType::BigInt | SqlType::Float) =>
            {
                SqlType::Float
            }
            Some(_) => return SqlType::Varchar(None),
        });
    }
    inferred.unwrap_or(SqlType::Varchar(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_column_type() {
        let ints = [Value::Integer(1), Value::Null, Value::Integer(3)];
        assert_eq!(infer_column_type(&ints), SqlType::BigInt);

        let numbers = [Value::Integer(1), Value::Float(2.5)];
        assert_eq!(infer_column_type(&numbers), SqlType::Float);

        let mixed = [Value::Integer(1), Value::text("J78")];
        assert_eq!(infer_column_type(&mixed), SqlType::Varchar(None));

        assert_eq!(infer_column_type(&[Value::Null]), SqlType::Varchar(None));
    }

    #[test]
    fn test_user_message_hints() {
        let err = StoreError::Open {
            path: PathBuf::from("/data/sales.duckdb"),
            message: "permission denied".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("/data/sales.duckdb"));
        assert!(msg.contains("Hint:"));

        let err = StoreError::Statement {
            sql: "ALTER TABLE \"t\"".to_string(),
            message: "boom".to_string(),
        };
        assert!(err.user_message().contains("ALTER TABLE"));
    }
}
