//! Column types and type-change statements

use std::fmt;

use serde::Serialize;

/// Target column types used by the warehouse schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SqlType {
    /// Variable-length text, optionally bounded
    Varchar(Option<u32>),
    SmallInt,
    BigInt,
    /// Double precision float
    Float,
    Date,
    Timestamp,
    Uuid,
    Boolean,
}

impl SqlType {
    /// Whether converting text into this type needs an explicit `USING` expression
    pub fn requires_reinterpretation(&self) -> bool {
        matches!(self, SqlType::Date | SqlType::Uuid | SqlType::Boolean)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Varchar(Some(len)) => write!(f, "VARCHAR({})", len),
            SqlType::Varchar(None) => write!(f, "VARCHAR"),
            SqlType::SmallInt => write!(f, "SMALLINT"),
            SqlType::BigInt => write!(f, "BIGINT"),
            SqlType::Float => write!(f, "FLOAT8"),
            SqlType::Date => write!(f, "DATE"),
            SqlType::Timestamp => write!(f, "TIMESTAMP"),
            SqlType::Uuid => write!(f, "UUID"),
            SqlType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// How existing values are reinterpreted when a column changes type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Reinterpret {
    /// `CAST(column AS target)`
    Cast,
    /// `column = 'literal'`, for text flags becoming booleans
    Equals(String),
}

impl Reinterpret {
    /// Render the `USING` expression for a column
    pub fn expression(&self, column: &str, target: SqlType) -> String {
        match self {
            Reinterpret::Cast => format!("CAST({} AS {})", quote_ident(column), target),
            Reinterpret::Equals(literal) => {
                format!("{} = {}", quote_ident(column), quote_literal(literal))
            }
        }
    }
}

/// A single column type change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnTypeSpec {
    pub table: String,
    pub column: String,
    pub target: SqlType,
    pub reinterpret: Option<Reinterpret>,
}

impl ColumnTypeSpec {
    pub fn new(table: impl Into<String>, column: impl Into<String>, target: SqlType) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            target,
            reinterpret: None,
        }
    }

    /// Reinterpret existing values with the given expression
    pub fn using(mut self, reinterpret: Reinterpret) -> Self {
        self.reinterpret = Some(reinterpret);
        self
    }

    /// The `ALTER TABLE` statement for this change
    pub fn statement(&self) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            quote_ident(&self.table),
            quote_ident(&self.column),
            self.target
        );
        if let Some(reinterpret) = &self.reinterpret {
            sql.push_str(" USING ");
            sql.push_str(&reinterpret.expression(&self.column, self.target));
        }
        sql
    }
}

/// Double-quote an identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
