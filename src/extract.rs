//! Raw extracts
//!
//! Remote extraction (relational dumps, PDF tables, store APIs, object storage)
//! happens upstream; this module reads the extracts those adapters leave on
//! disk. Supported layouts:
//!
//! - `.json` holding an array of records
//! - `.json` holding a column-oriented object, `{column: {row: value}}`
//! - `.jsonl` with one record per line

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::entity::Entity;
use crate::table::{Table, Value};

/// Errors that abort an entity's extract
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No extract configured for the entity
    #[error("No extract configured for {0}")]
    NotConfigured(Entity),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported or malformed layout
    #[error("Invalid extract format: {path} - {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    /// JSON parsing error for a specific record
    #[error("JSON parsing error in {path} at record {record}: {error}")]
    JsonParse {
        path: PathBuf,
        record: usize,
        error: String,
    },

    /// The extract holds no rows
    #[error("Extract for {entity} is empty: {path}")]
    Empty { entity: Entity, path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ExtractError::NotConfigured(entity) => format!(
                "No extract configured for {entity}.\n\n\
                Hint: Add `{entity} = \"path\"` under [extracts] or pass --extract."
            ),
            ExtractError::FileNotFound(path) => format!(
                "File not found: {}\n\nHint: Check that the file exists and the path is correct.",
                path.display()
            ),
            ExtractError::InvalidFormat { path, reason } => format!(
                "Invalid extract format: {}\nReason: {reason}\n\n\
                Hint: Extracts must be a JSON array of records, a column-oriented JSON object, or JSON lines.",
                path.display()
            ),
            ExtractError::JsonParse {
                path,
                record,
                error,
            } => format!(
                "JSON parse error in {} at record {record}:\n{error}\n\n\
                Hint: Check the JSON syntax around record {record}.",
                path.display()
            ),
            _ => self.to_string(),
        }
    }
}

/// Source of raw extracts
pub trait Extractor {
    fn extract(&self, entity: Entity) -> Result<Table, ExtractError>;
}

/// Reads extracts from local files
#[derive(Debug, Clone, Default)]
pub struct LocalExtractor {
    paths: BTreeMap<Entity, PathBuf>,
}

impl LocalExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file for an entity
    pub fn with_path(mut self, entity: Entity, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(entity, path.into());
        self
    }

    /// File configured for an entity
    pub fn path(&self, entity: Entity) -> Option<&Path> {
        self.paths.get(&entity).map(PathBuf::as_path)
    }
}

impl Extractor for LocalExtractor {
    fn extract(&self, entity: Entity) -> Result<Table, ExtractError> {
        let path = self
            .path(entity)
            .ok_or(ExtractError::NotConfigured(entity))?;
        let table = read_table(path)?;
        if table.is_empty() {
            return Err(ExtractError::Empty {
                entity,
                path: path.to_path_buf(),
            });
        }
        info!(
            entity = %entity,
            path = %path.display(),
            rows = table.len(),
            columns = table.columns().len(),
            "Read extract"
        );
        Ok(table)
    }
}

/// Extracts held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryExtractor {
    tables: BTreeMap<Entity, Table>,
}

impl InMemoryExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, entity: Entity, table: Table) -> Self {
        self.tables.insert(entity, table);
        self
    }
}

impl Extractor for InMemoryExtractor {
    fn extract(&self, entity: Entity) -> Result<Table, ExtractError> {
        match self.tables.get(&entity) {
            Some(table) if table.is_empty() => Err(ExtractError::Empty {
                entity,
                path: PathBuf::from("<memory>"),
            }),
            Some(table) => Ok(table.clone()),
            None => Err(ExtractError::NotConfigured(entity)),
        }
    }
}

/// Read a table from a `.json` or `.jsonl` file
pub fn read_table(path: &Path) -> Result<Table, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.to_path_buf()));
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json_file(path),
        Some("jsonl") | Some("ndjson") => parse_jsonl_file(path),
        other => Err(ExtractError::InvalidFormat {
            path: path.to_path_buf(),
            reason: format!("unsupported extension {:?}", other.unwrap_or("")),
        }),
    }
}

fn parse_json_file(path: &Path) -> Result<Table, ExtractError> {
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| ExtractError::JsonParse {
            path: path.to_path_buf(),
            record: 0,
            error: e.to_string(),
        })?;

    match value {
        serde_json::Value::Array(records) => {
            debug!(path = %path.display(), records = records.len(), "Parsed record array");
            Ok(Table::from_json_records(&records))
        }
        serde_json::Value::Object(columns) => from_column_orient(path, &columns),
        _ => Err(ExtractError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "expected an array of records or an object of columns".to_string(),
        }),
    }
}

/// Build a table from `{column: {row: value}}`, rows ordered by numeric index
fn from_column_orient(
    path: &Path,
    columns: &serde_json::Map<String, serde_json::Value>,
) -> Result<Table, ExtractError> {
    let mut row_keys: Vec<String> = Vec::new();
    for (name, cells) in columns {
        let Some(cells) = cells.as_object() else {
            return Err(ExtractError::InvalidFormat {
                path: path.to_path_buf(),
                reason: format!("column '{}' is not an object of rows", name),
            });
        };
        for key in cells.keys() {
            if !row_keys.contains(key) {
                row_keys.push(key.clone());
            }
        }
    }
    row_keys.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    });

    let mut table = Table::new(columns.keys().cloned());
    for key in &row_keys {
        let row = columns
            .values()
            .map(|cells| cells.get(key).map(Value::from_json).unwrap_or(Value::Null))
            .collect();
        table.push_row(row);
    }
    debug!(path = %path.display(), rows = table.len(), "Parsed column-oriented extract");
    Ok(table)
}

fn parse_jsonl_file(path: &Path) -> Result<Table, ExtractError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str::<serde_json::Value>(trimmed).map_err(|e| {
            ExtractError::JsonParse {
                path: path.to_path_buf(),
                record: index,
                error: e.to_string(),
            }
        })?;
        records.push(record);
    }

    Ok(Table::from_json_records(&records))
}
