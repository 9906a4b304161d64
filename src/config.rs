//! Pipeline configuration
//!
//! Configuration is read once (from TOML or built in code) and passed to the
//! executor at construction. Example:
//!
//! ```toml
//! dry_run = false
//!
//! [warehouse]
//! database = "sales_data.duckdb"
//!
//! [extracts]
//! user = "extracts/legacy_users.json"
//! date_event = "extracts/date_details.json"
//!
//! [constraints]
//! prune_orphans = ["user_uuid", "card_number", "store_code", "product_code", "date_uuid"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;
use crate::extract::LocalExtractor;
use crate::schema::foreign_keys;

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Io { path, .. } => format!(
                "{self}\n\nHint: Check that {} exists or pass --config with another path.",
                path.display()
            ),
            ConfigError::Parse { .. } => {
                format!("{self}\n\nHint: Check the TOML syntax of your configuration file.")
            }
            ConfigError::Invalid(msg) => {
                format!("Invalid configuration: {msg}\n\nHint: Check your pipeline configuration file.")
            }
        }
    }
}

/// Warehouse connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// DuckDB database path
    pub database: PathBuf,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("sales_data.duckdb"),
        }
    }
}

/// Referential integrity settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    /// Fact-table columns whose orphan rows are deleted before the key is added
    pub prune_orphans: Vec<String>,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            prune_orphans: foreign_keys().into_iter().map(|fk| fk.column).collect(),
        }
    }
}

/// Main pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub warehouse: WarehouseConfig,
    /// Extract file per entity, keyed by entity name
    pub extracts: BTreeMap<String, PathBuf>,
    pub constraints: ConstraintConfig,
    /// Clean and plan without writing to the warehouse
    pub dry_run: bool,
}

impl EtlConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Set the database path
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.warehouse.database = path.into();
        self
    }

    /// Set the extract file for an entity
    pub fn with_extract(mut self, entity: Entity, path: impl Into<PathBuf>) -> Self {
        self.extracts.insert(entity.name().to_string(), path.into());
        self
    }

    /// Set which relationships prune orphans
    pub fn with_prune_orphans<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.prune_orphans = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Enable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether orphans are pruned for a fact-table column
    pub fn prunes(&self, column: &str) -> bool {
        self.constraints.prune_orphans.iter().any(|c| c == column)
    }

    /// Extractor reading the configured files
    ///
    /// Keys that do not name an entity are ignored; [`EtlConfig::validate`]
    /// rejects them.
    pub fn extractor(&self) -> LocalExtractor {
        self.extracts
            .iter()
            .filter_map(|(name, path)| name.parse::<Entity>().ok().map(|e| (e, path)))
            .fold(LocalExtractor::new(), |extractor, (entity, path)| {
                extractor.with_path(entity, path.clone())
            })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.warehouse.database.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "warehouse database path is empty".to_string(),
            ));
        }

        if let Some(name) = self
            .extracts
            .keys()
            .find(|name| name.parse::<Entity>().is_err())
        {
            return Err(ConfigError::Invalid(format!(
                "[extracts] has unknown entity '{}'",
                name
            )));
        }

        let known: Vec<String> = foreign_keys().into_iter().map(|fk| fk.column).collect();
        if let Some(unknown) = self
            .constraints
            .prune_orphans
            .iter()
            .find(|c| !known.contains(c))
        {
            return Err(ConfigError::Invalid(format!(
                "prune_orphans names '{}', expected one of: {}",
                unknown,
                known.join(", ")
            )));
        }

        Ok(())
    }
}
