//! CLI command handlers

pub mod constrain;
pub mod plan;
pub mod run;

use std::path::PathBuf;

use retail_centralisation::config::EtlConfig;

use crate::error::CliError;

/// Options shared by every command
pub struct GlobalArgs {
    /// Configuration file
    pub config: Option<PathBuf>,
    /// Database path overriding the configuration
    pub database: Option<PathBuf>,
}

impl GlobalArgs {
    /// Resolve the effective configuration
    pub fn load_config(&self) -> Result<EtlConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => EtlConfig::load(path)?,
            None => EtlConfig::new(),
        };
        if let Some(database) = &self.database {
            config = config.with_database(database);
        }
        config.validate()?;
        Ok(config)
    }
}
