//! CLI error type

use thiserror::Error;

use retail_centralisation::config::ConfigError;
use retail_centralisation::pipeline::PipelineError;
use retail_centralisation::store::StoreError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Output(#[from] anyhow::Error),

    #[error("{0}")]
    Incomplete(String),
}

impl CliError {
    /// Message shown to the user, with hints where available
    pub fn user_message(&self) -> String {
        match self {
            CliError::Config(e) => e.user_message(),
            CliError::Store(e) => e.user_message(),
            CliError::Pipeline(e) => e.user_message(),
            CliError::InvalidArgument(_) => {
                format!("{self}\n\nHint: Run 'retail-etl --help' for usage.")
            }
            _ => self.to_string(),
        }
    }
}
