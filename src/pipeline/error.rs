//! Error types for pipeline operations
//!
//! Only failures that abort an entity (or the whole run) are errors. Failed
//! schema statements and constraint steps are outcomes on the reports.

use thiserror::Error;

use crate::clean::CleanError;
use crate::config::ConfigError;
use crate::entity::Entity;
use crate::extract::ExtractError;
use crate::schema::PlanError;
use crate::store::StoreError;

/// Errors that can occur during pipeline execution
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Pipeline configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The raw extract could not be read
    #[error("Extract for {entity} failed: {source}")]
    Extract {
        entity: Entity,
        #[source]
        source: ExtractError,
    },

    /// The cleaner aborted
    #[error(transparent)]
    Clean(#[from] CleanError),

    /// Loading or querying the warehouse failed
    #[error("Warehouse error: {0}")]
    Store(#[from] StoreError),

    /// A schema plan is malformed
    #[error("Invalid schema plan: {0}")]
    Plan(#[from] PlanError),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Entity the error belongs to, if any
    pub fn entity(&self) -> Option<Entity> {
        match self {
            PipelineError::Extract { entity, .. } => Some(*entity),
            PipelineError::Clean(CleanError::MissingColumn { entity, .. }) => Some(*entity),
            _ => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Config(e) => e.user_message(),
            PipelineError::Extract { source, .. } => source.user_message(),
            PipelineError::Store(e) => e.user_message(),
            PipelineError::Clean(CleanError::MissingColumn { entity, column }) => format!(
                "{self}\n\nHint: The {entity} extract must contain a '{column}' column."
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extract_error_keeps_entity() {
        let err = PipelineError::Extract {
            entity: Entity::Store,
            source: ExtractError::FileNotFound(PathBuf::from("/data/stores.json")),
        };
        assert_eq!(err.entity(), Some(Entity::Store));
        assert!(err.to_string().contains("store"));
        let msg = err.user_message();
        assert!(msg.contains("/data/stores.json"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn test_missing_column_message() {
        let err = PipelineError::from(CleanError::MissingColumn {
            entity: Entity::Store,
            column: "staff_numbers".to_string(),
        });
        assert_eq!(err.entity(), Some(Entity::Store));
        assert!(err.user_message().contains("'staff_numbers'"));
    }
}
