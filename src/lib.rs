//! Retail Centralisation - normalisation and schema-coercion pipeline
//!
//! Takes raw retail extracts (users, cards, stores, products, date events and
//! orders), cleans each with a fixed sequence of rules, loads the result into
//! a DuckDB warehouse and coerces it into a typed star schema:
//! - Value normalisation (emails, country codes, weights, dates)
//! - Per-entity cleaners with row-level reports
//! - Ordered, validated schema plans (`ALTER ... TYPE ... USING`)
//! - Idempotent primary keys and orphan-pruning foreign keys

pub mod clean;
pub mod config;
pub mod constraints;
pub mod entity;
pub mod extract;
pub mod filters;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod table;

// Re-export commonly used types
pub use clean::{CleanError, Cleaned, CleaningReport, clean};
pub use config::{ConfigError, EtlConfig};
pub use entity::{Entity, FACT_TABLE};
pub use extract::{ExtractError, Extractor, InMemoryExtractor, LocalExtractor};
pub use pipeline::{PipelineError, PipelineExecutor, PipelineReport, PipelineResult};
pub use schema::{SchemaPlan, SequenceReport, SqlType};
pub use store::{SchemaExecutor, StoreError, TableLoader};
#[cfg(feature = "duckdb-backend")]
pub use store::WarehouseDb;
pub use table::{Table, Value};
