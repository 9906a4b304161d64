//! Pipeline orchestration
//!
//! The executor runs each entity through a fixed sequence:
//!
//! 1. **Extract**: read the raw table (fatal for the entity on failure)
//! 2. **Clean**: apply the entity's cleaner
//! 3. **Load**: replace the warehouse table with the cleaned rows
//! 4. **Schema**: apply the table's schema plan statement by statement
//! 5. **Key**: install the primary key if it is not already in place
//!
//! Once every table is loaded, foreign keys are installed from the fact table
//! to each dimension, pruning orphan rows first where configured.
//!
//! ## Example
//!
//! ```rust,ignore
//! use retail_centralisation::config::EtlConfig;
//! use retail_centralisation::pipeline::PipelineExecutor;
//! use retail_centralisation::store::WarehouseDb;
//!
//! let config = EtlConfig::load("retail-etl.toml".as_ref())?;
//! let warehouse = WarehouseDb::open("sales_data.duckdb")?;
//! let extractor = config.extractor();
//! let mut executor = PipelineExecutor::new(config, warehouse)?;
//! let report = executor.run_all(&extractor)?;
//! report.print_summary();
//! ```

mod error;
mod executor;
mod report;

pub use error::{PipelineError, PipelineResult};
pub use executor::PipelineExecutor;
pub use report::{
    EntityFailure, EntityReport, IntegrityReport, PipelineReport, entity_summary,
};
