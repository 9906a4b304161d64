//! Run command implementation

use std::path::PathBuf;

use retail_centralisation::entity::Entity;
use retail_centralisation::extract::LocalExtractor;
use retail_centralisation::pipeline::{PipelineExecutor, entity_summary};
use retail_centralisation::store::WarehouseDb;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::print_json;

/// Arguments for the `run` command
pub struct RunArgs {
    /// Entity name, or `all`
    pub target: String,
    /// Extract file for a single entity
    pub extract: Option<PathBuf>,
    /// Clean and plan without writing to the warehouse
    pub dry_run: bool,
    /// Print the report as JSON on stdout
    pub json: bool,
}

/// Handle the `run` command
pub fn handle_run(global: &GlobalArgs, args: &RunArgs) -> Result<(), CliError> {
    let mut config = global.load_config()?;
    if args.dry_run {
        config = config.with_dry_run(true);
    }

    let database = config.warehouse.database.to_string_lossy().to_string();
    let warehouse = if config.dry_run {
        WarehouseDb::memory()?
    } else {
        WarehouseDb::open(&database)?
    };

    if args.target == "all" {
        if args.extract.is_some() {
            return Err(CliError::InvalidArgument(
                "--extract needs a single entity; configure [extracts] to run all".to_string(),
            ));
        }
        let extractor = config.extractor();
        let mut executor = PipelineExecutor::new(config, warehouse)?;
        eprintln!("Starting pipeline run: {}", executor.run_id());

        let report = executor.run_all(&extractor)?;
        if args.json {
            print_json(&report)?;
        }
        report.print_summary();

        return if report.is_success() {
            eprintln!();
            eprintln!("Pipeline completed successfully!");
            Ok(())
        } else {
            Err(CliError::Incomplete(format!(
                "{} entit{} aborted",
                report.failures.len(),
                if report.failures.len() == 1 { "y" } else { "ies" }
            )))
        };
    }

    let entity: Entity = args.target.parse().map_err(CliError::InvalidArgument)?;
    let extractor = match &args.extract {
        Some(path) => LocalExtractor::new().with_path(entity, path),
        None => config.extractor(),
    };
    let mut executor = PipelineExecutor::new(config, warehouse)?;
    let report = executor.run_entity(entity, &extractor)?;

    if args.json {
        print_json(&report)?;
    }
    eprintln!("{}", entity_summary(&report));
    for warning in &report.cleaning.warnings {
        eprintln!("    warning: {}", warning);
    }
    for failure in report.schema.failures() {
        eprintln!("    failed: {}", failure.statement.sql);
    }
    Ok(())
}
