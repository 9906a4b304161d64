//! Constrain command implementation

use retail_centralisation::constraints::{ForeignKeyOutcome, PruneOutcome};
use retail_centralisation::pipeline::PipelineExecutor;
use retail_centralisation::store::WarehouseDb;

use super::GlobalArgs;
use crate::error::CliError;

/// Handle the `constrain` command: install foreign keys on an existing warehouse
pub fn handle_constrain(global: &GlobalArgs, dry_run: bool) -> Result<(), CliError> {
    let config = global.load_config()?.with_dry_run(dry_run);
    let database = config.warehouse.database.to_string_lossy().to_string();
    let warehouse = WarehouseDb::open(&database)?;
    let mut executor = PipelineExecutor::new(config, warehouse)?;

    let report = executor.install_referential_integrity()?;

    if dry_run {
        for sql in &report.planned {
            println!("{};", sql);
        }
        return Ok(());
    }

    if report.skipped() {
        return Err(CliError::Incomplete(format!(
            "Missing tables: {}. Run 'retail-etl run all' first.",
            report.missing_tables.join(", ")
        )));
    }

    for relationship in &report.relationships {
        let pruned = match &relationship.prune {
            PruneOutcome::Pruned { rows } => format!("{} orphan rows pruned", rows),
            PruneOutcome::Failed { error } => format!("prune failed: {}", error),
            PruneOutcome::Disabled => "pruning disabled".to_string(),
        };
        let status = match &relationship.outcome {
            ForeignKeyOutcome::Installed => "installed".to_string(),
            ForeignKeyOutcome::ReferentialViolation { orphans } => {
                format!("{} orphan rows remain", orphans)
            }
            ForeignKeyOutcome::Failed { error } => format!("failed: {}", error),
        };
        eprintln!(
            "  - {} -> {}: {} ({})",
            relationship.spec.column, relationship.spec.referenced_table, status, pruned
        );
    }
    eprintln!(
        "Foreign keys: {}/{} installed",
        report.installed(),
        report.relationships.len()
    );
    Ok(())
}
