//! Plan command implementation

use retail_centralisation::entity::Entity;
use retail_centralisation::pipeline::PipelineExecutor;
use retail_centralisation::store::WarehouseDb;

use crate::error::CliError;
use crate::output::{format_plan, print_json};

/// Handle the `plan` command: print an entity's schema statements in order
pub fn handle_plan(entity: &str, json: bool) -> Result<(), CliError> {
    let entity: Entity = entity.parse().map_err(CliError::InvalidArgument)?;
    let report = PipelineExecutor::<WarehouseDb>::plan(entity)?;

    if json {
        print_json(&report)?;
    } else {
        print!("{}", format_plan(&report));
    }
    Ok(())
}
