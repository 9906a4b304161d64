//! Per-entity cleaning pipelines
//!
//! Each cleaner composes the normalisers and row filters in a fixed order and
//! turns a raw extract into a table fit for loading. Missing columns are
//! reported on the [`CleaningReport`] and the dependent step is skipped; only
//! the store cleaner treats a missing column as fatal for its entity.

mod card;
mod date_event;
mod order;
mod product;
mod store;
mod user;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::entity::Entity;
use crate::filters::MissingColumn;
use crate::table::{Table, Value};

pub use store::STORE_REQUIRED_COLUMNS;

/// Errors that abort the cleaning of one entity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanError {
    /// A column the cleaner cannot work without is absent
    #[error("{entity} extract is missing required column '{column}'")]
    MissingColumn { entity: Entity, column: String },
}

/// Rows removed by one cleaning step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRows {
    pub step: String,
    pub rows: usize,
}

/// What a cleaner did to its extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub entity: Entity,
    pub rows_in: usize,
    pub rows_out: usize,
    pub dropped: Vec<DroppedRows>,
    pub warnings: Vec<String>,
}

impl CleaningReport {
    fn new(entity: Entity, rows_in: usize) -> Self {
        Self {
            entity,
            rows_in,
            rows_out: rows_in,
            dropped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record rows dropped by a step; zero counts are not recorded
    pub(crate) fn note_dropped(&mut self, step: &str, rows: usize) {
        if rows > 0 {
            self.dropped.push(DroppedRows {
                step: step.to_string(),
                rows,
            });
        }
    }

    /// Record a recoverable anomaly
    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(entity = %self.entity, "{}", message);
        self.warnings.push(message);
    }

    /// Record that a step was skipped because its column is absent
    pub(crate) fn skipped(&mut self, step: &str, column: &str) {
        self.warn(format!("Skipped {step}: column '{column}' not found"));
    }

    /// Record the outcome of a filter that needs a column
    pub(crate) fn filtered(&mut self, step: &str, result: Result<usize, MissingColumn>) {
        match result {
            Ok(rows) => self.note_dropped(step, rows),
            Err(MissingColumn(column)) => self.skipped(step, &column),
        }
    }

    /// Total rows removed
    pub fn rows_dropped(&self) -> usize {
        self.rows_in.saturating_sub(self.rows_out)
    }
}

/// A cleaned table and the report describing how it was produced
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub table: Table,
    pub report: CleaningReport,
}

/// Clean a raw extract for the given entity
pub fn clean(entity: Entity, raw: Table) -> Result<Cleaned, CleanError> {
    let mut table = raw;
    let mut report = CleaningReport::new(entity, table.len());

    match entity {
        Entity::User => user::clean(&mut table, &mut report),
        Entity::Card => card::clean(&mut table, &mut report),
        Entity::Store => store::clean(&mut table, &mut report)?,
        Entity::Product => product::clean(&mut table, &mut report),
        Entity::Order => order::clean(&mut table, &mut report),
        Entity::DateEvent => date_event::clean(&mut table, &mut report),
    }

    report.rows_out = table.len();
    info!(
        entity = %entity,
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        warnings = report.warnings.len(),
        "Cleaned extract"
    );
    Ok(Cleaned { table, report })
}

/// Drop a column, recording a warning when it is absent
pub(crate) fn drop_column(table: &mut Table, report: &mut CleaningReport, column: &str) {
    if !table.drop_column(column) {
        report.skipped("drop column", column);
    }
}

/// Map a column in place, recording a warning when it is absent
pub(crate) fn map_column<F>(
    table: &mut Table,
    report: &mut CleaningReport,
    step: &str,
    column: &str,
    f: F,
) where
    F: FnMut(&Value) -> Value,
{
    if !table.map_column(column, f) {
        report.skipped(step, column);
    }
}
