//! Run reports

use serde::Serialize;

use crate::clean::CleaningReport;
use crate::constraints::{ForeignKeyOutcome, PrimaryKeyOutcome, RelationshipReport};
use crate::entity::Entity;
use crate::schema::SequenceReport;

/// Everything that happened to one entity
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub run_id: String,
    pub entity: Entity,
    pub table: String,
    pub dry_run: bool,
    pub cleaning: CleaningReport,
    /// Rows written, `None` in dry-run mode
    pub rows_loaded: Option<usize>,
    pub schema: SequenceReport,
    /// `None` for the fact table
    pub primary_key: Option<PrimaryKeyOutcome>,
    /// Whether the key exists after installation
    pub primary_key_present: Option<bool>,
    pub duration_ms: u64,
}

impl EntityReport {
    /// Whether every statement and the key installation succeeded
    pub fn is_clean(&self) -> bool {
        self.schema.is_clean()
            && !matches!(self.primary_key, Some(PrimaryKeyOutcome::Failed { .. }))
    }
}

/// Foreign key installation across the fact table
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub run_id: String,
    /// Tables that had to exist but did not; nothing was attempted when set
    pub missing_tables: Vec<String>,
    pub relationships: Vec<RelationshipReport>,
    /// Statements that would run, in dry-run mode
    pub planned: Vec<String>,
}

impl IntegrityReport {
    /// Number of foreign keys installed
    pub fn installed(&self) -> usize {
        self.relationships
            .iter()
            .filter(|r| r.outcome == ForeignKeyOutcome::Installed)
            .count()
    }

    /// Whether installation was skipped for missing tables
    pub fn skipped(&self) -> bool {
        !self.missing_tables.is_empty()
    }
}

/// An entity whose load was aborted
#[derive(Debug, Clone, Serialize)]
pub struct EntityFailure {
    pub entity: Entity,
    pub error: String,
}

/// Report from a full run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub entities: Vec<EntityReport>,
    pub failures: Vec<EntityFailure>,
    pub integrity: IntegrityReport,
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Check if every entity loaded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else {
            format!("{}s", secs)
        }
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("Run {}", self.run_id);
        eprintln!("Duration: {}", self.duration_formatted());

        for report in &self.entities {
            eprintln!("{}", entity_summary(report));
        }
        for failure in &self.failures {
            eprintln!("  - {}: aborted ({})", failure.entity, failure.error);
        }

        if self.integrity.skipped() {
            eprintln!(
                "Foreign keys skipped, missing tables: {}",
                self.integrity.missing_tables.join(", ")
            );
        } else {
            eprintln!(
                "Foreign keys: {}/{} installed",
                self.integrity.installed(),
                self.integrity.relationships.len()
            );
        }
    }
}

/// One-line summary of an entity report
pub fn entity_summary(report: &EntityReport) -> String {
    let failed = report.schema.failures().count();
    let status = if report.dry_run {
        "planned"
    } else if report.is_clean() {
        "ok"
    } else {
        "partial"
    };
    format!(
        "  - {} -> {}: {} ({} of {} rows kept, {} statements, {} failed)",
        report.entity,
        report.table,
        status,
        report.cleaning.rows_out,
        report.cleaning.rows_in,
        report.schema.results.len(),
        failed
    )
}
