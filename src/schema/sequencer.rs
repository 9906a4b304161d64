//! Applies schema plans one statement at a time
//!
//! Every statement is independent: a failure is recorded with its table,
//! column and SQL, and the sequence moves on to the next statement.

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::store::SchemaExecutor;

use super::plan::{PlanError, PlannedStatement, SchemaPlan, lint_statement};

/// Result of one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatementOutcome {
    /// Executed and committed
    Applied { rows: usize },
    /// Rolled back; later statements still ran
    Failed { error: String },
    /// Not executed (dry run)
    Planned,
}

/// A statement together with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementResult {
    #[serde(flatten)]
    pub statement: PlannedStatement,
    pub outcome: StatementOutcome,
}

/// Outcomes of a whole plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    pub table: String,
    pub results: Vec<StatementResult>,
}

impl SequenceReport {
    /// Number of statements that ran successfully
    pub fn applied(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, StatementOutcome::Applied { .. }))
            .count()
    }

    /// Statements that failed
    pub fn failures(&self) -> impl Iterator<Item = &StatementResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, StatementOutcome::Failed { .. }))
    }

    /// Check whether every statement succeeded
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Outcome of a step by id
    pub fn outcome(&self, step: &str) -> Option<&StatementOutcome> {
        self.results
            .iter()
            .find(|r| r.statement.step == step)
            .map(|r| &r.outcome)
    }
}

/// Validate a plan and report its statements without running them
pub fn plan_only(plan: &SchemaPlan) -> Result<SequenceReport, PlanError> {
    plan.validate()?;
    Ok(SequenceReport {
        table: plan.table().to_string(),
        results: plan
            .statements()
            .into_iter()
            .map(|statement| StatementResult {
                statement,
                outcome: StatementOutcome::Planned,
            })
            .collect(),
    })
}

/// Validate a plan and apply each of its statements in order
pub fn apply_plan<E>(executor: &mut E, plan: &SchemaPlan) -> Result<SequenceReport, PlanError>
where
    E: SchemaExecutor + ?Sized,
{
    plan.validate()?;

    let _span = info_span!("schema_sequence", table = plan.table()).entered();
    let mut results = Vec::with_capacity(plan.steps().len());

    for statement in plan.statements() {
        if let Err(lint) = lint_statement(&statement.sql) {
            debug!(step = %statement.step, sql = %statement.sql, %lint, "Statement did not lint");
        }

        let outcome = match executor.execute(&statement.sql) {
            Ok(rows) => {
                info!(
                    table = %statement.table,
                    column = %statement.column,
                    step = %statement.step,
                    rows,
                    "Applied schema statement"
                );
                StatementOutcome::Applied { rows }
            }
            Err(e) => {
                warn!(
                    table = %statement.table,
                    column = %statement.column,
                    sql = %statement.sql,
                    error = %e,
                    "Schema statement failed, continuing"
                );
                StatementOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        results.push(StatementResult { statement, outcome });
    }

    let report = SequenceReport {
        table: plan.table().to_string(),
        results,
    };
    info!(
        table = plan.table(),
        applied = report.applied(),
        failed = report.failures().count(),
        "Schema sequence finished"
    );
    Ok(report)
}
