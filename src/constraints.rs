//! Primary and foreign key installation
//!
//! Primary keys are installed idempotently: existing key columns are read
//! first and the `ALTER` is only issued when the column is not already the
//! key. Foreign keys are installed against the fact table after orphan rows
//! (fact rows whose key has no match in the dimension) are pruned; a
//! relationship that still has orphans is reported and skipped.

use serde::Serialize;
use tracing::{info, warn};

use crate::schema::quote_ident;
use crate::store::SchemaExecutor;

/// Primary key of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKeySpec {
    pub table: String,
    pub column: String,
}

impl PrimaryKeySpec {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn statement(&self) -> String {
        format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({})",
            quote_ident(&self.table),
            quote_ident(&self.column)
        )
    }
}

/// Outcome of a primary key installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrimaryKeyOutcome {
    /// The key was added by this call
    Added,
    /// The column was already the key; nothing was executed
    AlreadyPrimaryKey,
    /// The key could not be added
    Failed { error: String },
    /// Not executed (dry run)
    Planned { sql: String },
}

/// Add a primary key unless the column already is one
pub fn install_primary_key<E>(executor: &mut E, spec: &PrimaryKeySpec) -> PrimaryKeyOutcome
where
    E: SchemaExecutor + ?Sized,
{
    match executor.primary_key_columns(&spec.table) {
        Ok(columns) if columns.iter().any(|c| c == &spec.column) => {
            info!(table = %spec.table, column = %spec.column, "Column is already a primary key");
            return PrimaryKeyOutcome::AlreadyPrimaryKey;
        }
        Ok(_) => {}
        Err(e) => {
            warn!(table = %spec.table, error = %e, "Could not read existing primary key");
            return PrimaryKeyOutcome::Failed {
                error: e.to_string(),
            };
        }
    }

    let sql = spec.statement();
    match executor.execute(&sql) {
        Ok(_) => {
            info!(table = %spec.table, column = %spec.column, "Primary key added");
            PrimaryKeyOutcome::Added
        }
        Err(e) => {
            warn!(
                table = %spec.table,
                column = %spec.column,
                sql = %sql,
                error = %e,
                "Unable to add primary key"
            );
            PrimaryKeyOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Check whether a column is part of a table's primary key
pub fn primary_key_present<E>(executor: &mut E, spec: &PrimaryKeySpec) -> bool
where
    E: SchemaExecutor + ?Sized,
{
    executor
        .primary_key_columns(&spec.table)
        .map(|columns| columns.iter().any(|c| c == &spec.column))
        .unwrap_or(false)
}

/// Reference from a fact-table column to a dimension key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeySpec {
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKeySpec {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
        }
    }

    /// Constraint name, `fk_<referenced table>_<column>`
    pub fn constraint_name(&self) -> String {
        format!("fk_{}_{}", self.referenced_table, self.column)
    }

    /// Predicate matching fact rows whose key has no dimension row
    fn orphan_predicate(&self) -> String {
        let column = quote_ident(&self.column);
        let referenced = quote_ident(&self.referenced_column);
        format!(
            "{column} IS NOT NULL AND {column} NOT IN \
             (SELECT {referenced} FROM {table} WHERE {referenced} IS NOT NULL)",
            table = quote_ident(&self.referenced_table)
        )
    }

    /// Statement counting orphan rows
    pub fn orphan_count_query(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            quote_ident(&self.table),
            self.orphan_predicate()
        )
    }

    /// Statement deleting orphan rows
    pub fn prune_statement(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {}",
            quote_ident(&self.table),
            self.orphan_predicate()
        )
    }

    /// The `FOREIGN KEY ... REFERENCES ...` clause, as used in a table definition
    pub fn clause(&self) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_ident(&self.column),
            quote_ident(&self.referenced_table),
            quote_ident(&self.referenced_column)
        )
    }

    /// Statement adding the constraint
    pub fn statement(&self) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} {}",
            quote_ident(&self.table),
            quote_ident(&self.constraint_name()),
            self.clause()
        )
    }
}

/// Outcome of pruning orphans for one relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PruneOutcome {
    Pruned { rows: usize },
    Failed { error: String },
    Disabled,
}

/// Outcome of adding one foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForeignKeyOutcome {
    Installed,
    /// Orphan rows remain, so the constraint was not attempted
    ReferentialViolation { orphans: i64 },
    Failed { error: String },
}

/// Everything done for one relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipReport {
    pub spec: ForeignKeySpec,
    pub prune: PruneOutcome,
    pub outcome: ForeignKeyOutcome,
}

/// Delete fact rows whose key is missing from the dimension
pub fn prune_orphans<E>(executor: &mut E, spec: &ForeignKeySpec) -> PruneOutcome
where
    E: SchemaExecutor + ?Sized,
{
    let sql = spec.prune_statement();
    match executor.execute(&sql) {
        Ok(rows) => {
            info!(
                table = %spec.table,
                column = %spec.column,
                referenced_table = %spec.referenced_table,
                rows,
                "Pruned orphan rows"
            );
            PruneOutcome::Pruned { rows }
        }
        Err(e) => {
            warn!(table = %spec.table, column = %spec.column, sql = %sql, error = %e, "Orphan prune failed");
            PruneOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Add a foreign key once no orphan rows remain
pub fn install_foreign_key<E>(executor: &mut E, spec: &ForeignKeySpec) -> ForeignKeyOutcome
where
    E: SchemaExecutor + ?Sized,
{
    let orphans = match executor.query_count(&spec.orphan_count_query()) {
        Ok(count) => count,
        Err(e) => {
            return ForeignKeyOutcome::Failed {
                error: e.to_string(),
            };
        }
    };
    if orphans > 0 {
        warn!(
            table = %spec.table,
            column = %spec.column,
            referenced_table = %spec.referenced_table,
            orphans,
            "Orphan rows remain, foreign key not added"
        );
        return ForeignKeyOutcome::ReferentialViolation { orphans };
    }

    match executor.add_foreign_key(spec) {
        Ok(()) => {
            info!(table = %spec.table, column = %spec.column, referenced_table = %spec.referenced_table, "Foreign key added");
            ForeignKeyOutcome::Installed
        }
        Err(e) => {
            warn!(table = %spec.table, column = %spec.column, error = %e, "Unable to add foreign key");
            ForeignKeyOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Prune (when enabled) and then constrain one relationship
pub fn install_relationship<E>(executor: &mut E, spec: &ForeignKeySpec, prune: bool) -> RelationshipReport
where
    E: SchemaExecutor + ?Sized,
{
    let prune = if prune {
        prune_orphans(executor, spec)
    } else {
        PruneOutcome::Disabled
    };
    let outcome = install_foreign_key(executor, spec);
    RelationshipReport {
        spec: spec.clone(),
        prune,
        outcome,
    }
}
