//! Ordered schema plans with declared step dependencies
//!
//! A [`SchemaPlan`] is the list of statements applied to one table after its
//! cleaned data is loaded: data fixes, derived columns and type changes. Steps
//! run in declared order. Where one step relies on another (a value fix before
//! the cast that would reject the unfixed value) the dependency is declared
//! with [`SchemaPlan::after`] and checked by [`SchemaPlan::validate`].

use std::collections::HashMap;

use petgraph::Directed;
use petgraph::Graph;
use petgraph::algo::toposort;
use serde::Serialize;
use thiserror::Error;

use super::types::{ColumnTypeSpec, Reinterpret, SqlType, quote_ident};

/// Structural problems in a schema plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Duplicate step '{step}' in plan for {table}")]
    DuplicateStep { table: String, step: String },

    #[error("Step '{step}' in plan for {table} depends on unknown step '{dependency}'")]
    UnknownDependency {
        table: String,
        step: String,
        dependency: String,
    },

    #[error("Plan for {table} has a dependency cycle through step '{step}'")]
    Cycle { table: String, step: String },

    #[error("Step '{step}' in plan for {table} runs before its dependency '{dependency}'")]
    OutOfOrder {
        table: String,
        step: String,
        dependency: String,
    },

    #[error("Converting {table}.{column} to {target} requires a USING expression")]
    MissingReinterpretation {
        table: String,
        column: String,
        target: SqlType,
    },

    #[error("Step '{step}' targets table {found} but the plan is for {table}")]
    ForeignTable {
        table: String,
        step: String,
        found: String,
    },
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// Rewrite values in place, optionally only where a condition holds
    Fix {
        column: String,
        value: String,
        filter: Option<String>,
    },
    /// Add a new column
    AddColumn { column: String, ty: SqlType },
    /// Compute a column from an expression over the row
    Derive { column: String, expression: String },
    /// Change a column's type
    AlterType(ColumnTypeSpec),
}

/// One step of a schema plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaStep {
    pub id: String,
    pub kind: StepKind,
    /// Steps that must have run before this one
    pub after: Vec<String>,
}

impl SchemaStep {
    /// Column the step touches
    pub fn column(&self) -> &str {
        match &self.kind {
            StepKind::Fix { column, .. }
            | StepKind::AddColumn { column, .. }
            | StepKind::Derive { column, .. } => column,
            StepKind::AlterType(spec) => &spec.column,
        }
    }

    /// Render the step as a statement against the given table
    pub fn statement(&self, table: &str) -> String {
        let table = quote_ident(table);
        match &self.kind {
            StepKind::Fix {
                column,
                value,
                filter,
            } => {
                let mut sql = format!("UPDATE {} SET {} = {}", table, quote_ident(column), value);
                if let Some(filter) = filter {
                    sql.push_str(" WHERE ");
                    sql.push_str(filter);
                }
                sql
            }
            StepKind::AddColumn { column, ty } => {
                format!("ALTER TABLE {} ADD COLUMN {} {}", table, quote_ident(column), ty)
            }
            StepKind::Derive { column, expression } => {
                format!("UPDATE {} SET {} = {}", table, quote_ident(column), expression)
            }
            StepKind::AlterType(spec) => spec.statement(),
        }
    }
}

/// A statement ready to run, with the step it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStatement {
    pub step: String,
    pub table: String,
    pub column: String,
    pub sql: String,
}

/// The ordered schema steps for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaPlan {
    table: String,
    steps: Vec<SchemaStep>,
}

impl SchemaPlan {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            steps: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn steps(&self) -> &[SchemaStep] {
        &self.steps
    }

    /// Append a step
    pub fn push(&mut self, step: SchemaStep) {
        self.steps.push(step);
    }

    fn with_step(mut self, id: impl Into<String>, kind: StepKind) -> Self {
        self.steps.push(SchemaStep {
            id: id.into(),
            kind,
            after: Vec::new(),
        });
        self
    }

    /// Rewrite a column's values, optionally only where `filter` holds
    pub fn fix(self, id: &str, column: &str, value: &str, filter: Option<&str>) -> Self {
        self.with_step(
            id,
            StepKind::Fix {
                column: column.to_string(),
                value: value.to_string(),
                filter: filter.map(str::to_string),
            },
        )
    }

    /// Add a column
    pub fn add_column(self, id: &str, column: &str, ty: SqlType) -> Self {
        self.with_step(
            id,
            StepKind::AddColumn {
                column: column.to_string(),
                ty,
            },
        )
    }

    /// Fill a column from an expression
    pub fn derive(self, id: &str, column: &str, expression: &str) -> Self {
        self.with_step(
            id,
            StepKind::Derive {
                column: column.to_string(),
                expression: expression.to_string(),
            },
        )
    }

    /// Change a column's type; the step id is `type:<column>`
    pub fn alter(self, column: &str, target: SqlType) -> Self {
        let spec = ColumnTypeSpec::new(self.table.clone(), column, target);
        self.with_step(format!("type:{column}"), StepKind::AlterType(spec))
    }

    /// Change a column's type, reinterpreting existing values
    pub fn alter_using(self, column: &str, target: SqlType, reinterpret: Reinterpret) -> Self {
        let spec = ColumnTypeSpec::new(self.table.clone(), column, target).using(reinterpret);
        self.with_step(format!("type:{column}"), StepKind::AlterType(spec))
    }

    /// Declare dependencies of the most recently added step
    pub fn after(mut self, dependencies: &[&str]) -> Self {
        if let Some(step) = self.steps.last_mut() {
            step.after
                .extend(dependencies.iter().map(|d| d.to_string()));
        }
        self
    }

    /// Position of a step in execution order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Declared dependencies of a step
    pub fn dependencies_of(&self, id: &str) -> Option<&[String]> {
        self.steps
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.after.as_slice())
    }

    /// Check that the declared order satisfies every dependency
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut graph = Graph::<&str, (), Directed>::new();
        let mut nodes = HashMap::new();

        for step in &self.steps {
            if nodes.contains_key(step.id.as_str()) {
                return Err(PlanError::DuplicateStep {
                    table: self.table.clone(),
                    step: step.id.clone(),
                });
            }
            nodes.insert(step.id.as_str(), graph.add_node(step.id.as_str()));
        }

        for step in &self.steps {
            for dependency in &step.after {
                let Some(&from) = nodes.get(dependency.as_str()) else {
                    return Err(PlanError::UnknownDependency {
                        table: self.table.clone(),
                        step: step.id.clone(),
                        dependency: dependency.clone(),
                    });
                };
                graph.add_edge(from, nodes[step.id.as_str()], ());
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(PlanError::Cycle {
                table: self.table.clone(),
                step: graph[cycle.node_id()].to_string(),
            });
        }

        for (position, step) in self.steps.iter().enumerate() {
            for dependency in &step.after {
                if self.position(dependency).is_some_and(|p| p > position) {
                    return Err(PlanError::OutOfOrder {
                        table: self.table.clone(),
                        step: step.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }

            if let StepKind::AlterType(spec) = &step.kind {
                if spec.table != self.table {
                    return Err(PlanError::ForeignTable {
                        table: self.table.clone(),
                        step: step.id.clone(),
                        found: spec.table.clone(),
                    });
                }
                if spec.target.requires_reinterpretation() && spec.reinterpret.is_none() {
                    return Err(PlanError::MissingReinterpretation {
                        table: self.table.clone(),
                        column: spec.column.clone(),
                        target: spec.target,
                    });
                }
            }
        }

        Ok(())
    }

    /// The plan's statements in execution order
    pub fn statements(&self) -> Vec<PlannedStatement> {
        self.steps
            .iter()
            .map(|step| PlannedStatement {
                step: step.id.clone(),
                table: self.table.clone(),
                column: step.column().to_string(),
                sql: step.statement(&self.table),
            })
            .collect()
    }
}

/// Check that a statement parses, returning the parser's complaint otherwise
pub fn lint_statement(sql: &str) -> Result<(), String> {
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    let dialect = GenericDialect {};
    Parser::parse_sql(&dialect, sql).map_err(|e| format!("SQL lint failed: {}", e))?;
    Ok(())
}
