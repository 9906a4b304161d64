//! Schema evolution for loaded tables
//!
//! - [`types`]: target column types and `ALTER COLUMN ... TYPE` rendering
//! - [`plan`]: ordered steps with declared dependencies
//! - [`catalog`]: the plan and keys of every warehouse table
//! - [`sequencer`]: fault-tolerant application of a plan

pub mod catalog;
pub mod plan;
pub mod sequencer;
pub mod types;

pub use catalog::{foreign_keys, plan_for, primary_key};
pub use plan::{PlanError, PlannedStatement, SchemaPlan, SchemaStep, StepKind, lint_statement};
pub use sequencer::{
    SequenceReport, StatementOutcome, StatementResult, apply_plan, plan_only,
};
pub use types::{ColumnTypeSpec, Reinterpret, SqlType, quote_ident, quote_literal};
