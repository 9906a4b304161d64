//! Output formatting for CLI

use anyhow::Context;
use serde::Serialize;

use retail_centralisation::schema::{SequenceReport, StatementOutcome};

/// Print a report as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialise report")?;
    println!("{}", out);
    Ok(())
}

/// Format a schema plan, one numbered statement per line
pub fn format_plan(report: &SequenceReport) -> String {
    let mut output = format!("Schema plan for {}:\n", report.table);
    for (idx, result) in report.results.iter().enumerate() {
        let marker = match &result.outcome {
            StatementOutcome::Planned => "",
            StatementOutcome::Applied { .. } => " [applied]",
            StatementOutcome::Failed { .. } => " [failed]",
        };
        output.push_str(&format!(
            "{:>3}. {:<28} {};{}\n",
            idx + 1,
            result.statement.step,
            result.statement.sql,
            marker
        ));
    }
    output
}
