use crate::filters::drop_code_like_rows;
use crate::normalize::compose_timestamp;
use crate::table::{Table, Value};

use super::CleaningReport;

/// Fields composed into the event timestamp, in composition order
const TIMESTAMP_PARTS: [&str; 4] = ["year", "month", "day", "timestamp"];

pub(super) fn clean(table: &mut Table, report: &mut CleaningReport) {
    let dropped = drop_code_like_rows(table);
    report.note_dropped("code-like rows", dropped);

    let mut indices = [0usize; 4];
    for (slot, column) in indices.iter_mut().zip(TIMESTAMP_PARTS) {
        match table.column_index(column) {
            Some(idx) => *slot = idx,
            None => {
                report.skipped("compose datetime", column);
                return;
            }
        }
    }

    let mut unparsable = 0usize;
    table.add_column("datetime", |_, row| {
        let part = |i: usize| row[indices[i]].to_text().unwrap_or_default();
        match compose_timestamp(&part(0), &part(1), &part(2), &part(3)) {
            Ok(ts) => Value::Timestamp(ts),
            Err(e) => {
                tracing::debug!(error = %e, "Event timestamp coerced to null");
                unparsable += 1;
                Value::Null
            }
        }
    });
    if unparsable > 0 {
        report.warn(format!("{unparsable} event timestamps could not be composed"));
    }
}

#[cfg(test)]
mod tests {
    use crate::clean::clean;
    use crate::entity::Entity;
    use crate::table::{Table, Value};

    #[test]
    fn test_datetime_composed_from_parts() {
        let raw = Table::new(["timestamp", "month", "year", "day", "time_period", "date_uuid"])
            .with_row(vec![
                "22:00:06".into(),
                "9".into(),
                "2012".into(),
                "19".into(),
                "Evening".into(),
                "3b7ca996-37f9-433f-b6d0-ce8391b615ad".into(),
            ])
            .with_row(vec![
                "NULL".into(),
                "NULL".into(),
                "NULL".into(),
                "NULL".into(),
                "NULL".into(),
                "NULL".into(),
            ]);

        let cleaned = clean(Entity::DateEvent, raw).unwrap();
        let table = &cleaned.table;
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns().last().map(String::as_str), Some("datetime"));
        match table.get(0, "datetime") {
            Some(Value::Timestamp(ts)) => assert_eq!(ts.to_string(), "2012-09-19 22:00:06"),
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_part_skips_composition() {
        let raw = Table::new(["timestamp", "month", "year"])
            .with_row(vec!["22:00:06".into(), "9".into(), "2012".into()]);
        let cleaned = clean(Entity::DateEvent, raw).unwrap();
        assert!(!cleaned.table.has_column("datetime"));
        assert_eq!(cleaned.report.warnings.len(), 1);
    }
}
