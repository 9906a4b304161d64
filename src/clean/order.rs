use crate::table::Table;

use super::{CleaningReport, drop_column};

/// Tracking and personal columns the fact table does not keep
const DROPPED_COLUMNS: [&str; 5] = ["level_0", "index", "1", "first_name", "last_name"];

pub(super) fn clean(table: &mut Table, report: &mut CleaningReport) {
    for column in DROPPED_COLUMNS {
        drop_column(table, report, column);
    }

    match table.column_index("card_number") {
        Some(idx) => {
            let dropped = table.retain_rows(|row| !row[idx].is_null());
            report.note_dropped("missing card number", dropped);
        }
        None => report.skipped("missing card number", "card_number"),
    }
}
