use crate::filters::{drop_code_like_rows, drop_invalid_card_numbers};
use crate::table::Table;

use super::CleaningReport;

pub(super) fn clean(table: &mut Table, report: &mut CleaningReport) {
    report.filtered(
        "invalid card numbers",
        drop_invalid_card_numbers(table, "card_number"),
    );

    let dropped = drop_code_like_rows(table);
    report.note_dropped("code-like rows", dropped);
}
