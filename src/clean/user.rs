use crate::filters::drop_code_like_rows;
use crate::normalize::{canonical_country_code, canonical_email, date_value, flatten_address, map_text};
use crate::table::Table;

use super::{CleaningReport, drop_column, map_column};

pub(super) fn clean(table: &mut Table, report: &mut CleaningReport) {
    drop_column(table, report, "index");

    let dropped = drop_code_like_rows(table);
    report.note_dropped("code-like rows", dropped);

    map_column(table, report, "flatten address", "address", |v| {
        map_text(v, flatten_address)
    });
    map_column(table, report, "canonical email", "email_address", |v| {
        map_text(v, canonical_email)
    });
    map_column(table, report, "canonical country code", "country_code", |v| {
        map_text(v, canonical_country_code)
    });

    for column in ["date_of_birth", "join_date"] {
        map_column(table, report, "parse date", column, date_value);
    }
}
