use crate::entity::Entity;
use crate::filters::{
    coerce_integer, drop_code_like_rows, drop_non_integer_rows, drop_placeholder_rows,
};
use crate::normalize::{canonical_country_code, flatten_address, map_text, strip_non_digits};
use crate::table::{Table, Value};

use super::{CleanError, CleaningReport};

/// Columns the store cleaner cannot run without
pub const STORE_REQUIRED_COLUMNS: [&str; 6] = [
    "lat",
    "index",
    "continent",
    "address",
    "country_code",
    "staff_numbers",
];

pub(super) fn clean(table: &mut Table, report: &mut CleaningReport) -> Result<(), CleanError> {
    if let Some(missing) = STORE_REQUIRED_COLUMNS.iter().find(|c| !table.has_column(c)) {
        return Err(CleanError::MissingColumn {
            entity: Entity::Store,
            column: missing.to_string(),
        });
    }

    table.drop_column("lat");
    table.drop_column("index");

    let empty_rows = table
        .rows()
        .iter()
        .filter(|row| row.iter().all(Value::is_null))
        .count();
    if empty_rows > 0 {
        report.warn(format!("{empty_rows} rows hold only nulls"));
    }

    table.map_column("continent", |v| map_text(v, |s| s.replace("ee", "")));

    let dropped = drop_code_like_rows(table);
    report.note_dropped("code-like rows", dropped);

    table.map_column("address", |v| map_text(v, flatten_address));

    let dropped = drop_placeholder_rows(table);
    report.note_dropped("placeholder rows", dropped);

    table.map_column("country_code", |v| map_text(v, canonical_country_code));

    table.map_column("staff_numbers", |v| match v {
        Value::Integer(_) => v.clone(),
        other => other
            .to_text()
            .map(|s| Value::Text(strip_non_digits(&s)))
            .unwrap_or(Value::Null),
    });
    report.filtered(
        "non-numeric staff numbers",
        drop_non_integer_rows(table, "staff_numbers"),
    );
    table.map_column("staff_numbers", |v| coerce_integer(v).into());

    Ok(())
}
