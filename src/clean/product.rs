use crate::filters::drop_code_like_rows;
use crate::normalize::weight_value;
use crate::table::{Table, Value};

use super::{CleaningReport, drop_column, map_column};

/// Renames applied once the rows are filtered
const RENAMES: [(&str, &str); 2] = [("weight", "weight (kg)"), ("removed", "still_available")];

pub(super) fn clean(table: &mut Table, report: &mut CleaningReport) {
    drop_column(table, report, "Unnamed: 0");

    let dropped = drop_code_like_rows(table);
    report.note_dropped("code-like rows", dropped);

    let dropped = table.retain_rows(|row| !row.iter().any(Value::is_null));
    report.note_dropped("rows with missing values", dropped);

    for (from, to) in RENAMES {
        if !table.rename_column(from, to) {
            report.skipped("rename", from);
        }
    }

    map_column(table, report, "parse weight", "weight (kg)", weight_value);
}

#[cfg(test)]
mod tests {
    use crate::clean::clean;
    use crate::entity::Entity;
    use crate::table::{Table, Value};

    #[test]
    fn test_product_end_to_end() {
        let raw = Table::new([
            "Unnamed: 0",
            "product_name",
            "product_price",
            "weight",
            "removed",
            "product_code",
        ])
        .with_row(vec![
            0.into(),
            "Oats".into(),
            "£1.50".into(),
            "3 x 100g".into(),
            "Still_avaliable".into(),
            "R7-3126933h".into(),
        ])
        .with_row(vec![
            1.into(),
            "Beans".into(),
            Value::Null,
            "400g".into(),
            "Removed".into(),
            "C2-7287916l".into(),
        ]);

        let cleaned = clean(Entity::Product, raw).unwrap();
        let table = &cleaned.table;

        assert_eq!(
            table.columns(),
            &[
                "product_name",
                "product_price",
                "weight (kg)",
                "still_available",
                "product_code"
            ]
        );
        assert_eq!(table.len(), 1);
        let kg = table.get(0, "weight (kg)").and_then(Value::as_float).unwrap();
        assert!((kg - 0.3).abs() < 1e-9);
        assert_eq!(
            table.get(0, "still_available"),
            Some(&Value::text("Still_avaliable"))
        );
    }

    #[test]
    fn test_unparsable_weight_is_null() {
        let raw = Table::new(["product_name", "weight"]).with_row(vec!["Rope".into(), "long".into()]);
        let cleaned = clean(Entity::Product, raw).unwrap();
        assert_eq!(cleaned.table.get(0, "weight (kg)"), Some(&Value::Null));
        assert_eq!(cleaned.table.len(), 1);
    }

    #[test]
    fn test_weight_with_newline_is_null() {
        let raw = Table::new(["product_name", "weight"])
            .with_row(vec!["Kettle".into(), "1kg\n".into()])
            .with_row(vec!["Toaster".into(), "2kg".into()]);
        let cleaned = clean(Entity::Product, raw).unwrap();
        assert_eq!(cleaned.table.get(0, "weight (kg)"), Some(&Value::Null));
        assert_eq!(cleaned.table.get(1, "weight (kg)"), Some(&Value::Float(2.0)));
    }
}
