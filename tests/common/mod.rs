//! Shared test fixtures

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use retail_centralisation::store::{SchemaExecutor, StoreError, TableLoader};
use retail_centralisation::table::{Table, Value};

/// Warehouse double that records statements and fails on request
#[derive(Debug, Default)]
pub struct ScriptedWarehouse {
    pub executed: Vec<String>,
    pub tables: BTreeMap<String, Table>,
    pub primary_keys: BTreeMap<String, Vec<String>>,
    /// Orphan count per fact-table column, cleared by a prune of that column
    pub orphans: BTreeMap<String, i64>,
    fail_on: Vec<String>,
}

impl ScriptedWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement containing `fragment`
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    pub fn with_orphans(mut self, column: &str, count: i64) -> Self {
        self.orphans.insert(column.to_string(), count);
        self
    }

    pub fn with_table(mut self, name: &str) -> Self {
        self.tables.insert(name.to_string(), Table::new(["id"]));
        self
    }

    pub fn with_primary_key(mut self, table: &str, column: &str) -> Self {
        self.primary_keys
            .insert(table.to_string(), vec![column.to_string()]);
        self
    }

    /// Statements containing `fragment`
    pub fn executed_matching(&self, fragment: &str) -> Vec<&String> {
        self.executed
            .iter()
            .filter(|sql| sql.contains(fragment))
            .collect()
    }

    pub fn table_names(&self) -> BTreeSet<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    fn column_in(&self, sql: &str) -> Option<String> {
        self.orphans
            .keys()
            .find(|column| sql.contains(&format!("\"{}\"", column)))
            .cloned()
    }
}

impl SchemaExecutor for ScriptedWarehouse {
    fn execute(&mut self, sql: &str) -> Result<usize, StoreError> {
        self.executed.push(sql.to_string());
        if self.fail_on.iter().any(|f| sql.contains(f.as_str())) {
            return Err(StoreError::Statement {
                sql: sql.to_string(),
                message: "scripted failure".to_string(),
            });
        }

        if sql.starts_with("DELETE FROM") {
            if let Some(column) = self.column_in(sql) {
                let removed = self.orphans.insert(column, 0).unwrap_or(0);
                return Ok(removed as usize);
            }
            return Ok(0);
        }

        if let Some(rest) = sql.strip_prefix("ALTER TABLE \"") {
            if let Some((table, tail)) = rest.split_once('"') {
                if let Some(key) = tail.strip_prefix(" ADD PRIMARY KEY (\"") {
                    let column = key.trim_end_matches("\")");
                    self.primary_keys
                        .entry(table.to_string())
                        .or_default()
                        .push(column.to_string());
                }
            }
        }
        Ok(0)
    }

    fn query_count(&mut self, sql: &str) -> Result<i64, StoreError> {
        self.executed.push(sql.to_string());
        Ok(self
            .column_in(sql)
            .and_then(|column| self.orphans.get(&column).copied())
            .unwrap_or(0))
    }

    fn primary_key_columns(&mut self, table: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.primary_keys.get(table).cloned().unwrap_or_default())
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        Ok(self.tables.contains_key(table))
    }
}

impl TableLoader for ScriptedWarehouse {
    fn load_table(&mut self, name: &str, table: &Table) -> Result<usize, StoreError> {
        self.tables.insert(name.to_string(), table.clone());
        self.primary_keys.remove(name);
        Ok(table.len())
    }
}

/// Raw extracts covering every entity, with one orphan order
pub fn raw_users() -> Table {
    Table::new([
        "index",
        "first_name",
        "last_name",
        "date_of_birth",
        "company",
        "email_address",
        "address",
        "country",
        "country_code",
        "phone_number",
        "join_date",
        "user_uuid",
    ])
    .with_row(vec![
        Value::from(0),
        Value::text("Sigfried"),
        Value::text("Noack"),
        Value::text("1990-09-30"),
        Value::text("Heydrich Junck"),
        Value::text("rudi79@winkler.de"),
        Value::text("Zimmerstr. 1/0\n59015 Gießen"),
        Value::text("Germany"),
        Value::text("DE"),
        Value::text("+49(0) 047905356"),
        Value::text("2018-10-10"),
        Value::text("93caf182-e4e9-4c6e-bebb-60a1a9dcf9b8"),
    ])
    .with_row(vec![
        Value::from(1),
        Value::text("Guy"),
        Value::text("Allen"),
        Value::text("1940 December 01"),
        Value::text("Fox Ltd"),
        Value::text("rhodesclifford@@henderson.com"),
        Value::text("Studio 22a\nLake Darrenberg\nCR0 6DQ"),
        Value::text("United Kingdom"),
        Value::text("GGB"),
        Value::text("(0161) 496 0674"),
        Value::text("2001 July 16"),
        Value::text("8fe96c3a-d62d-4eb5-b313-cf12d9126a49"),
    ])
    .with_row(vec![
        Value::from(2),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
        Value::text("NULL"),
    ])
}

pub fn raw_cards() -> Table {
    Table::new([
        "card_number",
        "expiry_date",
        "card_provider",
        "date_payment_confirmed",
    ])
    .with_row(vec![
        Value::text("30060773296197"),
        Value::text("09/26"),
        Value::text("Diners Club / Carte Blanche"),
        Value::text("2015-11-25"),
    ])
    .with_row(vec![
        Value::text("?4971858637664481"),
        Value::text("09/23"),
        Value::text("VISA 16 digit"),
        Value::text("2001-06-18"),
    ])
}

pub fn raw_stores() -> Table {
    Table::new([
        "index",
        "address",
        "longitude",
        "lat",
        "locality",
        "store_code",
        "staff_numbers",
        "opening_date",
        "store_type",
        "latitude",
        "country_code",
        "continent",
    ])
    .with_row(vec![
        Value::from(0),
        Value::text("N/A"),
        Value::text("N/A"),
        Value::Null,
        Value::text("N/A"),
        Value::text("WEB-1388012W"),
        Value::text("325"),
        Value::text("2010-06-12"),
        Value::text("Web Portal"),
        Value::text("N/A"),
        Value::text("GB"),
        Value::text("eeEurope"),
    ])
    .with_row(vec![
        Value::from(1),
        Value::text("Flat 72W\nSally isle\nEast Deantown\nE7B 8EB"),
        Value::text("51.62907"),
        Value::Null,
        Value::text("High Wycombe"),
        Value::text("HI-9B97EE4E"),
        Value::text("3J4"),
        Value::text("1996-10-25"),
        Value::text("Local"),
        Value::text("-0.74934"),
        Value::text("GB"),
        Value::text("Europe"),
    ])
}

pub fn raw_products() -> Table {
    Table::new([
        "Unnamed: 0",
        "product_name",
        "product_price",
        "weight",
        "category",
        "EAN",
        "date_added",
        "uuid",
        "removed",
        "product_code",
    ])
    .with_row(vec![
        Value::from(0),
        Value::text("FurReal Dazzlin' Dimples My Playful Dolphin"),
        Value::text("£39.99"),
        Value::text("1.6kg"),
        Value::text("toys-and-games"),
        Value::text("7425710935115"),
        Value::text("2005-12-02"),
        Value::text("83dc0a69-f96f-4c34-bcb7-928acae19a94"),
        Value::text("Still_avaliable"),
        Value::text("R7-3126933h"),
    ])
    .with_row(vec![
        Value::from(1),
        Value::text("Tiffany's Pearl Necklace"),
        Value::text("£12.00"),
        Value::text("12 x 100g"),
        Value::text("homeware"),
        Value::text("3415874163402"),
        Value::text("2006-03-11"),
        Value::text("5f1e7b53-9f0b-4a1e-9ae4-c4a1f4d2b0a1"),
        Value::text("Removed"),
        Value::text("C2-7287916l"),
    ])
}

pub fn raw_date_events() -> Table {
    Table::new(["timestamp", "month", "year", "day", "time_period", "date_uuid"])
        .with_row(vec![
            Value::text("22:00:06"),
            Value::text("9"),
            Value::text("2012"),
            Value::text("19"),
            Value::text("Evening"),
            Value::text("3b7ca996-37f9-433f-b6d0-ce8391b615ad"),
        ])
        .with_row(vec![
            Value::text("22:44:06"),
            Value::text("2"),
            Value::text("1997"),
            Value::text("10"),
            Value::text("Evening"),
            Value::text("adc86836-6c35-49ca-bb0d-65b6507a00fa"),
        ])
}

pub fn raw_orders() -> Table {
    Table::new([
        "level_0",
        "index",
        "date_uuid",
        "first_name",
        "last_name",
        "user_uuid",
        "card_number",
        "store_code",
        "product_code",
        "1",
        "product_quantity",
    ])
    .with_row(vec![
        Value::from(0),
        Value::from(0),
        Value::text("3b7ca996-37f9-433f-b6d0-ce8391b615ad"),
        Value::Null,
        Value::Null,
        Value::text("93caf182-e4e9-4c6e-bebb-60a1a9dcf9b8"),
        Value::text("30060773296197"),
        Value::text("HI-9B97EE4E"),
        Value::text("R7-3126933h"),
        Value::Null,
        Value::from(3),
    ])
    .with_row(vec![
        Value::from(1),
        Value::from(1),
        Value::text("adc86836-6c35-49ca-bb0d-65b6507a00fa"),
        Value::Null,
        Value::Null,
        Value::text("8fe96c3a-d62d-4eb5-b313-cf12d9126a49"),
        Value::text("4252720361802860591"),
        Value::text("WEB-1388012W"),
        Value::text("C2-7287916l"),
        Value::Null,
        Value::from(1),
    ])
}
