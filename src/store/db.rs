//! DuckDB warehouse

use std::path::PathBuf;

use tracing::{debug, info};

use crate::constraints::ForeignKeySpec;
use crate::schema::{SqlType, quote_ident};
use crate::table::Table;

use super::{SchemaExecutor, StoreError, TableLoader, infer_column_type};

/// Embedded DuckDB warehouse
pub struct WarehouseDb {
    conn: duckdb::Connection,
    path: Option<String>,
}

impl WarehouseDb {
    /// Open or create a warehouse at the given path
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = duckdb::Connection::open(path).map_err(|e| StoreError::Open {
            path: PathBuf::from(path),
            message: e.to_string(),
        })?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory warehouse (for testing)
    pub fn memory() -> Result<Self, StoreError> {
        let conn = duckdb::Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Get the database path (if not in-memory)
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Names of all tables in the main schema
    pub fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// Declared type of a column, `None` when the column does not exist
    pub fn column_type(&self, table: &str, column: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT data_type FROM information_schema.columns
             WHERE table_name = ?1 AND column_name = ?2",
        )?;
        let mut rows = stmt.query_map([table, column], |row| row.get::<_, String>(0))?;
        Ok(rows.next().transpose()?)
    }

    /// Execute a query and return results as JSON
    pub fn query(&self, sql: &str) -> Result<Vec<serde_json::Value>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let column_count = rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let column_names: Vec<String> = (0..column_count)
            .map(|i| {
                rows.as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let mut obj = serde_json::Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value: duckdb::types::Value = row.get(i)?;
                obj.insert(name.clone(), json_value(value));
            }
            results.push(serde_json::Value::Object(obj));
        }
        Ok(results)
    }
}

fn json_value(value: duckdb::types::Value) -> serde_json::Value {
    use duckdb::types::Value as Db;
    use serde_json::Value as Json;

    match value {
        Db::Null => Json::Null,
        Db::Boolean(b) => Json::Bool(b),
        Db::TinyInt(n) => Json::Number(n.into()),
        Db::SmallInt(n) => Json::Number(n.into()),
        Db::Int(n) => Json::Number(n.into()),
        Db::BigInt(n) => Json::Number(n.into()),
        Db::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Db::Double(f) => serde_json::Number::from_f64(f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Db::Text(s) => Json::String(s),
        other => Json::String(format!("{:?}", other)),
    }
}

/// Foreign key clauses declared on a table, as DuckDB renders them
///
/// With `except_referenced`, clauses pointing at that table are left out.
fn foreign_key_clauses(
    conn: &duckdb::Connection,
    table: &str,
    except_referenced: Option<&str>,
) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT constraint_text FROM duckdb_constraints()
         WHERE table_name = ?1 AND constraint_type = 'FOREIGN KEY'
           AND referenced_table IS DISTINCT FROM ?2
         ORDER BY constraint_index",
    )?;
    let rows = stmt.query_map(
        duckdb::params![table, except_referenced],
        |row| row.get::<_, String>(0),
    )?;
    let mut clauses = Vec::new();
    for row in rows {
        clauses.push(row?);
    }
    Ok(clauses)
}

/// Column definitions of a table in declaration order
fn column_definitions(conn: &duckdb::Connection, table: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT column_name, data_type FROM information_schema.columns
         WHERE table_schema = 'main' AND table_name = ?1
         ORDER BY ordinal_position",
    )?;
    let rows = stmt.query_map([table], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut definitions = Vec::new();
    for row in rows {
        let (name, ty) = row?;
        definitions.push(format!("{} {}", quote_ident(&name), ty));
    }
    Ok(definitions)
}

/// Recreate a table with the given foreign key clauses, keeping its rows
///
/// DuckDB only accepts foreign keys in `CREATE TABLE`. Column types and rows
/// carry over; other constraints on the table do not.
fn rebuild_with_foreign_keys(
    conn: &duckdb::Connection,
    table: &str,
    clauses: &[String],
) -> Result<(), StoreError> {
    let mut definitions = column_definitions(conn, table)?;
    if definitions.is_empty() {
        return Err(StoreError::Database(format!("Cannot rebuild {table}: no columns found")));
    }
    definitions.extend(clauses.iter().cloned());

    let target = quote_ident(table);
    let scratch = quote_ident(&format!("{table}__rebuild"));
    let sql = format!(
        "CREATE TEMP TABLE {scratch} AS SELECT * FROM {target};
         DROP TABLE {target};
         CREATE TABLE {target} ({});
         INSERT INTO {target} SELECT * FROM {scratch};
         DROP TABLE {scratch};",
        definitions.join(", ")
    );
    conn.execute_batch(&sql).map_err(|e| StoreError::Statement {
        sql,
        message: e.to_string(),
    })
}

/// Drop foreign keys in other tables that reference `table`, so it can be replaced
fn release_references(conn: &duckdb::Connection, table: &str) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT table_name FROM duckdb_constraints()
         WHERE constraint_type = 'FOREIGN KEY' AND referenced_table = ?1 AND table_name <> ?1",
    )?;
    let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;
    let mut dependents = Vec::new();
    for row in rows {
        dependents.push(row?);
    }

    for dependent in dependents {
        let kept = foreign_key_clauses(conn, &dependent, Some(table))?;
        rebuild_with_foreign_keys(conn, &dependent, &kept)?;
        info!(table = %dependent, referenced = table, "Released foreign keys before reload");
    }
    Ok(())
}

impl SchemaExecutor for WarehouseDb {
    fn execute(&mut self, sql: &str) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let rows = tx.execute(sql, []).map_err(|e| StoreError::Statement {
            sql: sql.to_string(),
            message: e.to_string(),
        })?;
        tx.commit()?;
        debug!(sql, rows, "Committed statement");
        Ok(rows)
    }

    fn query_count(&mut self, sql: &str) -> Result<i64, StoreError> {
        self.conn
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .map_err(|e| StoreError::Statement {
                sql: sql.to_string(),
                message: e.to_string(),
            })
    }

    fn primary_key_columns(&mut self, table: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT UNNEST(constraint_column_names) FROM duckdb_constraints()
             WHERE table_name = ?1 AND constraint_type = 'PRIMARY KEY'",
        )?;
        let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Rebuild the table with the new key alongside the ones it already has
    fn add_foreign_key(&mut self, spec: &ForeignKeySpec) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM duckdb_constraints()
             WHERE table_name = ?1 AND constraint_type = 'FOREIGN KEY'
               AND list_contains(constraint_column_names, CAST(?2 AS VARCHAR))",
            [spec.table.as_str(), spec.column.as_str()],
            |row| row.get(0),
        )?;
        if existing > 0 {
            debug!(table = %spec.table, column = %spec.column, "Foreign key already present");
            return Ok(());
        }

        let mut clauses = foreign_key_clauses(&tx, &spec.table, None)?;
        clauses.push(spec.clause());
        rebuild_with_foreign_keys(&tx, &spec.table, &clauses)?;
        tx.commit()?;

        debug!(table = %spec.table, keys = clauses.len(), "Rebuilt table with foreign keys");
        Ok(())
    }
}

impl TableLoader for WarehouseDb {
    fn load_table(&mut self, name: &str, table: &Table) -> Result<usize, StoreError> {
        if table.columns().is_empty() {
            return Err(StoreError::Database(format!(
                "Cannot load {name}: the table has no columns"
            )));
        }

        let types: Vec<SqlType> = table
            .columns()
            .iter()
            .map(|column| {
                table
                    .column_values(column)
                    .map(infer_column_type)
                    .unwrap_or(SqlType::Varchar(None))
            })
            .collect();

        let definitions = table
            .columns()
            .iter()
            .zip(&types)
            .map(|(column, ty)| format!("{} {}", quote_ident(column), ty))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = types
            .iter()
            .map(|ty| format!("CAST(? AS {})", ty))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        release_references(&tx, name)?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({definitions});",
            table = quote_ident(name)
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                quote_ident(name),
                placeholders
            ))?;
            for row in table.rows() {
                let params: Vec<Option<String>> = row.iter().map(|v| v.to_text()).collect();
                stmt.execute(duckdb::params_from_iter(params))?;
            }
        }
        tx.commit()?;

        info!(table = name, rows = table.len(), columns = types.len(), "Loaded table");
        Ok(table.len())
    }
}

impl From<duckdb::Error> for StoreError {
    fn from(err: duckdb::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn test_load_replaces_table() {
        let mut db = WarehouseDb::memory().unwrap();
        let table = Table::new(["store_code", "staff_numbers", "longitude"])
            .with_row(vec!["WEB-1388012W".into(), 325.into(), Value::Null])
            .with_row(vec!["HI-9B97EE4E".into(), 34.into(), "-0.75".into()]);

        assert_eq!(db.load_table("dim_store_details", &table).unwrap(), 2);
        assert_eq!(db.load_table("dim_store_details", &table).unwrap(), 2);
        assert_eq!(
            db.query_count("SELECT COUNT(*) FROM \"dim_store_details\"").unwrap(),
            2
        );
        assert_eq!(
            db.column_type("dim_store_details", "staff_numbers").unwrap().as_deref(),
            Some("BIGINT")
        );
        assert_eq!(db.table_names().unwrap(), vec!["dim_store_details".to_string()]);
        assert!(db.table_exists("dim_store_details").unwrap());
        assert!(!db.table_exists("orders_table").unwrap());
    }

    #[test]
    fn test_failed_statement_is_rolled_back() {
        let mut db = WarehouseDb::memory().unwrap();
        let table = Table::new(["latitude"]).with_row(vec!["N/A".into()]);
        db.load_table("dim_store_details", &table).unwrap();

        let err = db
            .execute("ALTER TABLE \"dim_store_details\" ALTER COLUMN \"latitude\" TYPE FLOAT8 USING CAST(\"latitude\" AS FLOAT8)")
            .unwrap_err();
        assert!(matches!(err, StoreError::Statement { .. }));

        // The connection is usable and the column untouched
        assert_eq!(
            db.column_type("dim_store_details", "latitude").unwrap().as_deref(),
            Some("VARCHAR")
        );
        assert_eq!(
            db.execute("UPDATE \"dim_store_details\" SET \"latitude\" = '0' WHERE \"latitude\" = 'N/A'")
                .unwrap(),
            1
        );
    }

    fn keyed_card_and_orders(db: &mut WarehouseDb) -> ForeignKeySpec {
        let cards = Table::new(["card_number"])
            .with_row(vec!["4971858637664481".into()])
            .with_row(vec!["3510184216171131".into()]);
        let orders = Table::new(["index", "card_number"])
            .with_row(vec![0.into(), "4971858637664481".into()])
            .with_row(vec![1.into(), "3510184216171131".into()]);
        db.load_table("dim_card_details", &cards).unwrap();
        db.execute("ALTER TABLE \"dim_card_details\" ADD PRIMARY KEY (\"card_number\")")
            .unwrap();
        db.load_table("orders_table", &orders).unwrap();
        ForeignKeySpec::new("orders_table", "card_number", "dim_card_details", "card_number")
    }

    fn foreign_key_count(db: &mut WarehouseDb) -> i64 {
        db.query_count(
            "SELECT COUNT(*) FROM duckdb_constraints() \
             WHERE table_name = 'orders_table' AND constraint_type = 'FOREIGN KEY'",
        )
        .unwrap()
    }

    #[test]
    fn test_foreign_key_added_by_rebuild() {
        let mut db = WarehouseDb::memory().unwrap();
        let spec = keyed_card_and_orders(&mut db);

        db.add_foreign_key(&spec).unwrap();
        assert_eq!(foreign_key_count(&mut db), 1);
        assert_eq!(db.query_count("SELECT COUNT(*) FROM \"orders_table\"").unwrap(), 2);
        assert_eq!(
            db.column_type("orders_table", "index").unwrap().as_deref(),
            Some("BIGINT")
        );

        // Already present, nothing to do
        db.add_foreign_key(&spec).unwrap();
        assert_eq!(foreign_key_count(&mut db), 1);

        // Enforced from now on
        assert!(
            db.execute("INSERT INTO \"orders_table\" VALUES (2, '0000000000000000')")
                .is_err()
        );
    }

    #[test]
    fn test_foreign_key_rejected_with_orphans() {
        let mut db = WarehouseDb::memory().unwrap();
        let spec = keyed_card_and_orders(&mut db);
        db.execute("INSERT INTO \"orders_table\" VALUES (2, '0000000000000000')")
            .unwrap();

        assert!(db.add_foreign_key(&spec).is_err());
        assert_eq!(foreign_key_count(&mut db), 0);
        assert_eq!(db.query_count("SELECT COUNT(*) FROM \"orders_table\"").unwrap(), 3);
    }

    #[test]
    fn test_referenced_dimension_can_be_reloaded() {
        let mut db = WarehouseDb::memory().unwrap();
        let spec = keyed_card_and_orders(&mut db);
        db.add_foreign_key(&spec).unwrap();

        let cards = Table::new(["card_number"]).with_row(vec!["4971858637664481".into()]);
        assert_eq!(db.load_table("dim_card_details", &cards).unwrap(), 1);
        assert_eq!(foreign_key_count(&mut db), 0);
        assert_eq!(db.query_count("SELECT COUNT(*) FROM \"orders_table\"").unwrap(), 2);
    }
}
