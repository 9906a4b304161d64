//! Tests against an embedded DuckDB warehouse

#![cfg(feature = "duckdb-backend")]

mod common;

use common::{raw_cards, raw_date_events, raw_orders, raw_products, raw_stores, raw_users};
use retail_centralisation::clean::clean;
use retail_centralisation::config::EtlConfig;
use retail_centralisation::constraints::{
    ForeignKeyOutcome, ForeignKeySpec, PrimaryKeyOutcome, PruneOutcome, install_primary_key,
    install_relationship, prune_orphans,
};
use retail_centralisation::entity::{Entity, FACT_TABLE};
use retail_centralisation::extract::InMemoryExtractor;
use retail_centralisation::pipeline::PipelineExecutor;
use retail_centralisation::schema::{StatementOutcome, apply_plan, plan_for, primary_key};
use retail_centralisation::store::{SchemaExecutor, TableLoader, WarehouseDb};
use retail_centralisation::table::{Table, Value};
use tempfile::TempDir;

fn foreign_key_rows(db: &mut WarehouseDb) -> i64 {
    db.query_count(
        "SELECT COUNT(*) FROM duckdb_constraints() \
         WHERE table_name = 'orders_table' AND constraint_type = 'FOREIGN KEY'",
    )
    .unwrap()
}

fn load_cleaned(db: &mut WarehouseDb, entity: Entity, raw: Table) {
    let cleaned = clean(entity, raw).unwrap();
    db.load_table(entity.table(), &cleaned.table).unwrap();
}

#[test]
fn test_store_latitude_is_fixed_then_cast() {
    let mut db = WarehouseDb::memory().unwrap();
    load_cleaned(&mut db, Entity::Store, raw_stores());

    let report = apply_plan(&mut db, &plan_for(Entity::Store)).unwrap();

    assert!(matches!(
        report.outcome("latitude_na_to_zero"),
        Some(StatementOutcome::Applied { rows: 1 })
    ));
    assert!(matches!(
        report.outcome("type:latitude"),
        Some(StatementOutcome::Applied { .. })
    ));
    // The web store's longitude is "N/A" and has no fix
    assert!(matches!(
        report.outcome("type:longitude"),
        Some(StatementOutcome::Failed { .. })
    ));
    assert_eq!(
        db.column_type("dim_store_details", "latitude")
            .unwrap()
            .as_deref(),
        Some("DOUBLE")
    );
    assert_eq!(
        db.column_type("dim_store_details", "staff_numbers")
            .unwrap()
            .as_deref(),
        Some("SMALLINT")
    );

    let rows = db
        .query("SELECT latitude FROM dim_store_details ORDER BY store_code")
        .unwrap();
    assert_eq!(rows[0]["latitude"], serde_json::json!(-0.74934));
    assert_eq!(rows[1]["latitude"], serde_json::json!(0.0));
}

#[test]
fn test_primary_key_is_not_added_twice() {
    let mut db = WarehouseDb::memory().unwrap();
    load_cleaned(&mut db, Entity::Card, raw_cards());
    let spec = primary_key(Entity::Card).unwrap();

    match install_primary_key(&mut db, &spec) {
        PrimaryKeyOutcome::Added => {
            assert_eq!(
                install_primary_key(&mut db, &spec),
                PrimaryKeyOutcome::AlreadyPrimaryKey
            );
            assert_eq!(
                db.primary_key_columns("dim_card_details").unwrap(),
                vec!["card_number".to_string()]
            );
        }
        other => panic!("expected the key to be added, got {:?}", other),
    }
}

#[test]
fn test_orphan_orders_are_pruned() {
    let mut db = WarehouseDb::memory().unwrap();
    load_cleaned(&mut db, Entity::Card, raw_cards());
    load_cleaned(&mut db, Entity::Order, raw_orders());
    let spec = ForeignKeySpec::new(FACT_TABLE, "card_number", "dim_card_details", "card_number");

    assert_eq!(db.query_count(&spec.orphan_count_query()).unwrap(), 1);
    assert_eq!(prune_orphans(&mut db, &spec), PruneOutcome::Pruned { rows: 1 });
    assert_eq!(db.query_count(&spec.orphan_count_query()).unwrap(), 0);
    assert_eq!(
        db.query_count("SELECT COUNT(*) FROM orders_table").unwrap(),
        1
    );
}

#[test]
fn test_foreign_key_needs_pruning_first() {
    let mut db = WarehouseDb::memory().unwrap();
    load_cleaned(&mut db, Entity::Card, raw_cards());
    let pk = primary_key(Entity::Card).unwrap();
    assert_eq!(install_primary_key(&mut db, &pk), PrimaryKeyOutcome::Added);
    load_cleaned(&mut db, Entity::Order, raw_orders());
    let spec = ForeignKeySpec::new(FACT_TABLE, "card_number", "dim_card_details", "card_number");

    let unpruned = install_relationship(&mut db, &spec, false);
    assert_eq!(unpruned.prune, PruneOutcome::Disabled);
    assert_eq!(
        unpruned.outcome,
        ForeignKeyOutcome::ReferentialViolation { orphans: 1 }
    );
    assert_eq!(foreign_key_rows(&mut db), 0);

    let pruned = install_relationship(&mut db, &spec, true);
    assert_eq!(pruned.prune, PruneOutcome::Pruned { rows: 1 });
    assert_eq!(pruned.outcome, ForeignKeyOutcome::Installed);
    assert_eq!(foreign_key_rows(&mut db), 1);
    assert_eq!(
        db.query_count("SELECT COUNT(*) FROM orders_table").unwrap(),
        1
    );
}

#[test]
fn test_zero_price_loads_as_null() {
    let mut db = WarehouseDb::memory().unwrap();
    let raw = raw_products().with_row(vec![
        Value::from(2),
        Value::text("Gift Wrap Sample"),
        Value::text("£0.00"),
        Value::text("50g"),
        Value::text("homeware"),
        Value::text("5012345678900"),
        Value::text("2010-07-14"),
        Value::text("0b1c6f2e-3d4a-4e5f-8a9b-1c2d3e4f5a6b"),
        Value::text("Still_avaliable"),
        Value::text("H4-1234567z"),
    ]);
    load_cleaned(&mut db, Entity::Product, raw);

    let report = apply_plan(&mut db, &plan_for(Entity::Product)).unwrap();

    assert!(matches!(
        report.outcome("price_zero_to_null"),
        Some(StatementOutcome::Applied { rows: 1 })
    ));
    assert_eq!(
        db.query_count("SELECT COUNT(*) FROM dim_products WHERE product_price IS NULL")
            .unwrap(),
        1
    );
    assert_eq!(
        db.query_count("SELECT COUNT(*) FROM dim_products WHERE product_code = 'H4-1234567z' AND product_price IS NULL")
            .unwrap(),
        1
    );
}

#[test]
fn test_load_keeps_nulls() {
    let mut db = WarehouseDb::memory().unwrap();
    let table = Table::new(["card_number", "expiry_date"])
        .with_row(vec![Value::text("30060773296197"), Value::Null]);
    db.load_table("dim_card_details", &table).unwrap();

    assert_eq!(
        db.query_count("SELECT COUNT(*) FROM dim_card_details WHERE expiry_date IS NULL")
            .unwrap(),
        1
    );
}

#[test]
fn test_full_pipeline_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sales_data.duckdb");
    let config = EtlConfig::new().with_database(&path);
    let warehouse = WarehouseDb::open(path.to_str().unwrap()).unwrap();
    let extract = InMemoryExtractor::new()
        .with_table(Entity::User, raw_users())
        .with_table(Entity::Card, raw_cards())
        .with_table(Entity::Store, raw_stores())
        .with_table(Entity::Product, raw_products())
        .with_table(Entity::DateEvent, raw_date_events())
        .with_table(Entity::Order, raw_orders());

    let mut executor = PipelineExecutor::new(config, warehouse).unwrap();
    let report = executor.run_all(&extract).unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_eq!(report.entities.len(), 6);
    assert!(!report.integrity.skipped());
    assert_eq!(report.integrity.relationships.len(), 5);
    assert_eq!(report.integrity.installed(), 5);

    let card = report
        .integrity
        .relationships
        .iter()
        .find(|r| r.spec.column == "card_number")
        .unwrap();
    assert_eq!(card.prune, PruneOutcome::Pruned { rows: 1 });

    let mut db = executor.into_warehouse();
    let mut tables = db.table_names().unwrap();
    tables.sort();
    let mut expected: Vec<String> = Entity::ALL.iter().map(|e| e.table().to_string()).collect();
    expected.sort();
    assert_eq!(tables, expected);
    assert_eq!(
        db.query_count("SELECT COUNT(*) FROM orders_table").unwrap(),
        1
    );
    assert_eq!(foreign_key_rows(&mut db), 5);
    assert_eq!(
        db.column_type("dim_products", "still_available")
            .unwrap()
            .as_deref(),
        Some("BOOLEAN")
    );
    assert_eq!(
        db.query_count("SELECT COUNT(*) FROM dim_products WHERE still_available")
            .unwrap(),
        1
    );
}
