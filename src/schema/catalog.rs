//! Schema plans and key constraints for each warehouse table

use crate::constraints::{ForeignKeySpec, PrimaryKeySpec};
use crate::entity::{Entity, FACT_TABLE};

use super::plan::SchemaPlan;
use super::types::{Reinterpret, SqlType};

/// Literal marking a product as still on sale
pub const STILL_AVAILABLE_FLAG: &str = "Still_avaliable";

/// Weight bands in kilograms, lower bound inclusive
const WEIGHT_CLASS_CASE: &str = "CASE \
    WHEN \"weight (kg)\" < 2 THEN 'Light' \
    WHEN \"weight (kg)\" >= 2 AND \"weight (kg)\" < 40 THEN 'Mid_Sized' \
    WHEN \"weight (kg)\" >= 40 AND \"weight (kg)\" < 140 THEN 'Heavy' \
    WHEN \"weight (kg)\" >= 140 THEN 'Truck_Required' \
    ELSE NULL END";

/// The schema plan applied after an entity's table is loaded
pub fn plan_for(entity: Entity) -> SchemaPlan {
    let table = entity.table();
    match entity {
        Entity::User => SchemaPlan::new(table)
            .alter("first_name", SqlType::Varchar(Some(255)))
            .alter("last_name", SqlType::Varchar(Some(255)))
            .alter_using("date_of_birth", SqlType::Date, Reinterpret::Cast)
            .alter("country_code", SqlType::Varchar(Some(2)))
            .alter_using("user_uuid", SqlType::Uuid, Reinterpret::Cast)
            .alter_using("join_date", SqlType::Date, Reinterpret::Cast),

        Entity::Card => SchemaPlan::new(table)
            .alter("card_number", SqlType::Varchar(Some(255)))
            .alter("expiry_date", SqlType::Varchar(Some(255)))
            .alter_using("date_payment_confirmed", SqlType::Date, Reinterpret::Cast),

        Entity::Store => SchemaPlan::new(table)
            .fix(
                "latitude_backfill",
                "latitude",
                "COALESCE(\"latitude\", \"longitude\")",
                None,
            )
            .alter_using("longitude", SqlType::Float, Reinterpret::Cast)
            .alter("locality", SqlType::Varchar(Some(255)))
            .alter("store_code", SqlType::Varchar(None))
            .alter("staff_numbers", SqlType::SmallInt)
            .alter_using("opening_date", SqlType::Date, Reinterpret::Cast)
            .alter("store_type", SqlType::Varchar(Some(255)))
            .fix(
                "latitude_na_to_zero",
                "latitude",
                "'0'",
                Some("\"latitude\" = 'N/A'"),
            )
            .after(&["latitude_backfill"])
            .alter_using("latitude", SqlType::Float, Reinterpret::Cast)
            .after(&["latitude_backfill", "latitude_na_to_zero"])
            .alter("country_code", SqlType::Varchar(Some(2)))
            .alter("continent", SqlType::Varchar(Some(255))),

        Entity::Product => SchemaPlan::new(table)
            .fix(
                "price_strip_currency",
                "product_price",
                "REPLACE(REPLACE(CAST(\"product_price\" AS VARCHAR), 'Â£', ''), '£', '')",
                None,
            )
            .add_column("weight_class_add", "weight_class", SqlType::Varchar(Some(255)))
            .derive("weight_class_compute", "weight_class", WEIGHT_CLASS_CASE)
            .after(&["weight_class_add"])
            .alter_using("product_price", SqlType::Float, Reinterpret::Cast)
            .after(&["price_strip_currency"])
            .fix(
                "price_zero_to_null",
                "product_price",
                "NULL",
                Some("\"product_price\" = 0"),
            )
            .after(&["type:product_price"])
            .alter("weight (kg)", SqlType::Float)
            .after(&["weight_class_compute"])
            .alter("EAN", SqlType::Varchar(None))
            .alter("product_code", SqlType::Varchar(None))
            .alter_using("date_added", SqlType::Date, Reinterpret::Cast)
            .alter_using("uuid", SqlType::Uuid, Reinterpret::Cast)
            .alter_using(
                "still_available",
                SqlType::Boolean,
                Reinterpret::Equals(STILL_AVAILABLE_FLAG.to_string()),
            )
            .alter("weight_class", SqlType::Varchar(None))
            .after(&["weight_class_compute"]),

        Entity::DateEvent => SchemaPlan::new(table)
            .alter("month", SqlType::Varchar(Some(40)))
            .alter("day", SqlType::Varchar(Some(40)))
            .alter("year", SqlType::Varchar(Some(255)))
            .alter("time_period", SqlType::Varchar(Some(255)))
            .alter_using("date_uuid", SqlType::Uuid, Reinterpret::Cast),

        Entity::Order => SchemaPlan::new(table)
            .alter("product_quantity", SqlType::SmallInt)
            .alter("store_code", SqlType::Varchar(None))
            .alter("card_number", SqlType::Varchar(None))
            .alter_using("user_uuid", SqlType::Uuid, Reinterpret::Cast)
            .alter_using("date_uuid", SqlType::Uuid, Reinterpret::Cast)
            .alter("product_code", SqlType::Varchar(None)),
    }
}

/// Primary key of a dimension table, `None` for the fact table
pub fn primary_key(entity: Entity) -> Option<PrimaryKeySpec> {
    entity
        .natural_key()
        .map(|column| PrimaryKeySpec::new(entity.table(), column))
}

/// Foreign keys from the fact table to every dimension
pub fn foreign_keys() -> Vec<ForeignKeySpec> {
    Entity::DIMENSIONS
        .iter()
        .filter_map(|dimension| {
            dimension
                .natural_key()
                .map(|column| ForeignKeySpec::new(FACT_TABLE, column, dimension.table(), column))
        })
        .collect()
}
