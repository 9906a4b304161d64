//! Retail entities and the warehouse tables they land in

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fact table every dimension is referenced from
pub const FACT_TABLE: &str = "orders_table";

/// A retail entity with its own extract, cleaner and target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    User,
    Card,
    Store,
    Product,
    DateEvent,
    Order,
}

impl Entity {
    /// All entities, dimensions first and the fact table last
    pub const ALL: [Entity; 6] = [
        Entity::User,
        Entity::Card,
        Entity::Store,
        Entity::Product,
        Entity::DateEvent,
        Entity::Order,
    ];

    /// The five dimension entities
    pub const DIMENSIONS: [Entity; 5] = [
        Entity::User,
        Entity::Card,
        Entity::Store,
        Entity::Product,
        Entity::DateEvent,
    ];

    /// Short name used on the command line and in configuration
    pub fn name(&self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Card => "card",
            Entity::Store => "store",
            Entity::Product => "product",
            Entity::DateEvent => "date_event",
            Entity::Order => "order",
        }
    }

    /// Warehouse table the cleaned data is loaded into
    pub fn table(&self) -> &'static str {
        match self {
            Entity::User => "dim_users_table",
            Entity::Card => "dim_card_details",
            Entity::Store => "dim_store_details",
            Entity::Product => "dim_products",
            Entity::DateEvent => "dim_date_times",
            Entity::Order => FACT_TABLE,
        }
    }

    /// Natural key column, `None` for the fact table
    pub fn natural_key(&self) -> Option<&'static str> {
        match self {
            Entity::User => Some("user_uuid"),
            Entity::Card => Some("card_number"),
            Entity::Store => Some("store_code"),
            Entity::Product => Some("product_code"),
            Entity::DateEvent => Some("date_uuid"),
            Entity::Order => None,
        }
    }

    /// Whether this entity is a dimension
    pub fn is_dimension(&self) -> bool {
        !matches!(self, Entity::Order)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "users" => Ok(Entity::User),
            "card" | "cards" => Ok(Entity::Card),
            "store" | "stores" => Ok(Entity::Store),
            "product" | "products" => Ok(Entity::Product),
            "date_event" | "date-event" | "date_events" => Ok(Entity::DateEvent),
            "order" | "orders" => Ok(Entity::Order),
            _ => Err(format!(
                "Invalid entity: {}. Expected: user, card, store, product, order, date_event",
                s
            )),
        }
    }
}
