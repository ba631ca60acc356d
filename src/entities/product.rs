use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Concession product entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_price: Decimal,
    /// Flat per-unit discount subtracted from `unit_price`
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub discount: Decimal,
    pub inventory_quantity: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bundle_item::Entity")]
    BundleItems,
}

impl Related<super::bundle_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BundleItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Price of a single unit after the product-level discount
    pub fn effective_unit_price(&self) -> Decimal {
        self.unit_price - self.discount
    }
}
