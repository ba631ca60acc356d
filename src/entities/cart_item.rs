use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Cart item row. Exactly one of `product_id` / `bundle_id` is set; use
/// [`CartLine`] to work with a validated view of the row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    pub bundle_id: Option<Uuid>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::bundle::Entity",
        from = "Column::BundleId",
        to = "super::bundle::Column::Id"
    )]
    Bundle,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Largest quantity a single cart or bundle line may hold
pub const MAX_LINE_QUANTITY: i32 = 1_000;

/// What a cart item refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartLine {
    Product { id: Uuid, quantity: i32 },
    Bundle { id: Uuid, quantity: i32 },
}

impl CartLine {
    pub fn quantity(&self) -> i32 {
        match self {
            CartLine::Product { quantity, .. } | CartLine::Bundle { quantity, .. } => *quantity,
        }
    }

    pub fn product_id(&self) -> Option<Uuid> {
        match self {
            CartLine::Product { id, .. } => Some(*id),
            CartLine::Bundle { .. } => None,
        }
    }

    pub fn bundle_id(&self) -> Option<Uuid> {
        match self {
            CartLine::Bundle { id, .. } => Some(*id),
            CartLine::Product { .. } => None,
        }
    }
}

impl TryFrom<&Model> for CartLine {
    type Error = ServiceError;

    fn try_from(item: &Model) -> Result<Self, Self::Error> {
        match (item.product_id, item.bundle_id) {
            (Some(id), None) => Ok(CartLine::Product {
                id,
                quantity: item.quantity,
            }),
            (None, Some(id)) => Ok(CartLine::Bundle {
                id,
                quantity: item.quantity,
            }),
            (None, None) => Err(ServiceError::InvalidState(format!(
                "Cart item {} references neither a product nor a bundle",
                item.id
            ))),
            (Some(_), Some(_)) => Err(ServiceError::InvalidState(format!(
                "Cart item {} references both a product and a bundle",
                item.id
            ))),
        }
    }
}
