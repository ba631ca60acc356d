use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::cart_item;
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

#[derive(Debug)]
pub struct CartRepository<'c, C> {
    base: BaseRepository<'c, C>,
}

impl<'c, C: ConnectionTrait> CartRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    /// Every item currently in the customer's cart, oldest first
    pub async fn find_cart_items(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<cart_item::Model>, ServiceError> {
        Ok(cart_item::Entity::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(self.base.conn())
            .await?)
    }

    pub async fn get_cart_item(&self, id: Uuid) -> Result<cart_item::Model, ServiceError> {
        cart_item::Entity::find_by_id(id)
            .one(self.base.conn())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", id)))
    }

    pub async fn find_matching_item(
        &self,
        customer_id: Uuid,
        product_id: Option<Uuid>,
        bundle_id: Option<Uuid>,
    ) -> Result<Option<cart_item::Model>, ServiceError> {
        let mut query =
            cart_item::Entity::find().filter(cart_item::Column::CustomerId.eq(customer_id));
        query = match product_id {
            Some(id) => query.filter(cart_item::Column::ProductId.eq(id)),
            None => query.filter(cart_item::Column::ProductId.is_null()),
        };
        query = match bundle_id {
            Some(id) => query.filter(cart_item::Column::BundleId.eq(id)),
            None => query.filter(cart_item::Column::BundleId.is_null()),
        };
        Ok(query.one(self.base.conn()).await?)
    }
}
