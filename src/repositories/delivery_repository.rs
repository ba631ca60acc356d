use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{customer_showing, delivery, delivery_item};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

#[derive(Debug)]
pub struct DeliveryRepository<'c, C> {
    base: BaseRepository<'c, C>,
}

impl<'c, C: ConnectionTrait> DeliveryRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    pub async fn get_delivery(&self, id: Uuid) -> Result<delivery::Model, ServiceError> {
        delivery::Entity::find_by_id(id)
            .one(self.base.conn())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Delivery {} not found", id)))
    }

    pub async fn find_items(
        &self,
        delivery_id: Uuid,
    ) -> Result<Vec<delivery_item::Model>, ServiceError> {
        Ok(delivery_item::Entity::find()
            .filter(delivery_item::Column::DeliveryId.eq(delivery_id))
            .all(self.base.conn())
            .await?)
    }

    /// Deliveries placed by a customer, newest first
    pub async fn find_by_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<delivery::Model>, ServiceError> {
        Ok(delivery::Entity::find()
            .inner_join(customer_showing::Entity)
            .filter(customer_showing::Column::CustomerId.eq(customer_id))
            .order_by_desc(delivery::Column::CreatedAt)
            .all(self.base.conn())
            .await?)
    }
}
