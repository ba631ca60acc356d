use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::payment_method;
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

#[derive(Debug)]
pub struct PaymentRepository<'c, C> {
    base: BaseRepository<'c, C>,
}

impl<'c, C: ConnectionTrait> PaymentRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    pub async fn get_payment_method(
        &self,
        id: Uuid,
    ) -> Result<payment_method::Model, ServiceError> {
        payment_method::Entity::find_by_id(id)
            .one(self.base.conn())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment method {} not found", id)))
    }

    /// Payment method that must belong to `customer_id`
    pub async fn get_payment_method_for_customer(
        &self,
        id: Uuid,
        customer_id: Uuid,
    ) -> Result<payment_method::Model, ServiceError> {
        let method = self.get_payment_method(id).await?;
        if method.customer_id != customer_id {
            return Err(ServiceError::Unauthorized(
                "Payment method does not belong to this customer".to_string(),
            ));
        }
        Ok(method)
    }

    pub async fn find_by_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<payment_method::Model>, ServiceError> {
        Ok(payment_method::Entity::find()
            .filter(payment_method::Column::CustomerId.eq(customer_id))
            .order_by_asc(payment_method::Column::CreatedAt)
            .all(self.base.conn())
            .await?)
    }

    pub async fn find_by_card(
        &self,
        customer_id: Uuid,
        card_number: &str,
        expiration_month: i32,
        expiration_year: i32,
    ) -> Result<Option<payment_method::Model>, ServiceError> {
        Ok(payment_method::Entity::find()
            .filter(payment_method::Column::CustomerId.eq(customer_id))
            .filter(payment_method::Column::CardNumber.eq(card_number))
            .filter(payment_method::Column::ExpirationMonth.eq(expiration_month))
            .filter(payment_method::Column::ExpirationYear.eq(expiration_year))
            .one(self.base.conn())
            .await?)
    }
}
