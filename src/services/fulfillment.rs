use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::entities::{delivery, driver, staff, DeliveryStatus, DriverStatus};
use crate::errors::ServiceError;
use crate::services::pricing::round_money;

/// Best-effort assignment of people to a delivery.
///
/// Implementations run inside the checkout transaction; `Ok(None)` means
/// nobody was available and is not an error.
#[async_trait]
pub trait Fulfillment: Send + Sync {
    async fn try_assign_driver(
        &self,
        txn: &DatabaseTransaction,
        delivery_id: Uuid,
    ) -> Result<Option<Uuid>, ServiceError>;

    async fn try_assign_staff(
        &self,
        txn: &DatabaseTransaction,
        theatre_id: Uuid,
        delivery_id: Uuid,
    ) -> Result<Option<Uuid>, ServiceError>;

    async fn release_driver(
        &self,
        txn: &DatabaseTransaction,
        driver_id: Uuid,
    ) -> Result<(), ServiceError>;
}

/// Picks the longest-registered available driver and the first staff member of the theatre
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFulfillment;

#[async_trait]
impl Fulfillment for DefaultFulfillment {
    #[instrument(skip(self, txn))]
    async fn try_assign_driver(
        &self,
        txn: &DatabaseTransaction,
        delivery_id: Uuid,
    ) -> Result<Option<Uuid>, ServiceError> {
        let candidates = driver::Entity::find()
            .filter(driver::Column::Status.eq(DriverStatus::Available))
            .order_by_asc(driver::Column::CreatedAt)
            .all(txn)
            .await?;

        for candidate in candidates {
            // Claim the driver only if still available
            let claimed = driver::Entity::update_many()
                .col_expr(driver::Column::Status, Expr::value(DriverStatus::Busy))
                .filter(driver::Column::Id.eq(candidate.id))
                .filter(driver::Column::Status.eq(DriverStatus::Available))
                .exec(txn)
                .await?;
            if claimed.rows_affected == 1 {
                set_delivery_driver(txn, delivery_id, candidate.id).await?;
                info!(driver_id = %candidate.id, "driver assigned");
                return Ok(Some(candidate.id));
            }
        }

        debug!("no available driver");
        Ok(None)
    }

    #[instrument(skip(self, txn))]
    async fn try_assign_staff(
        &self,
        txn: &DatabaseTransaction,
        theatre_id: Uuid,
        delivery_id: Uuid,
    ) -> Result<Option<Uuid>, ServiceError> {
        let member = staff::Entity::find()
            .filter(staff::Column::TheatreId.eq(theatre_id))
            .order_by_asc(staff::Column::CreatedAt)
            .one(txn)
            .await?;

        let Some(member) = member else {
            debug!("theatre has no staff");
            return Ok(None);
        };

        delivery::Entity::update_many()
            .col_expr(delivery::Column::StaffId, Expr::value(Some(member.id)))
            .filter(delivery::Column::Id.eq(delivery_id))
            .exec(txn)
            .await?;
        Ok(Some(member.id))
    }

    #[instrument(skip(self, txn))]
    async fn release_driver(
        &self,
        txn: &DatabaseTransaction,
        driver_id: Uuid,
    ) -> Result<(), ServiceError> {
        driver::Entity::update_many()
            .col_expr(driver::Column::Status, Expr::value(DriverStatus::Available))
            .filter(driver::Column::Id.eq(driver_id))
            .exec(txn)
            .await?;
        Ok(())
    }
}

async fn set_delivery_driver(
    txn: &DatabaseTransaction,
    delivery_id: Uuid,
    driver_id: Uuid,
) -> Result<(), ServiceError> {
    delivery::Entity::update_many()
        .col_expr(delivery::Column::DriverId, Expr::value(Some(driver_id)))
        .filter(delivery::Column::Id.eq(delivery_id))
        .exec(txn)
        .await?;
    Ok(())
}

/// Folds a new 1-5 rating into the driver's running mean
#[instrument(skip(conn, delivery), fields(delivery_id = %delivery.id))]
pub async fn rate_driver<C: ConnectionTrait>(
    conn: &C,
    delivery: &delivery::Model,
    rating: i32,
) -> Result<driver::Model, ServiceError> {
    if !(1..=5).contains(&rating) {
        return Err(ServiceError::InvalidInput(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    if delivery.delivery_status != DeliveryStatus::Fulfilled {
        return Err(ServiceError::InvalidInput(
            "Only fulfilled deliveries can be rated".to_string(),
        ));
    }
    let driver_id = delivery.driver_id.ok_or_else(|| {
        ServiceError::InvalidInput("Delivery has no assigned driver".to_string())
    })?;

    let current = driver::Entity::find_by_id(driver_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Driver {} not found", driver_id)))?;

    let count = current.rating_count;
    let mean = round_money(
        (current.rating * Decimal::from(count) + Decimal::from(rating))
            / Decimal::from(count + 1),
    );

    let mut active: driver::ActiveModel = current.into();
    active.rating = Set(mean);
    active.rating_count = Set(count + 1);
    let updated = active.update(conn).await?;

    info!(%driver_id, rating = %updated.rating, "driver rated");
    Ok(updated)
}

/// Marks a delivery fulfilled and frees its driver
pub async fn complete_delivery<C: ConnectionTrait>(
    conn: &C,
    delivery: delivery::Model,
) -> Result<delivery::Model, ServiceError> {
    if delivery.delivery_status != DeliveryStatus::Pending {
        return Err(ServiceError::InvalidInput(format!(
            "Delivery {} is not pending",
            delivery.id
        )));
    }
    let driver_id = delivery.driver_id;

    let mut active: delivery::ActiveModel = delivery.into();
    active.delivery_status = Set(DeliveryStatus::Fulfilled);
    active.delivery_time = Set(Some(Utc::now()));
    active.updated_at = Set(Utc::now());
    let updated = active.update(conn).await?;

    if let Some(driver_id) = driver_id {
        driver::Entity::update_many()
            .col_expr(driver::Column::Status, Expr::value(DriverStatus::Available))
            .filter(driver::Column::Id.eq(driver_id))
            .exec(conn)
            .await?;
    }
    Ok(updated)
}
