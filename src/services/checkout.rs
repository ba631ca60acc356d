//! Checkout orchestration: turns a customer's cart into a charged delivery.
//!
//! Everything from pricing to inventory runs inside one database transaction.
//! The charge is an atomic check-and-decrement, so a declined charge rolls
//! back the delivery rows written just before it. Donation bookkeeping and
//! fulfillment assignment run in savepoints and can only soft-fail.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    error::SqlErr, sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AccessControl, CallerId},
    entities::{cart_item, delivery, delivery_item, CartLine, DeliveryStatus, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{
        CartRepository, CatalogRepository, CustomerRepository, DeliveryRepository,
        PaymentRepository,
    },
    services::{
        cart::load_catalog,
        coupons::{unlock_coupon, PuzzleAttempt},
        donations::{find_ngo, DonationLedger},
        fulfillment::{complete_delivery, rate_driver, Fulfillment},
        inventory::InventoryLedger,
        payments::PaymentLedger,
        pricing::{
            cart_line_total, cart_total, charge_total, coupon_discount, donation_amount,
            DonationRequest,
        },
        puzzles::PuzzleVerifier,
        SideEffect,
    },
};

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    verifier: PuzzleVerifier,
    fulfillment: Arc<dyn Fulfillment>,
    access: AccessControl,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        verifier: PuzzleVerifier,
        fulfillment: Arc<dyn Fulfillment>,
    ) -> Self {
        Self {
            db,
            event_sender,
            verifier,
            fulfillment,
            access: AccessControl,
        }
    }

    /// Prices, charges and records the caller's whole cart as one delivery
    #[instrument(skip(self, caller, input), fields(caller = %caller.as_str(), customer_showing_id = %input.customer_showing_id))]
    pub async fn create_delivery(
        &self,
        caller: &CallerId,
        input: CreateDeliveryInput,
    ) -> Result<CheckoutReceipt, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let customer = self.access.require_customer(&txn, caller).await?;

        let people = CustomerRepository::new(&txn);
        let showing = people
            .get_customer_showing(input.customer_showing_id)
            .await?;
        self.access
            .ensure_owner(&customer, showing.customer_id, "Customer showing")?;
        let payment_method = PaymentRepository::new(&txn)
            .get_payment_method_for_customer(input.payment_method_id, customer.id)
            .await?;
        let seat = people.get_seat(showing.seat_id).await?;
        let auditorium = people.get_auditorium(seat.auditorium_id).await?;

        let rows = CartRepository::new(&txn).find_cart_items(customer.id).await?;
        if rows.is_empty() {
            return Err(ServiceError::EmptyCart(customer.id));
        }
        let lines = rows
            .iter()
            .map(CartLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = load_catalog(&txn, &lines).await?;
        let line_totals = lines
            .iter()
            .map(|line| cart_line_total(line, &catalog))
            .collect::<Result<Vec<_>, _>>()?;
        let total_price = cart_total(&lines, &catalog)?;

        let coupon = match input.coupon_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let attempt = PuzzleAttempt {
                    token: input.puzzle_token.clone(),
                    answer: input.puzzle_answer.clone(),
                    skip: input.skip_puzzle,
                };
                Some(unlock_coupon(&txn, &self.verifier, code, &attempt).await?)
            }
            _ => None,
        };
        let discount_amount = coupon
            .as_ref()
            .map(|c| coupon_discount(total_price, c.discount_percent))
            .unwrap_or(Decimal::ZERO);

        let donation = match input.ngo_id {
            Some(ngo_id) => {
                let ngo = find_ngo(ngo_id).ok_or(ServiceError::InvalidNgo(ngo_id))?;
                let request =
                    DonationRequest::from_parts(input.donation_amount, input.donation_percentage);
                Some((ngo, donation_amount(total_price, request)?))
            }
            None => {
                if input.donation_amount.is_some() || input.donation_percentage.is_some() {
                    return Err(ServiceError::InvalidInput(
                        "A donation requires an NGO".to_string(),
                    ));
                }
                None
            }
        };
        let donated = donation
            .as_ref()
            .map(|(_, d)| d.amount)
            .unwrap_or(Decimal::ZERO);

        let now = Utc::now();
        let delivery_id = Uuid::new_v4();
        delivery::ActiveModel {
            id: Set(delivery_id),
            customer_showing_id: Set(showing.id),
            payment_method_id: Set(payment_method.id),
            driver_id: Set(None),
            staff_id: Set(None),
            total_price: Set(total_price),
            discount_amount: Set(discount_amount),
            coupon_id: Set(coupon.as_ref().map(|c| c.id)),
            coupon_code: Set(coupon.as_ref().map(|c| c.code.clone())),
            ngo_id: Set(donation.as_ref().map(|(ngo, _)| ngo.id)),
            ngo_name: Set(donation.as_ref().map(|(ngo, _)| ngo.name.to_string())),
            donation_amount: Set(donation.as_ref().map(|(_, d)| d.amount)),
            donation_percentage: Set(donation.as_ref().and_then(|(_, d)| d.percentage)),
            payment_status: Set(PaymentStatus::Pending),
            delivery_status: Set(DeliveryStatus::Pending),
            delivery_time: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for ((row, line), line_total) in rows.iter().zip(&lines).zip(&line_totals) {
            delivery_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                delivery_id: Set(delivery_id),
                cart_item_id: Set(row.id),
                product_id: Set(line.product_id()),
                bundle_id: Set(line.bundle_id()),
                quantity: Set(line.quantity()),
                line_total: Set(*line_total),
            }
            .insert(&txn)
            .await
            .map_err(|e| match e.sql_err() {
                // Another checkout already snapshotted this cart line
                Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::EmptyCart(customer.id),
                _ => ServiceError::from(e),
            })?;
        }

        let charged = charge_total(total_price, discount_amount, donated);
        if !PaymentLedger::charge(&txn, payment_method.id, charged).await? {
            txn.rollback().await?;
            metrics::counter!("concessions.checkout.insufficient_funds", 1);
            return Err(ServiceError::InsufficientFunds(payment_method.id));
        }

        delivery::Entity::update_many()
            .col_expr(
                delivery::Column::PaymentStatus,
                Expr::value(PaymentStatus::Completed),
            )
            .filter(delivery::Column::Id.eq(delivery_id))
            .exec(&txn)
            .await?;

        for line in &lines {
            InventoryLedger::consume_line(&txn, line).await?;
        }

        let consumed = cart_item::Entity::delete_many()
            .filter(cart_item::Column::Id.is_in(rows.iter().map(|r| r.id)))
            .exec(&txn)
            .await?;
        if consumed.rows_affected != rows.len() as u64 {
            txn.rollback().await?;
            warn!(
                customer_id = %customer.id,
                expected = rows.len(),
                deleted = consumed.rows_affected,
                "cart consumed by a concurrent checkout"
            );
            return Err(ServiceError::EmptyCart(customer.id));
        }

        let mut warnings = Vec::new();

        let ledger = match &donation {
            Some((ngo, d)) if d.amount > Decimal::ZERO => {
                let outcome = match txn.begin().await {
                    Ok(sp) => {
                        let result = DonationLedger::increment(&sp, ngo.id, d.amount).await;
                        SideEffect::settle(sp, result).await
                    }
                    Err(e) => SideEffect::SoftFailed(e.to_string()),
                };
                if let Some(reason) = outcome.failure() {
                    error!(ngo_id = ngo.id, amount = %d.amount, error = %reason, "donation ledger update failed");
                    metrics::counter!("concessions.donation_ledger.soft_failed", 1);
                    warnings.push(format!("Donation ledger not updated: {}", reason));
                }
                outcome
            }
            _ => SideEffect::Skipped,
        };

        let driver = match txn.begin().await {
            Ok(sp) => {
                let result = self.fulfillment.try_assign_driver(&sp, delivery_id).await;
                SideEffect::settle(sp, result).await
            }
            Err(e) => SideEffect::SoftFailed(e.to_string()),
        };
        if let Some(reason) = driver.failure() {
            warn!(%delivery_id, error = %reason, "driver assignment failed");
            warnings.push(format!("Driver not assigned: {}", reason));
        }

        let staff = match txn.begin().await {
            Ok(sp) => {
                let result = self
                    .fulfillment
                    .try_assign_staff(&sp, auditorium.theatre_id, delivery_id)
                    .await;
                SideEffect::settle(sp, result).await
            }
            Err(e) => SideEffect::SoftFailed(e.to_string()),
        };
        if let Some(reason) = staff.failure() {
            warn!(%delivery_id, error = %reason, "staff assignment failed");
            warnings.push(format!("Staff not assigned: {}", reason));
        }

        let stored = DeliveryRepository::new(&txn).get_delivery(delivery_id).await?;
        txn.commit().await?;

        metrics::counter!("concessions.checkout.completed", 1);
        info!(%delivery_id, %total_price, %discount_amount, %charged, "checkout completed");

        self.event_sender
            .send_or_log(Event::DeliveryCreated {
                delivery_id,
                customer_id: customer.id,
                charged,
            })
            .await;
        if let (Some((ngo, d)), true) = (&donation, ledger.is_applied()) {
            self.event_sender
                .send_or_log(Event::DonationRecorded {
                    ngo_id: ngo.id,
                    amount: d.amount,
                })
                .await;
        }

        Ok(CheckoutReceipt {
            delivery_id,
            total_price,
            discount_amount,
            applied_coupon_code: stored.coupon_code.clone(),
            donation: DonationSummary::from_delivery(&stored),
            charged,
            payment_status: stored.payment_status,
            delivery_status: stored.delivery_status,
            driver_id: stored.driver_id,
            staff_id: stored.staff_id,
            warnings,
        })
    }

    /// Refunds what was paid for the items. The donation stays with the NGO.
    /// A pending delivery also frees its driver; a fulfilled one already did.
    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn cancel_delivery(
        &self,
        caller: &CallerId,
        delivery_id: Uuid,
    ) -> Result<CancelledDelivery, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = self.owned_delivery(&txn, caller, delivery_id).await?;
        if existing.delivery_status == DeliveryStatus::Cancelled {
            return Err(ServiceError::AlreadyCancelled(delivery_id));
        }

        // Guarded on the status just read, so a concurrent cancel or fulfill
        // cannot slip between the read and the refund
        let flipped = delivery::Entity::update_many()
            .col_expr(
                delivery::Column::DeliveryStatus,
                Expr::value(DeliveryStatus::Cancelled),
            )
            .col_expr(delivery::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(delivery::Column::Id.eq(delivery_id))
            .filter(delivery::Column::DeliveryStatus.eq(existing.delivery_status))
            .exec(&txn)
            .await?;
        if flipped.rows_affected != 1 {
            txn.rollback().await?;
            let current = DeliveryRepository::new(self.db.as_ref())
                .get_delivery(delivery_id)
                .await?;
            return Err(match current.delivery_status {
                DeliveryStatus::Cancelled => ServiceError::AlreadyCancelled(delivery_id),
                _ => ServiceError::InvalidInput(format!(
                    "Delivery {} changed status during cancellation, retry",
                    delivery_id
                )),
            });
        }

        let refunded = existing.refundable_amount();
        PaymentLedger::credit(&txn, existing.payment_method_id, refunded).await?;
        match (existing.delivery_status, existing.driver_id) {
            (DeliveryStatus::Pending, Some(driver_id)) => {
                self.fulfillment.release_driver(&txn, driver_id).await?;
            }
            (_, Some(driver_id)) => {
                debug!(%delivery_id, %driver_id, "driver already released at fulfillment");
            }
            _ => {}
        }

        let delivery = DeliveryRepository::new(&txn).get_delivery(delivery_id).await?;
        txn.commit().await?;

        info!(%delivery_id, %refunded, "delivery cancelled");
        self.event_sender
            .send_or_log(Event::DeliveryCancelled {
                delivery_id,
                refunded,
            })
            .await;

        Ok(CancelledDelivery { delivery, refunded })
    }

    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn rate_delivery(
        &self,
        caller: &CallerId,
        delivery_id: Uuid,
        rating: i32,
    ) -> Result<RatedDelivery, ServiceError> {
        let txn = self.db.begin().await?;
        let delivery = self.owned_delivery(&txn, caller, delivery_id).await?;
        let driver = rate_driver(&txn, &delivery, rating).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::DeliveryRated {
                delivery_id,
                driver_id: driver.id,
                rating,
            })
            .await;

        Ok(RatedDelivery {
            delivery,
            driver_id: driver.id,
            driver_rating: driver.rating,
        })
    }

    /// Marks a delivery handed over. Only its driver or an admin may do this.
    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn fulfill_delivery(
        &self,
        caller: &CallerId,
        delivery_id: Uuid,
    ) -> Result<delivery::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let delivery = DeliveryRepository::new(&txn).get_delivery(delivery_id).await?;

        let is_driver = match CustomerRepository::new(&txn)
            .find_driver_by_user_id(caller.as_str())
            .await?
        {
            Some(driver) => delivery.driver_id == Some(driver.id),
            None => false,
        };
        if !is_driver && !self.access.is_admin(&txn, caller).await? {
            return Err(ServiceError::Unauthorized(
                "Only the assigned driver can fulfill this delivery".to_string(),
            ));
        }

        let updated = complete_delivery(&txn, delivery).await?;
        txn.commit().await?;
        info!(%delivery_id, "delivery fulfilled");
        Ok(updated)
    }

    /// Delivery with its items and venue, visible to its owner and admins
    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn get_delivery_details(
        &self,
        caller: &CallerId,
        delivery_id: Uuid,
    ) -> Result<DeliveryDetails, ServiceError> {
        let conn = self.db.as_ref();
        let delivery = DeliveryRepository::new(conn).get_delivery(delivery_id).await?;
        let people = CustomerRepository::new(conn);
        let showing = people
            .get_customer_showing(delivery.customer_showing_id)
            .await?;

        if !self.access.is_admin(conn, caller).await? {
            let customer = self.access.require_customer(conn, caller).await?;
            self.access
                .ensure_owner(&customer, showing.customer_id, "Delivery")?;
        }

        let movie_showing = people
            .find_movie_showing(showing.movie_showing_id)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState(format!(
                    "Showing {} is missing for delivery {}",
                    showing.movie_showing_id, delivery_id
                ))
            })?;
        let movie = people.find_movie(movie_showing.movie_id).await?.ok_or_else(|| {
            ServiceError::InvalidState(format!("Movie {} is missing", movie_showing.movie_id))
        })?;
        let auditorium = people.get_auditorium(movie_showing.auditorium_id).await?;
        let theatre = people.find_theatre(auditorium.theatre_id).await?.ok_or_else(|| {
            ServiceError::InvalidState(format!("Theatre {} is missing", auditorium.theatre_id))
        })?;

        let catalog = CatalogRepository::new(conn);
        let mut items = Vec::new();
        for item in DeliveryRepository::new(conn).find_items(delivery_id).await? {
            let name = match (item.product_id, item.bundle_id) {
                (Some(id), _) => catalog.find_product(id).await?.map(|p| p.name),
                (None, Some(id)) => catalog
                    .find_bundle(id)
                    .await?
                    .map(|b| format!("{} (Bundle)", b.name)),
                (None, None) => None,
            };
            match name {
                Some(name) => items.push(DeliveryItemView {
                    name,
                    quantity: item.quantity,
                    line_total: item.line_total,
                }),
                None => debug!(delivery_item_id = %item.id, "skipping item whose product is gone"),
            }
        }

        Ok(DeliveryDetails {
            id: delivery.id,
            driver_id: delivery.driver_id,
            staff_id: delivery.staff_id,
            total_price: delivery.total_price,
            discount_amount: delivery.discount_amount,
            coupon_code: delivery.coupon_code.clone(),
            payment_status: delivery.payment_status,
            delivery_status: delivery.delivery_status,
            delivery_time: delivery.delivery_time,
            created_at: delivery.created_at,
            items,
            theatre_name: theatre.name,
            theatre_address: theatre.address,
            movie_title: movie.title,
            donation: DonationSummary::from_delivery(&delivery),
        })
    }

    /// The caller's deliveries, newest first
    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn list_deliveries(
        &self,
        caller: &CallerId,
    ) -> Result<Vec<delivery::Model>, ServiceError> {
        let conn = self.db.as_ref();
        let customer = self.access.require_customer(conn, caller).await?;
        DeliveryRepository::new(conn)
            .find_by_customer(customer.id)
            .await
    }

    async fn owned_delivery(
        &self,
        txn: &DatabaseTransaction,
        caller: &CallerId,
        delivery_id: Uuid,
    ) -> Result<delivery::Model, ServiceError> {
        let customer = self.access.require_customer(txn, caller).await?;
        let delivery = DeliveryRepository::new(txn).get_delivery(delivery_id).await?;
        let showing = CustomerRepository::new(txn)
            .get_customer_showing(delivery.customer_showing_id)
            .await?;
        self.access
            .ensure_owner(&customer, showing.customer_id, "Delivery")?;
        Ok(delivery)
    }
}

/// Checkout request. `donation_amount` wins over `donation_percentage` when both are sent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDeliveryInput {
    pub customer_showing_id: Uuid,
    pub payment_method_id: Uuid,
    #[validate(length(max = 64))]
    pub coupon_code: Option<String>,
    pub puzzle_token: Option<String>,
    pub puzzle_answer: Option<String>,
    #[serde(default)]
    pub skip_puzzle: bool,
    pub ngo_id: Option<i32>,
    pub donation_amount: Option<Decimal>,
    pub donation_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSummary {
    pub ngo_id: i32,
    pub ngo_name: String,
    pub donation_amount: Decimal,
    pub donation_percentage: Option<Decimal>,
}

impl DonationSummary {
    /// `None` when the checkout did not select an NGO
    pub fn from_delivery(delivery: &delivery::Model) -> Option<Self> {
        let ngo_id = delivery.ngo_id?;
        Some(Self {
            ngo_id,
            ngo_name: delivery.ngo_name.clone().unwrap_or_default(),
            donation_amount: delivery.donation_amount.unwrap_or(Decimal::ZERO),
            donation_percentage: delivery.donation_percentage,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub delivery_id: Uuid,
    /// Pre-discount cart total
    pub total_price: Decimal,
    pub discount_amount: Decimal,
    pub applied_coupon_code: Option<String>,
    pub donation: Option<DonationSummary>,
    /// Amount taken from the payment method
    pub charged: Decimal,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub driver_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    /// Best-effort steps that did not go through
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelledDelivery {
    pub delivery: delivery::Model,
    pub refunded: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatedDelivery {
    pub delivery: delivery::Model,
    pub driver_id: Uuid,
    pub driver_rating: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateDeliveryInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryItemView {
    pub name: String,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub id: Uuid,
    pub driver_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub total_price: Decimal,
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<DeliveryItemView>,
    pub theatre_name: String,
    pub theatre_address: String,
    pub movie_title: String,
    pub donation: Option<DonationSummary>,
}
