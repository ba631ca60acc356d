use std::sync::Arc;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AccessControl, CallerId},
    entities::payment_method,
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::PaymentRepository,
};

/// Atomic balance operations on a payment method.
///
/// Every mutation is a single `UPDATE ... SET balance = balance +/- x` so
/// concurrent callers can never both pass a balance check.
pub struct PaymentLedger;

impl PaymentLedger {
    /// Deducts `amount` if the balance covers it. Returns `false`, without
    /// touching the row, when funds are insufficient.
    #[instrument(skip(conn))]
    pub async fn charge<C: ConnectionTrait>(
        conn: &C,
        payment_method_id: Uuid,
        amount: Decimal,
    ) -> Result<bool, ServiceError> {
        if amount < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Charge amount cannot be negative".to_string(),
            ));
        }

        let result = payment_method::Entity::update_many()
            .col_expr(
                payment_method::Column::Balance,
                Expr::col(payment_method::Column::Balance).sub(amount),
            )
            .filter(payment_method::Column::Id.eq(payment_method_id))
            .filter(payment_method::Column::Balance.gte(amount))
            .exec(conn)
            .await?;

        let charged = result.rows_affected == 1;
        if !charged {
            warn!(%payment_method_id, %amount, "charge declined");
        }
        Ok(charged)
    }

    /// Adds `amount` back to the balance
    #[instrument(skip(conn))]
    pub async fn credit<C: ConnectionTrait>(
        conn: &C,
        payment_method_id: Uuid,
        amount: Decimal,
    ) -> Result<(), ServiceError> {
        let result = payment_method::Entity::update_many()
            .col_expr(
                payment_method::Column::Balance,
                Expr::col(payment_method::Column::Balance).add(amount),
            )
            .filter(payment_method::Column::Id.eq(payment_method_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Payment method {} not found",
                payment_method_id
            )));
        }
        Ok(())
    }
}

/// Customer-facing payment method management
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    access: AccessControl,
}

impl PaymentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            event_sender,
            access: AccessControl,
        }
    }

    /// Registers a card for the caller. The same card and expiry can only be stored once.
    #[instrument(skip(self, caller, input), fields(caller = %caller.as_str()))]
    pub async fn add_payment_method(
        &self,
        caller: &CallerId,
        input: AddPaymentMethodInput,
    ) -> Result<PaymentMethodView, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        if input.expiration_year < now.year()
            || (input.expiration_year == now.year() && input.expiration_month < now.month() as i32)
        {
            return Err(ServiceError::InvalidInput("Card is expired".to_string()));
        }

        let txn = self.db.begin().await?;
        let customer = self.access.require_customer(&txn, caller).await?;
        let repo = PaymentRepository::new(&txn);

        if repo
            .find_by_card(
                customer.id,
                &input.card_number,
                input.expiration_month,
                input.expiration_year,
            )
            .await?
            .is_some()
        {
            return Err(ServiceError::InvalidInput(
                "Payment method already exists".to_string(),
            ));
        }

        let is_first = repo.find_by_customer(customer.id).await?.is_empty();
        let model = payment_method::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            card_number: Set(input.card_number),
            expiration_month: Set(input.expiration_month),
            expiration_year: Set(input.expiration_year),
            billing_address: Set(input.billing_address),
            balance: Set(Decimal::ZERO),
            is_default: Set(input.is_default.unwrap_or(is_first)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(payment_method_id = %model.id, "payment method added");
        Ok(PaymentMethodView::from(&model))
    }

    /// Tops up a payment method owned by the caller
    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn add_funds(
        &self,
        caller: &CallerId,
        payment_method_id: Uuid,
        amount: Decimal,
    ) -> Result<PaymentMethodView, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Amount must be greater than zero".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let customer = self.access.require_customer(&txn, caller).await?;
        let repo = PaymentRepository::new(&txn);
        repo.get_payment_method_for_customer(payment_method_id, customer.id)
            .await?;

        PaymentLedger::credit(&txn, payment_method_id, amount).await?;
        let updated = repo.get_payment_method(payment_method_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::FundsAdded {
                payment_method_id,
                amount,
            })
            .await;

        Ok(PaymentMethodView::from(&updated))
    }

    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn list_payment_methods(
        &self,
        caller: &CallerId,
    ) -> Result<Vec<PaymentMethodView>, ServiceError> {
        let customer = self.access.require_customer(self.db.as_ref(), caller).await?;
        let methods = PaymentRepository::new(self.db.as_ref())
            .find_by_customer(customer.id)
            .await?;
        Ok(methods.iter().map(PaymentMethodView::from).collect())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddPaymentMethodInput {
    #[validate(length(min = 12, max = 19))]
    pub card_number: String,
    #[validate(range(min = 1, max = 12))]
    pub expiration_month: i32,
    #[validate(range(min = 2000, max = 2100))]
    pub expiration_year: i32,
    #[validate(length(min = 1))]
    pub billing_address: String,
    pub is_default: Option<bool>,
}

/// Payment method as returned to its owner; the card number is masked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodView {
    pub id: Uuid,
    pub card_number: String,
    pub expiration_month: i32,
    pub expiration_year: i32,
    pub billing_address: String,
    pub balance: Decimal,
    pub is_default: bool,
}

impl From<&payment_method::Model> for PaymentMethodView {
    fn from(model: &payment_method::Model) -> Self {
        Self {
            id: model.id,
            card_number: model.masked_card_number(),
            expiration_month: model.expiration_month,
            expiration_year: model.expiration_year,
            billing_address: model.billing_address.clone(),
            balance: model.balance,
            is_default: model.is_default,
        }
    }
}
