use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AccessControl, CallerId},
    entities::{bundle, bundle_item, MAX_LINE_QUANTITY},
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::CatalogRepository,
    services::pricing::{bundle_discounted_price, BUNDLE_PRICE_FACTOR},
};

/// Admin-managed snack bundles priced at a fixed 20% off their original price
#[derive(Clone)]
pub struct BundleService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    access: AccessControl,
}

impl BundleService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            event_sender,
            access: AccessControl,
        }
    }

    /// Creates an available bundle and its item rows in one transaction
    #[instrument(skip(self, caller, input), fields(caller = %caller.as_str(), name = %input.name))]
    pub async fn create_bundle(
        &self,
        caller: &CallerId,
        input: CreateBundleInput,
    ) -> Result<BundleView, ServiceError> {
        let txn = self.db.begin().await?;
        let admin = self.access.require_admin(&txn, caller).await?;

        input.validate()?;
        validate_price(input.original_price)?;
        validate_items(&txn, &input.items).await?;

        let now = Utc::now();
        let bundle = bundle::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            original_price: Set(input.original_price),
            total_price: Set(bundle_discounted_price(input.original_price)),
            is_available: Set(true),
            created_by: Set(Some(admin.id)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        insert_items(&txn, bundle.id, &input.items).await?;
        let view = load_view(&txn, bundle).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BundleCreated(view.id))
            .await;
        info!(bundle_id = %view.id, "bundle created");
        Ok(view)
    }

    /// Applies only the supplied fields. A supplied item list replaces the old one entirely.
    #[instrument(skip(self, caller, input), fields(caller = %caller.as_str()))]
    pub async fn update_bundle(
        &self,
        caller: &CallerId,
        bundle_id: Uuid,
        input: UpdateBundleInput,
    ) -> Result<BundleView, ServiceError> {
        let txn = self.db.begin().await?;
        self.access.require_admin(&txn, caller).await?;
        let existing = CatalogRepository::new(&txn).get_bundle(bundle_id).await?;

        input.validate()?;
        if let Some(price) = input.original_price {
            validate_price(price)?;
        }
        if let Some(items) = &input.items {
            validate_items(&txn, items).await?;
        }

        let mut active: bundle::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = input.original_price {
            active.original_price = Set(price);
            active.total_price = Set(bundle_discounted_price(price));
        }
        if let Some(is_available) = input.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        if let Some(items) = &input.items {
            bundle_item::Entity::delete_many()
                .filter(bundle_item::Column::BundleId.eq(bundle_id))
                .exec(&txn)
                .await?;
            insert_items(&txn, bundle_id, items).await?;
        }

        let view = load_view(&txn, updated).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BundleUpdated(bundle_id))
            .await;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn delete_bundle(&self, caller: &CallerId, bundle_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        self.access.require_admin(&txn, caller).await?;
        CatalogRepository::new(&txn).get_bundle(bundle_id).await?;

        bundle_item::Entity::delete_many()
            .filter(bundle_item::Column::BundleId.eq(bundle_id))
            .exec(&txn)
            .await?;
        bundle::Entity::delete_by_id(bundle_id).exec(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BundleDeleted(bundle_id))
            .await;
        info!(%bundle_id, "bundle deleted");
        Ok(())
    }

    /// Flips availability and returns the new state
    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn toggle_availability(
        &self,
        caller: &CallerId,
        bundle_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;
        self.access.require_admin(&txn, caller).await?;
        let existing = CatalogRepository::new(&txn).get_bundle(bundle_id).await?;

        let next = !existing.is_available;
        let mut active: bundle::ActiveModel = existing.into();
        active.is_available = Set(next);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BundleUpdated(bundle_id))
            .await;
        Ok(next)
    }

    /// Unavailable bundles are only listed for admins who ask for them
    #[instrument(skip(self, caller))]
    pub async fn list_bundles(
        &self,
        caller: Option<&CallerId>,
        include_unavailable: bool,
    ) -> Result<Vec<BundleView>, ServiceError> {
        let conn = self.db.as_ref();
        let include_unavailable = match caller {
            Some(caller) if include_unavailable => self.access.is_admin(conn, caller).await?,
            _ => false,
        };

        let bundles = CatalogRepository::new(conn)
            .list_bundles(include_unavailable)
            .await?;
        let mut views = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            views.push(load_view(conn, bundle).await?);
        }
        Ok(views)
    }

    #[instrument(skip(self))]
    pub async fn get_bundle(&self, bundle_id: Uuid) -> Result<BundleView, ServiceError> {
        let conn = self.db.as_ref();
        let bundle = CatalogRepository::new(conn).get_bundle(bundle_id).await?;
        load_view(conn, bundle).await
    }
}

fn validate_price(price: Decimal) -> Result<(), ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::InvalidInput(
            "Original price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

async fn validate_items<C: ConnectionTrait>(
    conn: &C,
    items: &[BundleItemInput],
) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::InvalidInput(
            "Bundle must contain at least one product".to_string(),
        ));
    }
    let repo = CatalogRepository::new(conn);
    for item in items {
        if !(1..=MAX_LINE_QUANTITY).contains(&item.quantity) {
            return Err(ServiceError::InvalidInput(format!(
                "Quantity for product {} must be between 1 and {}",
                item.product_id, MAX_LINE_QUANTITY
            )));
        }
        if repo.find_product(item.product_id).await?.is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "Product with ID {} not found",
                item.product_id
            )));
        }
    }
    Ok(())
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    bundle_id: Uuid,
    items: &[BundleItemInput],
) -> Result<(), ServiceError> {
    for item in items {
        bundle_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            bundle_id: Set(bundle_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn load_view<C: ConnectionTrait>(
    conn: &C,
    bundle: bundle::Model,
) -> Result<BundleView, ServiceError> {
    let items = CatalogRepository::new(conn)
        .find_bundle_items_with_products(bundle.id)
        .await?
        .into_iter()
        .map(|(item, product)| BundleItemView {
            product_id: product.id,
            product_name: product.name,
            quantity: item.quantity,
            unit_price: product.unit_price,
        })
        .collect();

    Ok(BundleView {
        id: bundle.id,
        name: bundle.name,
        description: bundle.description,
        original_price: bundle.original_price,
        total_price: bundle.total_price,
        discount_percentage: (Decimal::ONE - BUNDLE_PRICE_FACTOR) * Decimal::ONE_HUNDRED,
        is_available: bundle.is_available,
        items,
        created_at: bundle.created_at,
        updated_at: bundle.updated_at,
    })
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BundleItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBundleInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub original_price: Decimal,
    pub items: Vec<BundleItemInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBundleInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub original_price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub items: Option<Vec<BundleItemInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleItemView {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub original_price: Decimal,
    pub total_price: Decimal,
    pub discount_percentage: Decimal,
    pub is_available: bool,
    pub items: Vec<BundleItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
