use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AccessControl, CallerId},
    entities::{cart_item, CartLine, MAX_LINE_QUANTITY},
    errors::ServiceError,
    repositories::{CartRepository, CatalogRepository},
    services::pricing::{cart_line_total, CatalogSnapshot, PriceCatalog},
};

/// Loads every product and bundle referenced by `lines`.
/// Lines whose target no longer exists are left out so pricing reports them.
pub async fn load_catalog<C: ConnectionTrait>(
    conn: &C,
    lines: &[CartLine],
) -> Result<CatalogSnapshot, ServiceError> {
    let repo = CatalogRepository::new(conn);
    let mut snapshot = CatalogSnapshot::new();
    for line in lines {
        match *line {
            CartLine::Product { id, .. } => {
                if snapshot.product(id).is_none() {
                    if let Some(product) = repo.find_product(id).await? {
                        snapshot.insert_product(product);
                    }
                }
            }
            CartLine::Bundle { id, .. } => {
                if snapshot.bundle(id).is_none() {
                    if let Some(bundle) = repo.find_bundle(id).await? {
                        snapshot.insert_bundle(bundle);
                    }
                }
            }
        }
    }
    Ok(snapshot)
}

/// Customer cart management
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    access: AccessControl,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            access: AccessControl,
        }
    }

    /// Adds a product or bundle; an existing line for the same item is incremented instead
    #[instrument(skip(self, caller, input), fields(caller = %caller.as_str()))]
    pub async fn add_item(
        &self,
        caller: &CallerId,
        input: AddCartItemInput,
    ) -> Result<CartItemView, ServiceError> {
        input.validate()?;
        let line = CartLine::try_from(&input)?;

        let txn = self.db.begin().await?;
        let customer = self.access.require_customer(&txn, caller).await?;
        let catalog = CatalogRepository::new(&txn);

        match line {
            CartLine::Product { id, quantity } => {
                let product = catalog.find_product(id).await?.ok_or_else(|| {
                    ServiceError::NotFound(format!("Product with ID {} not found", id))
                })?;
                if !product.is_available {
                    return Err(ServiceError::InvalidInput(format!(
                        "Product {} is not available",
                        product.name
                    )));
                }
                if product.inventory_quantity <= quantity {
                    return Err(ServiceError::InvalidInput(format!(
                        "Not enough {} in stock",
                        product.name
                    )));
                }
            }
            CartLine::Bundle { id, .. } => {
                let bundle = catalog.get_bundle(id).await?;
                if !bundle.is_available {
                    return Err(ServiceError::InvalidInput(format!(
                        "Bundle {} is not available",
                        bundle.name
                    )));
                }
            }
        }

        let existing = CartRepository::new(&txn)
            .find_matching_item(customer.id, line.product_id(), line.bundle_id())
            .await?;
        let item = match existing {
            Some(item) => {
                debug!(cart_item_id = %item.id, "incrementing existing cart line");
                let quantity = item
                    .quantity
                    .checked_add(line.quantity())
                    .filter(|q| *q <= MAX_LINE_QUANTITY)
                    .ok_or_else(quantity_limit_error)?;
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(quantity);
                active.update(&txn).await?
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    customer_id: Set(customer.id),
                    product_id: Set(line.product_id()),
                    bundle_id: Set(line.bundle_id()),
                    quantity: Set(line.quantity()),
                    created_at: Set(Utc::now()),
                }
                .insert(&txn)
                .await?
            }
        };

        let view = item_view(&txn, &item).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn update_item(
        &self,
        caller: &CallerId,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartItemView, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(quantity_limit_error());
        }

        let txn = self.db.begin().await?;
        let item = self.owned_item(&txn, caller, item_id).await?;
        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        let updated = active.update(&txn).await?;

        let view = item_view(&txn, &updated).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn delete_item(&self, caller: &CallerId, item_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        self.owned_item(&txn, caller, item_id).await?;
        cart_item::Entity::delete_by_id(item_id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, caller), fields(caller = %caller.as_str()))]
    pub async fn get_cart(&self, caller: &CallerId) -> Result<CartView, ServiceError> {
        let conn = self.db.as_ref();
        let customer = self.access.require_customer(conn, caller).await?;
        let rows = CartRepository::new(conn).find_cart_items(customer.id).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(item_view(conn, row).await?);
        }
        let total = items.iter().map(|i| i.line_total).sum();
        Ok(CartView { items, total })
    }

    async fn owned_item<C: ConnectionTrait>(
        &self,
        conn: &C,
        caller: &CallerId,
        item_id: Uuid,
    ) -> Result<cart_item::Model, ServiceError> {
        let customer = self.access.require_customer(conn, caller).await?;
        let item = CartRepository::new(conn).get_cart_item(item_id).await?;
        self.access
            .ensure_owner(&customer, item.customer_id, "Cart item")?;
        Ok(item)
    }
}

async fn item_view<C: ConnectionTrait>(
    conn: &C,
    item: &cart_item::Model,
) -> Result<CartItemView, ServiceError> {
    let line = CartLine::try_from(item)?;
    let catalog = load_catalog(conn, std::slice::from_ref(&line)).await?;
    let line_total = cart_line_total(&line, &catalog)?;

    let (name, unit_price) = match line {
        CartLine::Product { id, .. } => catalog
            .product(id)
            .map(|p| (p.name.clone(), p.effective_unit_price())),
        CartLine::Bundle { id, .. } => catalog
            .bundle(id)
            .map(|b| (format!("{} (Bundle)", b.name), b.total_price)),
    }
    .ok_or_else(|| ServiceError::InvalidState(format!("Cart item {} is unpriced", item.id)))?;

    Ok(CartItemView {
        id: item.id,
        line,
        name,
        unit_price,
        line_total,
    })
}

fn quantity_limit_error() -> ServiceError {
    ServiceError::InvalidInput(format!(
        "A cart line holds at most {} units",
        MAX_LINE_QUANTITY
    ))
}

/// Exactly one of `product_id` and `bundle_id` must be supplied
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCartItemInput {
    pub product_id: Option<Uuid>,
    pub bundle_id: Option<Uuid>,
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

impl TryFrom<&AddCartItemInput> for CartLine {
    type Error = ServiceError;

    fn try_from(input: &AddCartItemInput) -> Result<Self, Self::Error> {
        match (input.product_id, input.bundle_id) {
            (Some(id), None) => Ok(CartLine::Product {
                id,
                quantity: input.quantity,
            }),
            (None, Some(id)) => Ok(CartLine::Bundle {
                id,
                quantity: input.quantity,
            }),
            _ => Err(ServiceError::InvalidInput(
                "Provide exactly one of product_id or bundle_id".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCartItemInput {
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemView {
    pub id: Uuid,
    #[serde(flatten)]
    pub line: CartLine,
    pub name: String,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: Decimal,
}
