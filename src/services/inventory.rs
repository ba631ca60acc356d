use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::entities::{product, CartLine};
use crate::errors::ServiceError;
use crate::repositories::CatalogRepository;

/// Atomic stock decrements for consumed cart lines
pub struct InventoryLedger;

impl InventoryLedger {
    /// Subtracts `quantity` from the product's stock in one guarded update
    #[instrument(skip(conn))]
    pub async fn decrement<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let result = product::Entity::update_many()
            .col_expr(
                product::Column::InventoryQuantity,
                Expr::col(product::Column::InventoryQuantity).sub(quantity),
            )
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::InventoryQuantity.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 1 {
            return Ok(());
        }

        match CatalogRepository::new(conn).find_product(product_id).await? {
            Some(_) => Err(ServiceError::InsufficientStock(product_id)),
            None => Err(ServiceError::InvalidState(format!(
                "Product {} disappeared during checkout",
                product_id
            ))),
        }
    }

    /// Decrements stock for a cart line; bundles expand to every constituent product
    pub async fn consume_line<C: ConnectionTrait>(
        conn: &C,
        line: &CartLine,
    ) -> Result<(), ServiceError> {
        match *line {
            CartLine::Product { id, quantity } => Self::decrement(conn, id, quantity).await,
            CartLine::Bundle { id, quantity } => {
                let repo = CatalogRepository::new(conn);
                if repo.find_bundle(id).await?.is_none() {
                    return Err(ServiceError::InvalidState(format!(
                        "Bundle {} disappeared during checkout",
                        id
                    )));
                }
                for item in repo.find_bundle_items(id).await? {
                    let units = item.quantity.checked_mul(quantity).ok_or_else(|| {
                        ServiceError::InvalidInput(format!(
                            "Quantity of bundle {} is too large",
                            id
                        ))
                    })?;
                    debug!(bundle_id = %id, product_id = %item.product_id, units, "consuming bundle component");
                    Self::decrement(conn, item.product_id, units).await?;
                }
                Ok(())
            }
        }
    }
}
