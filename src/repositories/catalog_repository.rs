use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{bundle, bundle_item, code_puzzle, coupon, product};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Lookups for products, bundles, coupons and puzzles
#[derive(Debug)]
pub struct CatalogRepository<'c, C> {
    base: BaseRepository<'c, C>,
}

impl<'c, C: ConnectionTrait> CatalogRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    pub async fn find_product(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        Ok(product::Entity::find_by_id(id).one(self.base.conn()).await?)
    }

    pub async fn find_bundle(&self, id: Uuid) -> Result<Option<bundle::Model>, ServiceError> {
        Ok(bundle::Entity::find_by_id(id).one(self.base.conn()).await?)
    }

    pub async fn get_bundle(&self, id: Uuid) -> Result<bundle::Model, ServiceError> {
        self.find_bundle(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Bundle with ID {} not found", id)))
    }

    pub async fn list_bundles(
        &self,
        include_unavailable: bool,
    ) -> Result<Vec<bundle::Model>, ServiceError> {
        let mut query = bundle::Entity::find();
        if !include_unavailable {
            query = query.filter(bundle::Column::IsAvailable.eq(true));
        }
        Ok(query
            .order_by_asc(bundle::Column::CreatedAt)
            .all(self.base.conn())
            .await?)
    }

    pub async fn find_bundle_items(
        &self,
        bundle_id: Uuid,
    ) -> Result<Vec<bundle_item::Model>, ServiceError> {
        Ok(bundle_item::Entity::find()
            .filter(bundle_item::Column::BundleId.eq(bundle_id))
            .all(self.base.conn())
            .await?)
    }

    /// Bundle items joined with their products; items whose product vanished are dropped
    pub async fn find_bundle_items_with_products(
        &self,
        bundle_id: Uuid,
    ) -> Result<Vec<(bundle_item::Model, product::Model)>, ServiceError> {
        let rows = bundle_item::Entity::find()
            .filter(bundle_item::Column::BundleId.eq(bundle_id))
            .find_also_related(product::Entity)
            .all(self.base.conn())
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(item, product)| product.map(|p| (item, p)))
            .collect())
    }

    /// Active coupon by its unique code
    pub async fn find_active_coupon(
        &self,
        code: &str,
    ) -> Result<Option<coupon::Model>, ServiceError> {
        Ok(coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code))
            .filter(coupon::Column::IsActive.eq(true))
            .one(self.base.conn())
            .await?)
    }

    pub async fn find_puzzle(&self, id: Uuid) -> Result<Option<code_puzzle::Model>, ServiceError> {
        Ok(code_puzzle::Entity::find_by_id(id)
            .one(self.base.conn())
            .await?)
    }

    pub async fn find_active_puzzle_for_difficulty(
        &self,
        difficulty: i32,
    ) -> Result<Option<code_puzzle::Model>, ServiceError> {
        Ok(code_puzzle::Entity::find()
            .filter(code_puzzle::Column::Difficulty.eq(difficulty))
            .filter(code_puzzle::Column::IsActive.eq(true))
            .order_by_asc(code_puzzle::Column::CreatedAt)
            .one(self.base.conn())
            .await?)
    }
}
