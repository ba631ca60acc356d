use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::{
    auditorium, customer, customer_showing, driver, movie, movie_showing, seat, staff, theatre,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Lookups for customers, staff, drivers and the venue chain behind a booking
#[derive(Debug)]
pub struct CustomerRepository<'c, C> {
    base: BaseRepository<'c, C>,
}

impl<'c, C: ConnectionTrait> CustomerRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self {
            base: BaseRepository::new(conn),
        }
    }

    pub async fn find_customer_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<customer::Model>, ServiceError> {
        Ok(customer::Entity::find_by_id(id).one(self.base.conn()).await?)
    }

    pub async fn find_customer_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<customer::Model>, ServiceError> {
        Ok(customer::Entity::find()
            .filter(customer::Column::UserId.eq(user_id))
            .one(self.base.conn())
            .await?)
    }

    pub async fn find_staff_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<staff::Model>, ServiceError> {
        Ok(staff::Entity::find()
            .filter(staff::Column::UserId.eq(user_id))
            .one(self.base.conn())
            .await?)
    }

    pub async fn find_driver_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<driver::Model>, ServiceError> {
        Ok(driver::Entity::find()
            .filter(driver::Column::UserId.eq(user_id))
            .one(self.base.conn())
            .await?)
    }

    pub async fn get_customer_showing(
        &self,
        id: Uuid,
    ) -> Result<customer_showing::Model, ServiceError> {
        customer_showing::Entity::find_by_id(id)
            .one(self.base.conn())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer showing {} not found", id)))
    }

    pub async fn get_seat(&self, id: Uuid) -> Result<seat::Model, ServiceError> {
        seat::Entity::find_by_id(id)
            .one(self.base.conn())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Seat {} not found", id)))
    }

    pub async fn get_auditorium(&self, id: Uuid) -> Result<auditorium::Model, ServiceError> {
        auditorium::Entity::find_by_id(id)
            .one(self.base.conn())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Auditorium {} not found", id)))
    }

    pub async fn find_theatre(&self, id: Uuid) -> Result<Option<theatre::Model>, ServiceError> {
        Ok(theatre::Entity::find_by_id(id).one(self.base.conn()).await?)
    }

    pub async fn find_movie_showing(
        &self,
        id: Uuid,
    ) -> Result<Option<movie_showing::Model>, ServiceError> {
        Ok(movie_showing::Entity::find_by_id(id)
            .one(self.base.conn())
            .await?)
    }

    pub async fn find_movie(&self, id: Uuid) -> Result<Option<movie::Model>, ServiceError> {
        Ok(movie::Entity::find_by_id(id).one(self.base.conn()).await?)
    }
}
