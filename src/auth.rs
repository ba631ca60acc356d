use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sea_orm::ConnectionTrait;
use tracing::debug;

use crate::entities::{customer, staff, StaffRole};
use crate::errors::ServiceError;
use crate::repositories::CustomerRepository;

/// Header carrying the caller identity established by the upstream auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Opaque identity of the authenticated caller.
///
/// Credentials are verified upstream; this crate only receives the resulting id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ServiceError::Unauthenticated)?;

        Ok(CallerId(value.to_string()))
    }
}

/// Role and ownership predicates over the caller id
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessControl;

impl AccessControl {
    /// Resolves the caller to a customer record
    pub async fn require_customer<C: ConnectionTrait>(
        &self,
        conn: &C,
        caller: &CallerId,
    ) -> Result<customer::Model, ServiceError> {
        CustomerRepository::new(conn)
            .find_customer_by_user_id(caller.as_str())
            .await?
            .ok_or_else(|| {
                debug!(user_id = %caller.as_str(), "caller is not a customer");
                ServiceError::Unauthorized("Customer access required".to_string())
            })
    }

    /// Resolves the caller to an admin staff record
    pub async fn require_admin<C: ConnectionTrait>(
        &self,
        conn: &C,
        caller: &CallerId,
    ) -> Result<staff::Model, ServiceError> {
        match CustomerRepository::new(conn)
            .find_staff_by_user_id(caller.as_str())
            .await?
        {
            Some(member) if member.role == StaffRole::Admin => Ok(member),
            _ => {
                debug!(user_id = %caller.as_str(), "admin check failed");
                Err(ServiceError::Unauthorized(
                    "Admin access required".to_string(),
                ))
            }
        }
    }

    pub async fn is_admin<C: ConnectionTrait>(
        &self,
        conn: &C,
        caller: &CallerId,
    ) -> Result<bool, ServiceError> {
        match self.require_admin(conn, caller).await {
            Ok(_) => Ok(true),
            Err(ServiceError::Unauthorized(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fails unless `owner_id` is the caller's customer id
    pub fn ensure_owner(
        &self,
        customer: &customer::Model,
        owner_id: uuid::Uuid,
        what: &str,
    ) -> Result<(), ServiceError> {
        if customer.id == owner_id {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized(format!(
                "{} does not belong to this customer",
                what
            )))
        }
    }
}
