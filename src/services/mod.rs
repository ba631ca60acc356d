//! Business services. Ledgers (payments, inventory, donations) expose
//! associated functions that run on a caller-supplied connection so the
//! checkout can drive them inside its own transaction.

use sea_orm::DatabaseTransaction;
use tracing::warn;

use crate::errors::ServiceError;

pub mod bundles;
pub mod cart;
pub mod checkout;
pub mod coupons;
pub mod donations;
pub mod fulfillment;
pub mod inventory;
pub mod payments;
pub mod pricing;
pub mod puzzles;

/// Outcome of a best-effort step that must never fail the operation around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect<T> {
    Applied(T),
    Skipped,
    SoftFailed(String),
}

impl<T> SideEffect<T> {
    /// Commits the savepoint on success and rolls it back on failure,
    /// leaving the enclosing transaction usable either way.
    pub async fn settle(savepoint: DatabaseTransaction, result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(value) => match savepoint.commit().await {
                Ok(()) => SideEffect::Applied(value),
                Err(e) => SideEffect::SoftFailed(e.to_string()),
            },
            Err(e) => {
                if let Err(rollback) = savepoint.rollback().await {
                    warn!(error = %rollback, "savepoint rollback failed");
                }
                SideEffect::SoftFailed(e.to_string())
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, SideEffect::Applied(_))
    }

    pub fn applied(&self) -> Option<&T> {
        match self {
            SideEffect::Applied(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            SideEffect::SoftFailed(reason) => Some(reason),
            _ => None,
        }
    }
}
