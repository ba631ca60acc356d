use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Payment Required")
    pub error: String,
    /// Stable machine-readable error kind (e.g., "insufficient_funds")
    pub code: String,
    /// Human-readable error description
    pub message: String,
    /// RFC 3339 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cart for customer {0} is empty")]
    EmptyCart(uuid::Uuid),

    #[error("Invalid coupon code: {0}")]
    InvalidCoupon(String),

    #[error("Puzzle token and answer required to apply coupon")]
    PuzzleRequired,

    #[error("Incorrect puzzle answer")]
    PuzzleMismatch,

    #[error("Puzzle not found: {0}")]
    PuzzleNotFound(String),

    #[error("Puzzle verification failed: {0}")]
    PuzzleVerificationError(String),

    #[error("Invalid NGO id: {0}")]
    InvalidNgo(i32),

    #[error("Insufficient funds on payment method {0}")]
    InsufficientFunds(uuid::Uuid),

    #[error("Insufficient stock for product {0}")]
    InsufficientStock(uuid::Uuid),

    #[error("Delivery {0} is already cancelled")]
    AlreadyCancelled(uuid::Uuid),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Stable machine-readable kind. Callers branch on this, never on the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidInput(_) => "invalid_input",
            Self::ValidationError(_) => "validation_error",
            Self::EmptyCart(_) => "empty_cart",
            Self::InvalidCoupon(_) => "invalid_coupon",
            Self::PuzzleRequired => "puzzle_required",
            Self::PuzzleMismatch => "puzzle_mismatch",
            Self::PuzzleNotFound(_) => "puzzle_not_found",
            Self::PuzzleVerificationError(_) => "puzzle_verification_error",
            Self::InvalidNgo(_) => "invalid_ngo",
            Self::InsufficientFunds(_) => "insufficient_funds",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::AlreadyCancelled(_) => "already_cancelled",
            Self::InvalidState(_) => "invalid_state",
            Self::InternalError(_) | Self::Other(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::PuzzleNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::InvalidInput(_)
            | Self::ValidationError(_)
            | Self::EmptyCart(_)
            | Self::InvalidCoupon(_)
            | Self::PuzzleRequired
            | Self::PuzzleVerificationError(_)
            | Self::InvalidNgo(_) => StatusCode::BAD_REQUEST,
            Self::PuzzleMismatch => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
            Self::AlreadyCancelled(_) | Self::InsufficientStock(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_)
            | Self::InvalidState(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            Self::InvalidState(_) => "Internal consistency error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
        }

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: self.kind().to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::EmptyCart(Uuid::nil()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InsufficientFunds(Uuid::nil()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ServiceError::PuzzleMismatch.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::AlreadyCancelled(Uuid::nil()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InvalidState("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_and_unauthorized_have_distinct_kinds() {
        let missing = ServiceError::NotFound("Bundle 1".into());
        let denied = ServiceError::Unauthorized("Admin access required".into());
        assert_ne!(missing.kind(), denied.kind());
        assert_ne!(missing.status_code(), denied.status_code());
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("pool exhausted".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::InvalidState("cart item 7 has no product".into()).response_message(),
            "Internal consistency error"
        );
        assert_eq!(
            ServiceError::InvalidCoupon("SAVE10".into()).response_message(),
            "Invalid coupon code: SAVE10"
        );
    }

    #[tokio::test]
    async fn error_response_carries_kind_code() {
        let response = ServiceError::InsufficientFunds(Uuid::nil()).into_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.code, "insufficient_funds");
        assert_eq!(payload.error, "Payment Required");
    }
}
