use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{errors::ServiceError, ApiResponse, AppState};

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Only deployments that opt in may bypass the coupon puzzle
pub fn authorize_puzzle_skip(state: &AppState, requested: bool) -> Result<bool, ServiceError> {
    if requested && !state.config.allow_puzzle_skip {
        return Err(ServiceError::Unauthorized(
            "Skipping the coupon puzzle is disabled".to_string(),
        ));
    }
    Ok(requested)
}
