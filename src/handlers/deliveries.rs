use axum::{
    extract::{Path, State},
    response::{Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CallerId,
    entities::DeliveryModel,
    errors::ServiceError,
    handlers::common::{authorize_puzzle_skip, created_response},
    services::checkout::{
        CancelledDelivery, CreateDeliveryInput, DeliveryDetails, RateDeliveryInput, RatedDelivery,
    },
    ApiResponse, ApiResult, AppState,
};

pub async fn list_deliveries(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Vec<DeliveryModel>> {
    let deliveries = state.services.checkout.list_deliveries(&caller).await?;
    Ok(Json(ApiResponse::success(deliveries)))
}

/// Checkout
pub async fn create_delivery(
    State(state): State<AppState>,
    caller: CallerId,
    Json(mut payload): Json<CreateDeliveryInput>,
) -> Result<Response, ServiceError> {
    payload.skip_puzzle = authorize_puzzle_skip(&state, payload.skip_puzzle)?;
    let receipt = state
        .services
        .checkout
        .create_delivery(&caller, payload)
        .await?;
    Ok(created_response(receipt))
}

pub async fn get_delivery(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<Uuid>,
) -> ApiResult<DeliveryDetails> {
    let details = state
        .services
        .checkout
        .get_delivery_details(&caller, id)
        .await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn cancel_delivery(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<Uuid>,
) -> ApiResult<CancelledDelivery> {
    let cancelled = state.services.checkout.cancel_delivery(&caller, id).await?;
    Ok(Json(ApiResponse::success(cancelled)))
}

pub async fn rate_delivery(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<Uuid>,
    Json(payload): Json<RateDeliveryInput>,
) -> ApiResult<RatedDelivery> {
    payload.validate()?;
    let rated = state
        .services
        .checkout
        .rate_delivery(&caller, id, payload.rating)
        .await?;
    Ok(Json(ApiResponse::success(rated)))
}

pub async fn fulfill_delivery(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<Uuid>,
) -> ApiResult<DeliveryModel> {
    let delivery = state
        .services
        .checkout
        .fulfill_delivery(&caller, id)
        .await?;
    Ok(Json(ApiResponse::success(delivery)))
}
