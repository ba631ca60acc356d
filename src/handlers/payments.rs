use axum::{
    extract::{Path, State},
    response::{Json, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::CallerId,
    errors::ServiceError,
    handlers::common::created_response,
    services::payments::{AddPaymentMethodInput, PaymentMethodView},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize)]
pub struct AddFundsRequest {
    pub amount: Decimal,
}

pub async fn list_payment_methods(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Vec<PaymentMethodView>> {
    let methods = state.services.payments.list_payment_methods(&caller).await?;
    Ok(Json(ApiResponse::success(methods)))
}

pub async fn add_payment_method(
    State(state): State<AppState>,
    caller: CallerId,
    Json(payload): Json<AddPaymentMethodInput>,
) -> Result<Response, ServiceError> {
    let method = state
        .services
        .payments
        .add_payment_method(&caller, payload)
        .await?;
    Ok(created_response(method))
}

pub async fn add_funds(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddFundsRequest>,
) -> ApiResult<PaymentMethodView> {
    let method = state
        .services
        .payments
        .add_funds(&caller, id, payload.amount)
        .await?;
    Ok(Json(ApiResponse::success(method)))
}
