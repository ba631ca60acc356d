use axum::{
    extract::{Path, State},
    response::{Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CallerId,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response},
    services::cart::{AddCartItemInput, CartItemView, CartView, UpdateCartItemInput},
    ApiResponse, ApiResult, AppState,
};

pub async fn get_cart(State(state): State<AppState>, caller: CallerId) -> ApiResult<CartView> {
    let cart = state.services.cart.get_cart(&caller).await?;
    Ok(Json(ApiResponse::success(cart)))
}

pub async fn add_cart_item(
    State(state): State<AppState>,
    caller: CallerId,
    Json(payload): Json<AddCartItemInput>,
) -> Result<Response, ServiceError> {
    let item = state.services.cart.add_item(&caller, payload).await?;
    Ok(created_response(item))
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    caller: CallerId,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemInput>,
) -> ApiResult<CartItemView> {
    payload.validate()?;
    let item = state
        .services
        .cart
        .update_item(&caller, item_id, payload.quantity)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

pub async fn delete_cart_item(
    State(state): State<AppState>,
    caller: CallerId,
    Path(item_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.cart.delete_item(&caller, item_id).await?;
    Ok(no_content_response())
}
