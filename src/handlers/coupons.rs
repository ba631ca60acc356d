use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::{
    handlers::common::authorize_puzzle_skip,
    services::coupons::{ApplyCouponInput, CouponPreview, IssuedPuzzle},
    ApiResponse, ApiResult, AppState,
};

pub async fn issue_puzzle(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<IssuedPuzzle> {
    let puzzle = state.services.coupons.issue_puzzle(&code).await?;
    Ok(Json(ApiResponse::success(puzzle)))
}

pub async fn apply_coupon(
    State(state): State<AppState>,
    Json(mut payload): Json<ApplyCouponInput>,
) -> ApiResult<CouponPreview> {
    payload.skip_puzzle = authorize_puzzle_skip(&state, payload.skip_puzzle)?;
    let preview = state.services.coupons.apply_coupon(payload).await?;
    Ok(Json(ApiResponse::success(preview)))
}
