use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::{
    services::donations::{Ngo, NgoTotal},
    ApiResponse, ApiResult, AppState,
};

pub async fn list_ngos(State(state): State<AppState>) -> ApiResult<Vec<Ngo>> {
    let ngos = state.services.donations.list_ngos().to_vec();
    Ok(Json(ApiResponse::success(ngos)))
}

pub async fn ngo_total_donations(
    State(state): State<AppState>,
    Path(ngo_id): Path<i32>,
) -> ApiResult<NgoTotal> {
    let total = state.services.donations.total_for(ngo_id).await?;
    Ok(Json(ApiResponse::success(total)))
}
