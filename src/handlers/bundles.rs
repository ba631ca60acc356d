use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::CallerId,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response},
    services::bundles::{BundleView, CreateBundleInput, UpdateBundleInput},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct BundleListQuery {
    #[serde(default)]
    pub include_unavailable: bool,
}

/// Anonymous callers see available bundles only
pub async fn list_bundles(
    State(state): State<AppState>,
    caller: Option<CallerId>,
    Query(query): Query<BundleListQuery>,
) -> ApiResult<Vec<BundleView>> {
    let bundles = state
        .services
        .bundles
        .list_bundles(caller.as_ref(), query.include_unavailable)
        .await?;
    Ok(Json(ApiResponse::success(bundles)))
}

pub async fn get_bundle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<BundleView> {
    let bundle = state.services.bundles.get_bundle(id).await?;
    Ok(Json(ApiResponse::success(bundle)))
}

pub async fn create_bundle(
    State(state): State<AppState>,
    caller: CallerId,
    Json(payload): Json<CreateBundleInput>,
) -> Result<Response, ServiceError> {
    let bundle = state
        .services
        .bundles
        .create_bundle(&caller, payload)
        .await?;
    Ok(created_response(bundle))
}

pub async fn update_bundle(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBundleInput>,
) -> ApiResult<BundleView> {
    let bundle = state
        .services
        .bundles
        .update_bundle(&caller, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(bundle)))
}

pub async fn delete_bundle(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.bundles.delete_bundle(&caller, id).await?;
    Ok(no_content_response())
}

pub async fn toggle_bundle(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let is_available = state
        .services
        .bundles
        .toggle_availability(&caller, id)
        .await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "id": id,
        "is_available": is_available,
    }))))
}
