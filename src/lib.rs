//! Concessions API Library
//!
//! Bundles, carts, coupon puzzles, NGO donations and the atomic
//! checkout/delivery pipeline for in-seat concession orders.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod repositories;
pub mod services;

use std::{sync::Arc, time::Duration};

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::handlers::AppServices;

/// Request budget enforced by the router
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: AppServices,
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: ResponseMeta::capture(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: ResponseMeta::capture(),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let bundles = Router::new()
        .route(
            "/bundles",
            get(handlers::bundles::list_bundles).post(handlers::bundles::create_bundle),
        )
        .route(
            "/bundles/:id",
            get(handlers::bundles::get_bundle)
                .put(handlers::bundles::update_bundle)
                .delete(handlers::bundles::delete_bundle),
        )
        .route(
            "/bundles/:id/toggle",
            post(handlers::bundles::toggle_bundle),
        );

    let cart = Router::new()
        .route(
            "/cart",
            get(handlers::cart::get_cart).post(handlers::cart::add_cart_item),
        )
        .route(
            "/cart/:item_id",
            axum::routing::put(handlers::cart::update_cart_item)
                .delete(handlers::cart::delete_cart_item),
        );

    let payments = Router::new()
        .route(
            "/payment-methods",
            get(handlers::payments::list_payment_methods)
                .post(handlers::payments::add_payment_method),
        )
        .route(
            "/payment-methods/:id/funds",
            post(handlers::payments::add_funds),
        );

    let coupons = Router::new()
        .route(
            "/coupons/:code/puzzle",
            get(handlers::coupons::issue_puzzle),
        )
        .route("/coupons/apply", post(handlers::coupons::apply_coupon));

    let ngos = Router::new()
        .route("/ngos", get(handlers::ngos::list_ngos))
        .route(
            "/ngos/:id/donations",
            get(handlers::ngos::ngo_total_donations),
        );

    let deliveries = Router::new()
        .route(
            "/deliveries",
            get(handlers::deliveries::list_deliveries)
                .post(handlers::deliveries::create_delivery),
        )
        .route("/deliveries/:id", get(handlers::deliveries::get_delivery))
        .route(
            "/deliveries/:id/cancel",
            post(handlers::deliveries::cancel_delivery),
        )
        .route(
            "/deliveries/:id/rate",
            post(handlers::deliveries::rate_delivery),
        )
        .route(
            "/deliveries/:id/fulfill",
            post(handlers::deliveries::fulfill_delivery),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(bundles)
        .merge(cart)
        .merge(payments)
        .merge(coupons)
        .merge(ngos)
        .merge(deliveries)
}

/// Full application router with the HTTP middleware stack applied
pub fn build_router(state: AppState) -> Router {
    let cors_layer = if state.config.should_allow_permissive_cors() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(|| async { "concessions-api up" }))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
