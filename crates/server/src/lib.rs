pub mod config;
pub mod db;
pub mod error_convert;
pub mod health;
pub mod openapi;
pub mod password;
pub mod repo;
pub mod rest;
pub mod service;
pub mod telemetry;

use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The application router with its HTTP middleware stack.
pub fn app(state: db::AppState) -> Router {
    openapi::api_router(state)
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
