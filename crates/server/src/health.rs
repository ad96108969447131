use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;

use crate::repo::Repositories;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Record the application start time. Call once during startup.
pub fn record_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Health check response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// `postgres` or `memory`.
    pub store: String,
    /// `connected`, or the error message when the store cannot be reached.
    pub store_status: String,
    pub uptime_seconds: u64,
    pub version: String,
}

/// Health check handler.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up; see store_status for the store", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(repos): State<Repositories>) -> Json<HealthResponse> {
    let (status, store_status) = match repos.datastore.ping().await {
        Ok(()) => ("ok", "connected".to_string()),
        Err(e) => {
            tracing::warn!(error = %e.message, "health check could not reach the store");
            ("degraded", format!("error: {}", e.message))
        }
    };

    let uptime = START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0);

    Json(HealthResponse {
        status: status.to_string(),
        store: repos.datastore.backend().as_str().to_string(),
        store_status,
        uptime_seconds: uptime,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
