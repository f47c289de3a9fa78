//! Health check endpoint.
//!
//! Returns 200 OK if the document store is reachable,
//! 503 Service Unavailable otherwise.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    mongodb: bool,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mongodb = state.mongodb_healthy().await;

    let (status_code, status) = if mongodb {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (status_code, Json(HealthResponse { status, mongodb }))
}

/// Create the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
