//! Probe and discovery endpoints.
//!
//! - `/healthz` - liveness, answers while the process serves HTTP
//! - `/readyz` - readiness, requires the cluster API server to answer
//! - `/version` - version reported by the cluster API server

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use k8s_openapi::apimachinery::pkg::version::Info;
use tracing::warn;

use super::error::ApiError;
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/version", get(version))
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(State(state): State<AppState>) -> Response {
    match state.client.server_version().await {
        Ok(_) => (StatusCode::OK, "ready").into_response(),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
        }
    }
}

async fn version(State(state): State<AppState>) -> Result<Json<Info>, ApiError> {
    Ok(Json(state.client.server_version().await?))
}
