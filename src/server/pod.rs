use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::List;
use tracing::debug;

use super::error::ApiError;
use super::AppState;
use crate::kubernetes::model::{Namespace, PodName};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/namespaces/:namespace/pods", get(list_pods))
        .route("/namespaces/:namespace/pods/:name", get(get_pod))
}

async fn list_pods(
    State(state): State<AppState>,
    Path(namespace): Path<Namespace>,
) -> Result<Json<List<Pod>>, ApiError> {
    let pods = state.client.list_pods(&namespace).await?;
    debug!(%namespace, count = pods.items.len(), "Listed pods");
    Ok(Json(pods))
}

async fn get_pod(
    State(state): State<AppState>,
    Path((namespace, pod)): Path<(Namespace, PodName)>,
) -> Result<Json<Pod>, ApiError> {
    Ok(Json(state.client.get_pod(&namespace, &pod).await?))
}
