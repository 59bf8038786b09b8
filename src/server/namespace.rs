use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use k8s_openapi::api::core::v1::Namespace as NamespaceResource;
use k8s_openapi::List;

use super::error::ApiError;
use super::AppState;
use crate::kubernetes::model::Namespace;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/namespaces", get(list_namespaces))
        .route("/namespaces/:namespace", get(get_namespace))
}

async fn list_namespaces(
    State(state): State<AppState>,
) -> Result<Json<List<NamespaceResource>>, ApiError> {
    Ok(Json(state.client.list_namespaces().await?))
}

async fn get_namespace(
    State(state): State<AppState>,
    Path(namespace): Path<Namespace>,
) -> Result<Json<NamespaceResource>, ApiError> {
    Ok(Json(state.client.get_namespace(&namespace).await?))
}
