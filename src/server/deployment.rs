use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::Scale;
use k8s_openapi::List;
use serde::Deserialize;
use tracing::{debug, info};

use super::error::ApiError;
use super::AppState;
use crate::kubernetes::model::{DeletePropagation, DeploymentName, Namespace};
use crate::kubernetes::replicas::{current_replicas, parse_replicas, plan_scale, with_replicas};

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(rename = "propagationPolicy", default)]
    pub propagation_policy: Option<DeletePropagation>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:namespace/deployments", get(list_deployments))
        .route(
            "/:namespace/deployments/:name",
            get(get_deployment).delete(delete_deployment),
        )
        .route("/:namespace/deployments/:name/scale", get(read_scale))
        .route("/:namespace/deployments/:name/:replica", put(update_replicas))
}

async fn list_deployments(
    State(state): State<AppState>,
    Path(namespace): Path<Namespace>,
) -> Result<Json<List<Deployment>>, ApiError> {
    let deployments = state.client.list_deployments(&namespace).await?;
    debug!(%namespace, count = deployments.items.len(), "Listed deployments");
    Ok(Json(deployments))
}

async fn get_deployment(
    State(state): State<AppState>,
    Path((namespace, deployment)): Path<(Namespace, DeploymentName)>,
) -> Result<Json<Deployment>, ApiError> {
    let found = state.client.get_deployment(&namespace, &deployment).await?;
    Ok(Json(found))
}

async fn delete_deployment(
    State(state): State<AppState>,
    Path((namespace, deployment)): Path<(Namespace, DeploymentName)>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<bool>, ApiError> {
    let Query(query) = query?;
    state
        .client
        .delete_deployment(&namespace, &deployment, query.propagation_policy)
        .await?;
    info!(
        %namespace,
        %deployment,
        propagation = ?query.propagation_policy,
        "Deleted deployment"
    );
    Ok(Json(true))
}

async fn read_scale(
    State(state): State<AppState>,
    Path((namespace, deployment)): Path<(Namespace, DeploymentName)>,
) -> Result<Json<Scale>, ApiError> {
    let scale = state
        .client
        .get_deployment_scale(&namespace, &deployment)
        .await?;
    Ok(Json(scale))
}

/// Fetch the scale subresource, then write it back with the requested count.
/// There is no retry: a concurrent writer surfaces as the API server's 409.
async fn update_replicas(
    State(state): State<AppState>,
    Path((namespace, deployment, replica)): Path<(Namespace, DeploymentName, String)>,
) -> Result<Json<Scale>, ApiError> {
    let requested = parse_replicas(&replica)?;
    let scale = state
        .client
        .get_deployment_scale(&namespace, &deployment)
        .await?;
    let current = current_replicas(&scale);
    let replicas = plan_scale(current, requested)?;

    let updated = state
        .client
        .replace_deployment_scale(&namespace, &deployment, with_replicas(scale, replicas))
        .await?;
    info!(
        %namespace,
        %deployment,
        from = current,
        to = replicas,
        "Updated deployment replicas"
    );
    Ok(Json(updated))
}
