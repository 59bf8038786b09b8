//! HTTP surface re-exposing a subset of the cluster API.
//!
//! Every handler makes a single pass-through call through [`K8sClient`] and
//! answers with the resulting object, or with a `Status` shaped failure.
//!
//! [`K8sClient`]: crate::kubernetes::model::K8sClient

mod deployment;
mod error;
mod health;
mod namespace;
mod pod;

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::kubernetes::model::SharedK8sClient;

#[derive(Clone)]
pub struct AppState {
    pub client: SharedK8sClient,
}

pub fn router(client: SharedK8sClient) -> Router {
    Router::new()
        .nest("/apis/apps/v1", deployment::routes())
        .nest("/api/v1", namespace::routes().merge(pod::routes()))
        .merge(health::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { client })
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(client: SharedK8sClient, bind: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind).await?;
    info!(address = %listener.local_addr()?, "Serving cluster API facade");
    axum::serve(listener, router(client))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
