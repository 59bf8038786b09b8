use std::fmt::{Display, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::Scale;
use k8s_openapi::api::core::v1::{Namespace as NamespaceResource, Pod};
use k8s_openapi::apimachinery::pkg::version::Info;
use k8s_openapi::List;
use serde::Deserialize;

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Namespace(pub String);

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DeploymentName(pub String);

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PodName(pub String);

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for DeploymentName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for PodName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How dependents of a deleted deployment are garbage collected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
pub enum DeletePropagation {
    Foreground,
    Background,
    Orphan,
}

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// The API server answered with a failure status.
    #[error("{message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },
    /// No answer from the API server (connection, TLS, auth, decoding).
    #[error("cluster request failed: {0}")]
    Transport(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;

/// Pass-through access to the cluster API. One method per upstream call.
#[async_trait]
pub trait K8sClient {
    async fn list_deployments(&self, namespace: &Namespace) -> ClusterResult<List<Deployment>>;

    async fn get_deployment(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
    ) -> ClusterResult<Deployment>;

    async fn delete_deployment(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
        propagation: Option<DeletePropagation>,
    ) -> ClusterResult<()>;

    async fn get_deployment_scale(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
    ) -> ClusterResult<Scale>;

    async fn replace_deployment_scale(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
        scale: Scale,
    ) -> ClusterResult<Scale>;

    async fn list_namespaces(&self) -> ClusterResult<List<NamespaceResource>>;

    async fn get_namespace(&self, namespace: &Namespace) -> ClusterResult<NamespaceResource>;

    async fn list_pods(&self, namespace: &Namespace) -> ClusterResult<List<Pod>>;

    async fn get_pod(&self, namespace: &Namespace, pod: &PodName) -> ClusterResult<Pod>;

    async fn server_version(&self) -> ClusterResult<Info>;
}

// Thread safe type alias
pub type SharedK8sClient = Arc<dyn K8sClient + Send + Sync + 'static>;
