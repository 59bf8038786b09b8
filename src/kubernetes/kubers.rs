use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::Scale;
use k8s_openapi::api::core::v1::{Namespace as NamespaceResource, Pod};
use k8s_openapi::apimachinery::pkg::version::Info;
use k8s_openapi::{List, ListableResource};
use kube::api::{DeleteParams, ListParams, ObjectList, PostParams, PropagationPolicy};
use kube_client::config::{KubeConfigOptions, Kubeconfig};
use kube_client::{Api, Client, Config};
use tracing::{debug, info};

use crate::kubernetes::model::{
    ClusterError, ClusterResult, DeletePropagation, DeploymentName, K8sClient, Namespace, PodName,
};

impl From<kube_client::Error> for ClusterError {
    fn from(err: kube_client::Error) -> Self {
        match err {
            kube_client::Error::Api(response) => ClusterError::Api {
                code: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => ClusterError::Transport(other.to_string()),
        }
    }
}

impl From<DeletePropagation> for PropagationPolicy {
    fn from(value: DeletePropagation) -> Self {
        match value {
            DeletePropagation::Foreground => PropagationPolicy::Foreground,
            DeletePropagation::Background => PropagationPolicy::Background,
            DeletePropagation::Orphan => PropagationPolicy::Orphan,
        }
    }
}

/// Builds a client from an explicit kubeconfig file, a kubeconfig context,
/// or whatever the environment provides (in-cluster account, `$KUBECONFIG`).
pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> anyhow::Result<Client> {
    let context_options = KubeConfigOptions {
        context: context.map(str::to_string),
        ..Default::default()
    };
    let config = match (kubeconfig, context) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &context_options).await?
        }
        (None, Some(_)) => Config::from_kubeconfig(&context_options).await?,
        (None, None) => Config::infer().await?,
    };
    info!(cluster_url = %config.cluster_url, "Using cluster API server");
    Ok(Client::try_from(config)?)
}

fn into_list<T>(objects: ObjectList<T>) -> List<T>
where
    T: ListableResource + Clone,
{
    List {
        metadata: objects.metadata,
        items: objects.items,
    }
}

pub struct KubeRsBased {
    client: Client,
}

impl KubeRsBased {
    pub fn new(client: Client) -> KubeRsBased {
        KubeRsBased { client }
    }

    fn deployments(&self, namespace: &Namespace) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace.0.as_str())
    }

    fn pods(&self, namespace: &Namespace) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace.0.as_str())
    }

    fn namespaces(&self) -> Api<NamespaceResource> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl K8sClient for KubeRsBased {
    async fn list_deployments(&self, namespace: &Namespace) -> ClusterResult<List<Deployment>> {
        let deployments = self
            .deployments(namespace)
            .list(&ListParams::default())
            .await?;
        Ok(into_list(deployments))
    }

    async fn get_deployment(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
    ) -> ClusterResult<Deployment> {
        Ok(self
            .deployments(namespace)
            .get(deployment.0.as_str())
            .await?)
    }

    async fn delete_deployment(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
        propagation: Option<DeletePropagation>,
    ) -> ClusterResult<()> {
        let params = DeleteParams {
            propagation_policy: propagation.map(PropagationPolicy::from),
            ..Default::default()
        };
        let outcome = self
            .deployments(namespace)
            .delete(deployment.0.as_str(), &params)
            .await?;
        debug!(
            %namespace,
            %deployment,
            pending_finalizers = outcome.is_left(),
            "Deployment deletion accepted"
        );
        Ok(())
    }

    async fn get_deployment_scale(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
    ) -> ClusterResult<Scale> {
        Ok(self
            .deployments(namespace)
            .get_scale(deployment.0.as_str())
            .await?)
    }

    async fn replace_deployment_scale(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
        scale: Scale,
    ) -> ClusterResult<Scale> {
        let data =
            serde_json::to_vec(&scale).map_err(|e| ClusterError::Transport(e.to_string()))?;
        Ok(self
            .deployments(namespace)
            .replace_scale(deployment.0.as_str(), &PostParams::default(), data)
            .await?)
    }

    async fn list_namespaces(&self) -> ClusterResult<List<NamespaceResource>> {
        let namespaces = self.namespaces().list(&ListParams::default()).await?;
        Ok(into_list(namespaces))
    }

    async fn get_namespace(&self, namespace: &Namespace) -> ClusterResult<NamespaceResource> {
        Ok(self.namespaces().get(namespace.0.as_str()).await?)
    }

    async fn list_pods(&self, namespace: &Namespace) -> ClusterResult<List<Pod>> {
        let pods = self.pods(namespace).list(&ListParams::default()).await?;
        Ok(into_list(pods))
    }

    async fn get_pod(&self, namespace: &Namespace, pod: &PodName) -> ClusterResult<Pod> {
        Ok(self.pods(namespace).get(pod.0.as_str()).await?)
    }

    async fn server_version(&self) -> ClusterResult<Info> {
        Ok(self.client.apiserver_version().await?)
    }
}
