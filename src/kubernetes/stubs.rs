use async_trait::async_trait;
use dashmap::DashMap;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec};
use k8s_openapi::api::core::v1::{Namespace as NamespaceResource, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ListMeta, ObjectMeta};
use k8s_openapi::apimachinery::pkg::version::Info;
use k8s_openapi::{List, ListableResource};

use crate::kubernetes::model::{
    ClusterError, ClusterResult, DeletePropagation, DeploymentName, K8sClient, Namespace, PodName,
};

type Key = (String, String);

fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        resource_version: Some("1".to_string()),
        ..Default::default()
    }
}

pub fn not_found(kind: &str, name: &str) -> ClusterError {
    ClusterError::Api {
        code: 404,
        reason: "NotFound".to_string(),
        message: format!("{kind} \"{name}\" not found"),
    }
}

fn bump_version(metadata: &mut ObjectMeta) {
    let next = metadata
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    metadata.resource_version = Some(next.to_string());
}

fn sorted_list<T: ListableResource + Clone>(mut items: Vec<(String, T)>) -> List<T> {
    items.sort_by(|a, b| a.0.cmp(&b.0));
    List {
        metadata: ListMeta::default(),
        items: items.into_iter().map(|(_, item)| item).collect(),
    }
}

/// Cluster kept in memory. Scale reads and writes go through the
/// deployment's `spec.replicas`, the same way the API server projects them.
#[derive(Default)]
pub struct InMemoryCluster {
    namespaces: DashMap<String, NamespaceResource>,
    deployments: DashMap<Key, Deployment>,
    pods: DashMap<Key, Pod>,
    deletions: DashMap<Key, Option<DeletePropagation>>,
    reachable: bool,
    racing_writer: bool,
}

impl InMemoryCluster {
    pub fn new() -> InMemoryCluster {
        InMemoryCluster {
            reachable: true,
            ..Default::default()
        }
    }

    /// Every call fails as if the API server could not be reached.
    pub fn unreachable() -> InMemoryCluster {
        InMemoryCluster {
            reachable: false,
            ..Default::default()
        }
    }

    /// Another writer updates the deployment right after each scale read,
    /// so the scale handed out is already stale.
    pub fn with_racing_writer(mut self) -> InMemoryCluster {
        self.racing_writer = true;
        self
    }

    pub fn with_namespace(self, name: &str) -> InMemoryCluster {
        self.namespaces.insert(
            name.to_string(),
            NamespaceResource {
                metadata: meta(None, name),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_deployment(
        self,
        namespace: &str,
        name: &str,
        replicas: Option<i32>,
    ) -> InMemoryCluster {
        let deployment = Deployment {
            metadata: meta(Some(namespace), name),
            spec: Some(DeploymentSpec {
                replicas,
                ..Default::default()
            }),
            status: None,
        };
        self.deployments
            .insert((namespace.to_string(), name.to_string()), deployment);
        self
    }

    pub fn with_pod(self, namespace: &str, name: &str) -> InMemoryCluster {
        let pod = Pod {
            metadata: meta(Some(namespace), name),
            ..Default::default()
        };
        self.pods.insert((namespace.to_string(), name.to_string()), pod);
        self
    }

    pub fn replicas_of(&self, namespace: &str, name: &str) -> Option<i32> {
        self.deployments
            .get(&(namespace.to_string(), name.to_string()))
            .and_then(|d| d.spec.as_ref().and_then(|spec| spec.replicas))
    }

    pub fn deletion_of(&self, namespace: &str, name: &str) -> Option<Option<DeletePropagation>> {
        self.deletions
            .get(&(namespace.to_string(), name.to_string()))
            .map(|entry| *entry)
    }

    fn ensure_reachable(&self) -> ClusterResult<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(ClusterError::Transport("connection refused".to_string()))
        }
    }

    fn deployment_key(namespace: &Namespace, deployment: &DeploymentName) -> Key {
        (namespace.0.clone(), deployment.0.clone())
    }
}

#[async_trait]
impl K8sClient for InMemoryCluster {
    async fn list_deployments(&self, namespace: &Namespace) -> ClusterResult<List<Deployment>> {
        self.ensure_reachable()?;
        let items = self
            .deployments
            .iter()
            .filter(|entry| entry.key().0 == namespace.0)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        Ok(sorted_list(items))
    }

    async fn get_deployment(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
    ) -> ClusterResult<Deployment> {
        self.ensure_reachable()?;
        self.deployments
            .get(&Self::deployment_key(namespace, deployment))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found("deployments.apps", &deployment.0))
    }

    async fn delete_deployment(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
        propagation: Option<DeletePropagation>,
    ) -> ClusterResult<()> {
        self.ensure_reachable()?;
        let key = Self::deployment_key(namespace, deployment);
        self.deployments
            .remove(&key)
            .ok_or_else(|| not_found("deployments.apps", &deployment.0))?;
        self.deletions.insert(key, propagation);
        Ok(())
    }

    async fn get_deployment_scale(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
    ) -> ClusterResult<Scale> {
        let found = self.get_deployment(namespace, deployment).await?;
        if self.racing_writer {
            if let Some(mut stored) = self
                .deployments
                .get_mut(&Self::deployment_key(namespace, deployment))
            {
                bump_version(&mut stored.metadata);
            }
        }
        Ok(Scale {
            metadata: found.metadata,
            spec: Some(ScaleSpec {
                replicas: found.spec.and_then(|spec| spec.replicas),
            }),
            status: None,
        })
    }

    async fn replace_deployment_scale(
        &self,
        namespace: &Namespace,
        deployment: &DeploymentName,
        scale: Scale,
    ) -> ClusterResult<Scale> {
        self.ensure_reachable()?;
        let key = Self::deployment_key(namespace, deployment);
        let mut stored = self
            .deployments
            .get_mut(&key)
            .ok_or_else(|| not_found("deployments.apps", &deployment.0))?;
        if stored.metadata.resource_version != scale.metadata.resource_version {
            return Err(ClusterError::Api {
                code: 409,
                reason: "Conflict".to_string(),
                message: "the object has been modified".to_string(),
            });
        }
        let replicas = scale.spec.as_ref().and_then(|spec| spec.replicas);
        stored.spec.get_or_insert_with(DeploymentSpec::default).replicas = replicas;
        bump_version(&mut stored.metadata);
        Ok(Scale {
            metadata: stored.metadata.clone(),
            spec: Some(ScaleSpec { replicas }),
            status: None,
        })
    }

    async fn list_namespaces(&self) -> ClusterResult<List<NamespaceResource>> {
        self.ensure_reachable()?;
        let items = self
            .namespaces
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        Ok(sorted_list(items))
    }

    async fn get_namespace(&self, namespace: &Namespace) -> ClusterResult<NamespaceResource> {
        self.ensure_reachable()?;
        self.namespaces
            .get(&namespace.0)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found("namespaces", &namespace.0))
    }

    async fn list_pods(&self, namespace: &Namespace) -> ClusterResult<List<Pod>> {
        self.ensure_reachable()?;
        let items = self
            .pods
            .iter()
            .filter(|entry| entry.key().0 == namespace.0)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        Ok(sorted_list(items))
    }

    async fn get_pod(&self, namespace: &Namespace, pod: &PodName) -> ClusterResult<Pod> {
        self.ensure_reachable()?;
        self.pods
            .get(&(namespace.0.clone(), pod.0.clone()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found("pods", &pod.0))
    }

    async fn server_version(&self) -> ClusterResult<Info> {
        self.ensure_reachable()?;
        Ok(Info {
            major: "1".to_string(),
            minor: "24".to_string(),
            git_version: "v1.24.0".to_string(),
            ..Default::default()
        })
    }
}
