//! Core API group client.
//!
//! Pods (including logs, exec and delete), services, namespaces,
//! configmaps, secrets, persistent volume claims and nodes: everything
//! under `/api/v1`.

use super::{get_typed, list_typed, selector_options};
use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterBackend, ClusterError, ExecOutput, ExecQuery, LogQuery, ResourceTarget};
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, Node, PersistentVolumeClaim, Pod, Secret, Service,
};
use std::sync::Arc;

/// Client for the core (`v1`) API group.
#[derive(Clone)]
pub struct CoreClient {
    resources: ResourceClient,
    backend: Arc<dyn ClusterBackend>,
}

fn pods(namespace: &str) -> ResourceTarget {
    ResourceTarget::core("v1", "pods", "Pod").namespaced(namespace)
}

fn services(namespace: &str) -> ResourceTarget {
    ResourceTarget::core("v1", "services", "Service").namespaced(namespace)
}

fn configmaps(namespace: &str) -> ResourceTarget {
    ResourceTarget::core("v1", "configmaps", "ConfigMap").namespaced(namespace)
}

fn secrets(namespace: &str) -> ResourceTarget {
    ResourceTarget::core("v1", "secrets", "Secret").namespaced(namespace)
}

fn pvcs(namespace: &str) -> ResourceTarget {
    ResourceTarget::core("v1", "persistentvolumeclaims", "PersistentVolumeClaim")
        .namespaced(namespace)
}

fn namespaces() -> ResourceTarget {
    ResourceTarget::core("v1", "namespaces", "Namespace")
}

fn nodes() -> ResourceTarget {
    ResourceTarget::core("v1", "nodes", "Node")
}

impl CoreClient {
    /// Create a new core client over the shared backend.
    pub fn new(backend: Arc<dyn ClusterBackend>) -> Self {
        Self {
            resources: ResourceClient::new(Arc::clone(&backend)),
            backend,
        }
    }

    /// List pods, optionally filtered by label selector. An empty
    /// namespace lists across all namespaces.
    pub async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Pod>, ClusterError> {
        list_typed(
            &self.resources,
            &pods(namespace),
            &selector_options(label_selector),
        )
        .await
    }

    /// Get one pod.
    pub async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, ClusterError> {
        get_typed(&self.resources, &pods(namespace), name).await
    }

    /// Delete a pod. Deleting a missing pod is a not-found error.
    pub async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.resources.delete(&pods(namespace), name).await
    }

    /// Fetch pod logs.
    pub async fn pod_logs(
        &self,
        namespace: &str,
        name: &str,
        query: &LogQuery,
    ) -> Result<String, ClusterError> {
        self.backend.pod_logs(namespace, name, query).await
    }

    /// Execute a command in a pod container.
    pub async fn exec_pod(
        &self,
        namespace: &str,
        name: &str,
        query: &ExecQuery,
    ) -> Result<ExecOutput, ClusterError> {
        self.backend.pod_exec(namespace, name, query).await
    }

    /// List services.
    pub async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClusterError> {
        list_typed(&self.resources, &services(namespace), &ListOptions::default()).await
    }

    /// Get one service.
    pub async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError> {
        get_typed(&self.resources, &services(namespace), name).await
    }

    /// List configmaps.
    pub async fn list_configmaps(&self, namespace: &str) -> Result<Vec<ConfigMap>, ClusterError> {
        list_typed(
            &self.resources,
            &configmaps(namespace),
            &ListOptions::default(),
        )
        .await
    }

    /// Get one configmap.
    pub async fn get_configmap(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ConfigMap, ClusterError> {
        get_typed(&self.resources, &configmaps(namespace), name).await
    }

    /// List secrets.
    pub async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, ClusterError> {
        list_typed(&self.resources, &secrets(namespace), &ListOptions::default()).await
    }

    /// Get one secret.
    pub async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ClusterError> {
        get_typed(&self.resources, &secrets(namespace), name).await
    }

    /// List persistent volume claims.
    pub async fn list_pvcs(
        &self,
        namespace: &str,
    ) -> Result<Vec<PersistentVolumeClaim>, ClusterError> {
        list_typed(&self.resources, &pvcs(namespace), &ListOptions::default()).await
    }

    /// Get one persistent volume claim.
    pub async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<PersistentVolumeClaim, ClusterError> {
        get_typed(&self.resources, &pvcs(namespace), name).await
    }

    /// List namespaces.
    pub async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        list_typed(&self.resources, &namespaces(), &ListOptions::default()).await
    }

    /// List nodes.
    pub async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError> {
        list_typed(&self.resources, &nodes(), &ListOptions::default()).await
    }

    /// Get one node.
    pub async fn get_node(&self, name: &str) -> Result<Node, ClusterError> {
        get_typed(&self.resources, &nodes(), name).await
    }
}
