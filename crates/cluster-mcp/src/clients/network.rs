//! networking.k8s.io/v1 client: ingresses.

use super::{get_typed, list_typed};
use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterBackend, ClusterError, ResourceTarget};
use k8s_openapi::api::networking::v1::Ingress;
use std::sync::Arc;

/// Client for the `networking.k8s.io/v1` API group.
#[derive(Clone)]
pub struct NetworkClient {
    resources: ResourceClient,
}

fn ingresses(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped("networking.k8s.io", "v1", "ingresses", "Ingress")
        .namespaced(namespace)
}

impl NetworkClient {
    /// Create a new networking client over the shared backend.
    pub fn new(backend: Arc<dyn ClusterBackend>) -> Self {
        Self {
            resources: ResourceClient::new(backend),
        }
    }

    /// List ingresses.
    pub async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, ClusterError> {
        list_typed(
            &self.resources,
            &ingresses(namespace),
            &ListOptions::default(),
        )
        .await
    }

    /// Get one ingress.
    pub async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Ingress, ClusterError> {
        get_typed(&self.resources, &ingresses(namespace), name).await
    }
}
