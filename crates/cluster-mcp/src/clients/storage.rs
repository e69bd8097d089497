//! storage.k8s.io/v1 client: storage classes.

use super::list_typed;
use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterBackend, ClusterError, ResourceTarget};
use k8s_openapi::api::storage::v1::StorageClass;
use std::sync::Arc;

/// Client for the `storage.k8s.io/v1` API group.
#[derive(Clone)]
pub struct StorageClient {
    resources: ResourceClient,
}

fn storageclasses() -> ResourceTarget {
    ResourceTarget::grouped("storage.k8s.io", "v1", "storageclasses", "StorageClass")
}

impl StorageClient {
    /// Create a new storage client over the shared backend.
    pub fn new(backend: Arc<dyn ClusterBackend>) -> Self {
        Self {
            resources: ResourceClient::new(backend),
        }
    }

    /// List storage classes.
    pub async fn list_storageclasses(&self) -> Result<Vec<StorageClass>, ClusterError> {
        list_typed(&self.resources, &storageclasses(), &ListOptions::default()).await
    }
}
