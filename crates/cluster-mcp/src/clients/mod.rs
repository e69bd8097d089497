//! Per-API-group cluster clients.
//!
//! Each client wraps the shared [`ClusterBackend`] handle and exposes
//! typed request/response methods for one API group. Core Kubernetes
//! groups deserialize into `k8s-openapi` structs; OpenShift and
//! KubeVirt kinds stay dynamically typed and go through the generic
//! resource client.
//!
//! Clients receive the backend explicitly at construction. Nothing here
//! is a process-wide singleton.

pub mod apps;
pub mod core;
pub mod kubevirt;
pub mod network;
pub mod openshift;
pub mod rbac;
pub mod storage;

pub use apps::AppsClient;
pub use core::CoreClient;
pub use kubevirt::KubeVirtClient;
pub use network::NetworkClient;
pub use openshift::OpenShiftClient;
pub use rbac::RbacClient;
pub use storage::StorageClient;

use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterError, ResourceTarget};
use serde::de::DeserializeOwned;

/// List a collection and deserialize every item into a typed struct.
pub(crate) async fn list_typed<T: DeserializeOwned>(
    resources: &ResourceClient,
    target: &ResourceTarget,
    options: &ListOptions,
) -> Result<Vec<T>, ClusterError> {
    let items = resources.list(target, options).await?;
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|e| ClusterError::InvalidObject(e.to_string()))
        })
        .collect()
}

/// Get one object and deserialize it into a typed struct.
pub(crate) async fn get_typed<T: DeserializeOwned>(
    resources: &ResourceClient,
    target: &ResourceTarget,
    name: &str,
) -> Result<T, ClusterError> {
    let item = resources.get(target, name).await?;
    serde_json::from_value(item).map_err(|e| ClusterError::InvalidObject(e.to_string()))
}

/// List options carrying only a label selector.
pub(crate) fn selector_options(label_selector: Option<&str>) -> ListOptions {
    ListOptions {
        label_selector: label_selector.map(str::to_string),
        ..Default::default()
    }
}
