//! Cluster MCP tools.
//!
//! One module per tool family, mirroring the client layer. Every tool
//! decodes its arguments into a typed params struct in one place, makes
//! its client calls, and reports failures as tool-level error results,
//! never as transport-level failures.

pub mod cluster;
pub mod inventory;
pub mod openshift;
pub mod pods;
pub mod resources;
pub mod virtualmachines;
pub mod workloads;

pub use cluster::cluster_tools;
pub use inventory::inventory_tools;
pub use openshift::openshift_tools;
pub use pods::pod_tools;
pub use resources::resource_tools;
pub use virtualmachines::virtualmachine_tools;
pub use workloads::deployment_tools;

use crate::clients::{
    AppsClient, CoreClient, KubeVirtClient, NetworkClient, OpenShiftClient, RbacClient,
    StorageClient,
};
use crate::cluster::ClusterBackend;
use crate::server::Tool;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Decode tool arguments into a typed params struct.
///
/// Absent arguments decode as an empty object so tools whose arguments
/// are all optional accept a bare call. Any mismatch (missing required
/// field, wrong type) is an error and the tool issues no cluster call.
pub(crate) fn decode_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| format!("invalid arguments: {e}"))
}

/// Get all cluster tools, wired to clients sharing one backend handle.
pub fn all_tools(backend: Arc<dyn ClusterBackend>) -> Vec<Arc<dyn Tool>> {
    let core = CoreClient::new(Arc::clone(&backend));
    let apps = AppsClient::new(Arc::clone(&backend));
    let network = NetworkClient::new(Arc::clone(&backend));
    let storage = StorageClient::new(Arc::clone(&backend));
    let rbac = RbacClient::new(Arc::clone(&backend));
    let openshift = OpenShiftClient::new(Arc::clone(&backend));
    let kubevirt = KubeVirtClient::new(Arc::clone(&backend));

    let mut tools = Vec::new();
    tools.extend(pod_tools(core.clone()));
    tools.extend(deployment_tools(apps));
    tools.extend(inventory_tools(core.clone()));
    tools.extend(cluster_tools(core, network, storage, rbac));
    tools.extend(resource_tools(backend));
    tools.extend(openshift_tools(openshift));
    tools.extend(virtualmachine_tools(kubevirt));
    tools
}
