//! KubeVirt client: VirtualMachine operations via merge patches on
//! `spec.runStrategy`, the same mechanism `virtctl` uses.

use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterBackend, ClusterError, ResourceTarget};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Step of the restart toggle that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartStep {
    /// The halting patch (`runStrategy=Halted`).
    Stop,
    /// The starting patch (`runStrategy=Always`).
    Start,
}

impl fmt::Display for RestartStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartStep::Stop => f.write_str("stop"),
            RestartStep::Start => f.write_str("start"),
        }
    }
}

/// Restart failure, carrying the failing step.
///
/// A failure at the start step means the stop patch already took
/// effect and the machine is left halted.
#[derive(Debug, Error)]
#[error("restart failed at {step} step: {source}")]
pub struct RestartError {
    /// The step that failed.
    pub step: RestartStep,
    /// The underlying cluster error.
    #[source]
    pub source: ClusterError,
}

/// Client for `kubevirt.io/v1` VirtualMachines.
#[derive(Clone)]
pub struct KubeVirtClient {
    resources: ResourceClient,
    backend: Arc<dyn ClusterBackend>,
}

fn virtualmachines(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped("kubevirt.io", "v1", "virtualmachines", "VirtualMachine")
        .namespaced(namespace)
}

impl KubeVirtClient {
    /// Create a new KubeVirt client over the shared backend.
    pub fn new(backend: Arc<dyn ClusterBackend>) -> Self {
        Self {
            resources: ResourceClient::new(Arc::clone(&backend)),
            backend,
        }
    }

    /// List virtual machines. An empty namespace lists across all
    /// namespaces.
    pub async fn list(&self, namespace: &str) -> Result<Vec<Value>, ClusterError> {
        self.resources
            .list(&virtualmachines(namespace), &ListOptions::default())
            .await
    }

    /// Get one virtual machine.
    pub async fn get(&self, namespace: &str, name: &str) -> Result<Value, ClusterError> {
        self.resources.get(&virtualmachines(namespace), name).await
    }

    /// Start a virtual machine by setting `spec.runStrategy=Always`.
    pub async fn start(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.patch_run_strategy(namespace, name, "Always").await
    }

    /// Stop a virtual machine by setting `spec.runStrategy=Halted`.
    pub async fn stop(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.patch_run_strategy(namespace, name, "Halted").await
    }

    /// Restart a virtual machine by toggling the run strategy: one
    /// halting patch, then one starting patch. The two patches are
    /// independent; there is no compensation if the second fails.
    pub async fn restart(&self, namespace: &str, name: &str) -> Result<(), RestartError> {
        self.stop(namespace, name)
            .await
            .map_err(|source| RestartError {
                step: RestartStep::Stop,
                source,
            })?;
        self.start(namespace, name)
            .await
            .map_err(|source| RestartError {
                step: RestartStep::Start,
                source,
            })
    }

    /// Update CPU and/or memory requests of a virtual machine.
    pub async fn edit_resources(
        &self,
        namespace: &str,
        name: &str,
        cpu: Option<&str>,
        memory: Option<&str>,
    ) -> Result<(), ClusterError> {
        let mut requests = serde_json::Map::new();
        if let Some(cpu) = cpu {
            requests.insert("cpu".to_string(), Value::String(cpu.to_string()));
        }
        if let Some(memory) = memory {
            requests.insert("memory".to_string(), Value::String(memory.to_string()));
        }
        if requests.is_empty() {
            return Err(ClusterError::InvalidObject(
                "at least one of cpu or memory must be set".to_string(),
            ));
        }

        let patch = json!({
            "spec": {"template": {"spec": {"domain": {"resources": {
                "requests": Value::Object(requests)
            }}}}}
        });
        self.backend
            .patch_merge(&virtualmachines(namespace), name, &patch)
            .await
            .map(|_| ())
    }

    async fn patch_run_strategy(
        &self,
        namespace: &str,
        name: &str,
        strategy: &str,
    ) -> Result<(), ClusterError> {
        debug!(namespace, name, strategy, "patching runStrategy");
        let patch = json!({"spec": {"runStrategy": strategy}});
        self.backend
            .patch_merge(&virtualmachines(namespace), name, &patch)
            .await
            .map(|_| ())
    }
}
