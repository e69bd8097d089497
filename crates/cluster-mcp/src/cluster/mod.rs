//! Cluster access layer.
//!
//! Everything above this module talks to the cluster through the
//! [`ClusterBackend`] trait: a thin, object-safe surface over the
//! Kubernetes REST API operating on dynamically-typed objects
//! (`serde_json::Value`). The production implementation
//! ([`kube_backend::KubeBackend`]) drives the `kube` client; tests use
//! an in-memory fake that records every call.

pub mod kube_backend;
pub mod object;
pub mod resources;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from the cluster access layer.
///
/// The original error text from the API server is always preserved so
/// it can be surfaced verbatim (with an operation prefix) to the RPC
/// caller.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Credential or connection resolution failed. Fatal at startup.
    #[error("failed to resolve cluster credentials: {0}")]
    Credentials(String),

    /// The addressed object does not exist.
    #[error("{resource} {name:?} not found")]
    NotFound {
        /// Plural resource name (e.g. "pods").
        resource: String,
        /// Object name.
        name: String,
    },

    /// The API server rejected the request.
    #[error("cluster API error ({code}): {message}")]
    Api {
        /// HTTP status code.
        code: u16,
        /// Error message from the API server.
        message: String,
    },

    /// The request never produced an API response.
    #[error("cluster request failed: {0}")]
    Request(String),

    /// An object payload is missing required envelope fields or has an
    /// unexpected shape.
    #[error("invalid object: {0}")]
    InvalidObject(String),
}

impl ClusterError {
    /// Whether this error is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }
}

/// Addresses a cluster resource collection or object.
///
/// `group` is empty for the core API group. `namespace` is `None` for
/// cluster-scoped access; whether a namespace is valid for the kind is
/// left to the API server to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTarget {
    /// API group (empty for core).
    pub group: String,
    /// API version, e.g. "v1".
    pub version: String,
    /// Plural resource name, e.g. "pods".
    pub plural: String,
    /// Kind, e.g. "Pod".
    pub kind: String,
    /// Namespace, if namespace-scoped access is intended.
    pub namespace: Option<String>,
}

impl ResourceTarget {
    /// Target a core (group-less) resource.
    pub fn core(version: &str, plural: &str, kind: &str) -> Self {
        Self::grouped("", version, plural, kind)
    }

    /// Target a resource in a named API group.
    pub fn grouped(group: &str, version: &str, plural: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            plural: plural.to_string(),
            kind: kind.to_string(),
            namespace: None,
        }
    }

    /// Scope the target to a namespace. An empty namespace means
    /// cluster-wide access.
    pub fn namespaced(mut self, namespace: &str) -> Self {
        if !namespace.is_empty() {
            self.namespace = Some(namespace.to_string());
        }
        self
    }

    /// The apiVersion string for this target ("v1" or "group/version").
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Options for a single list page request.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Label selector expression.
    pub label_selector: Option<String>,
    /// Field selector expression.
    pub field_selector: Option<String>,
    /// Page size. `None` lets the API server choose.
    pub limit: Option<u32>,
    /// Continuation token from the previous page.
    pub continue_token: Option<String>,
}

/// One page of a list response.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Items on this page.
    pub items: Vec<Value>,
    /// Token for the next page; absent or empty when exhausted.
    pub continue_token: Option<String>,
}

/// Options for a pod log request.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Container name; the API server picks the first container when
    /// absent.
    pub container: Option<String>,
    /// Number of lines from the end of the log.
    pub tail_lines: Option<i64>,
    /// Read the previous container instance's log.
    pub previous: bool,
}

/// Options for a pod exec request.
#[derive(Debug, Clone, Default)]
pub struct ExecQuery {
    /// Container name.
    pub container: Option<String>,
    /// Command and arguments.
    pub command: Vec<String>,
}

/// Captured output of an exec invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

/// Raw cluster operations.
///
/// One logical REST call per method; no pagination, no read-modify-write
/// composition. Those live in [`resources::ResourceClient`] so they can
/// be exercised against a fake backend.
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// Fetch a single page of a collection.
    async fn list_page(
        &self,
        target: &ResourceTarget,
        query: &ListQuery,
    ) -> Result<ObjectPage, ClusterError>;

    /// Fetch one object by name.
    async fn get(&self, target: &ResourceTarget, name: &str) -> Result<Value, ClusterError>;

    /// Create an object.
    async fn create(&self, target: &ResourceTarget, object: &Value) -> Result<Value, ClusterError>;

    /// Replace an object by name.
    async fn update(
        &self,
        target: &ResourceTarget,
        name: &str,
        object: &Value,
    ) -> Result<Value, ClusterError>;

    /// Apply a JSON merge patch to an object.
    async fn patch_merge(
        &self,
        target: &ResourceTarget,
        name: &str,
        patch: &Value,
    ) -> Result<Value, ClusterError>;

    /// Delete an object by name. Deleting a missing object is an error.
    async fn delete(&self, target: &ResourceTarget, name: &str) -> Result<(), ClusterError>;

    /// Fetch pod logs.
    async fn pod_logs(
        &self,
        namespace: &str,
        name: &str,
        query: &LogQuery,
    ) -> Result<String, ClusterError>;

    /// Execute a command in a pod container.
    async fn pod_exec(
        &self,
        namespace: &str,
        name: &str,
        query: &ExecQuery,
    ) -> Result<ExecOutput, ClusterError>;

    /// List the API groups and versions the server exposes.
    async fn api_groups(&self) -> Result<Value, ClusterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_api_version() {
        let core = ResourceTarget::core("v1", "pods", "Pod");
        assert_eq!(core.api_version(), "v1");

        let grouped = ResourceTarget::grouped("kubevirt.io", "v1", "virtualmachines", "VirtualMachine");
        assert_eq!(grouped.api_version(), "kubevirt.io/v1");
    }

    #[test]
    fn test_target_namespacing() {
        let target = ResourceTarget::core("v1", "pods", "Pod").namespaced("demo");
        assert_eq!(target.namespace.as_deref(), Some("demo"));

        let all = ResourceTarget::core("v1", "pods", "Pod").namespaced("");
        assert!(all.namespace.is_none());
    }

    #[test]
    fn test_not_found_detection() {
        let err = ClusterError::NotFound {
            resource: "pods".to_string(),
            name: "web".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!ClusterError::Request("boom".to_string()).is_not_found());
    }
}
