//! rbac.authorization.k8s.io/v1 client: roles and bindings.

use super::list_typed;
use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterBackend, ClusterError, ResourceTarget};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use std::sync::Arc;

const GROUP: &str = "rbac.authorization.k8s.io";

/// Client for the RBAC API group.
#[derive(Clone)]
pub struct RbacClient {
    resources: ResourceClient,
}

fn roles(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped(GROUP, "v1", "roles", "Role").namespaced(namespace)
}

fn rolebindings(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped(GROUP, "v1", "rolebindings", "RoleBinding").namespaced(namespace)
}

fn clusterroles() -> ResourceTarget {
    ResourceTarget::grouped(GROUP, "v1", "clusterroles", "ClusterRole")
}

fn clusterrolebindings() -> ResourceTarget {
    ResourceTarget::grouped(GROUP, "v1", "clusterrolebindings", "ClusterRoleBinding")
}

impl RbacClient {
    /// Create a new RBAC client over the shared backend.
    pub fn new(backend: Arc<dyn ClusterBackend>) -> Self {
        Self {
            resources: ResourceClient::new(backend),
        }
    }

    /// List roles in a namespace.
    pub async fn list_roles(&self, namespace: &str) -> Result<Vec<Role>, ClusterError> {
        list_typed(&self.resources, &roles(namespace), &ListOptions::default()).await
    }

    /// List role bindings in a namespace.
    pub async fn list_rolebindings(
        &self,
        namespace: &str,
    ) -> Result<Vec<RoleBinding>, ClusterError> {
        list_typed(
            &self.resources,
            &rolebindings(namespace),
            &ListOptions::default(),
        )
        .await
    }

    /// List cluster roles.
    pub async fn list_clusterroles(&self) -> Result<Vec<ClusterRole>, ClusterError> {
        list_typed(&self.resources, &clusterroles(), &ListOptions::default()).await
    }

    /// List cluster role bindings.
    pub async fn list_clusterrolebindings(
        &self,
    ) -> Result<Vec<ClusterRoleBinding>, ClusterError> {
        list_typed(
            &self.resources,
            &clusterrolebindings(),
            &ListOptions::default(),
        )
        .await
    }
}
