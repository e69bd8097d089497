//! Cluster inventory tools: namespaces, nodes, storage classes,
//! ingresses and RBAC.

use super::decode_args;
use crate::clients::{CoreClient, NetworkClient, RbacClient, StorageClient};
use crate::server::Tool;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::storage::v1::StorageClass;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, instrument};

const DEFAULT_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";

#[derive(Debug, Deserialize)]
struct NamespaceParams {
    #[serde(default)]
    namespace: String,
}

#[derive(Debug, Deserialize)]
struct NameParams {
    #[serde(default)]
    name: String,
}

/// Tool to list namespaces.
pub struct ListNamespacesTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for ListNamespacesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_namespaces", "List all namespaces in the cluster")
            .with_category("cluster")
    }

    #[instrument(skip(self, _args), fields(tool = "list_namespaces"))]
    async fn execute(&self, _args: serde_json::Value) -> ToolResult {
        match self.client.list_namespaces().await {
            Ok(namespaces) => {
                let mut out = format!("Total namespaces: {}\n\n", namespaces.len());
                for namespace in &namespaces {
                    out.push_str(&format!(
                        "Name: {}\nStatus: {}\n\n",
                        namespace.metadata.name.as_deref().unwrap_or(""),
                        namespace
                            .status
                            .as_ref()
                            .and_then(|s| s.phase.as_deref())
                            .unwrap_or(""),
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list namespaces: {}", e);
                ToolResult::error(format!("Failed to list namespaces: {}", e))
            }
        }
    }
}

/// Tool to list nodes.
pub struct ListNodesTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for ListNodesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_nodes", "List all nodes in the cluster").with_category("cluster")
    }

    #[instrument(skip(self, _args), fields(tool = "list_nodes"))]
    async fn execute(&self, _args: serde_json::Value) -> ToolResult {
        match self.client.list_nodes().await {
            Ok(nodes) => ToolResult::text(format_nodes_list(&nodes)),
            Err(e) => {
                error!("Failed to list nodes: {}", e);
                ToolResult::error(format!("Failed to list nodes: {}", e))
            }
        }
    }
}

/// Tool to get one node.
pub struct GetNodeTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for GetNodeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_node", "Get detailed information about a specific node")
            .with_category("cluster")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the node"}
                },
                "required": ["name"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "get_node"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NameParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() {
            return ToolResult::error("name is required");
        }

        match self.client.get_node(&params.name).await {
            Ok(node) => ToolResult::text(format_node_details(&node)),
            Err(e) => {
                error!("Failed to get node: {}", e);
                ToolResult::error(format!("Failed to get node: {}", e))
            }
        }
    }
}

/// Tool to list storage classes.
pub struct ListStorageClassesTool {
    client: StorageClient,
}

#[async_trait]
impl Tool for ListStorageClassesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_storageclasses", "List all StorageClasses in the cluster")
            .with_category("cluster")
    }

    #[instrument(skip(self, _args), fields(tool = "list_storageclasses"))]
    async fn execute(&self, _args: serde_json::Value) -> ToolResult {
        match self.client.list_storageclasses().await {
            Ok(classes) => ToolResult::text(format_storageclasses_list(&classes)),
            Err(e) => {
                error!("Failed to list StorageClasses: {}", e);
                ToolResult::error(format!("Failed to list StorageClasses: {}", e))
            }
        }
    }
}

/// Tool to list ingresses.
pub struct ListIngressesTool {
    client: NetworkClient,
}

#[async_trait]
impl Tool for ListIngressesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_ingresses", "List ingresses in a namespace or across all namespaces")
            .with_category("cluster")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "namespace": {
                        "type": "string",
                        "description": "Namespace to list ingresses from (empty for all namespaces)"
                    }
                }
            }))
    }

    #[instrument(skip(self, args), fields(tool = "list_ingresses"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_ingresses(&params.namespace).await {
            Ok(ingresses) => ToolResult::text(format_ingresses_list(&ingresses)),
            Err(e) => {
                error!("Failed to list ingresses: {}", e);
                ToolResult::error(format!("Failed to list ingresses: {}", e))
            }
        }
    }
}

/// Tool to get one ingress.
pub struct GetIngressTool {
    client: NetworkClient,
}

#[async_trait]
impl Tool for GetIngressTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_ingress", "Get detailed information about a specific ingress")
            .with_category("cluster")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the ingress"},
                    "namespace": {"type": "string", "description": "Namespace of the ingress"}
                },
                "required": ["name", "namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "get_ingress"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[serde(default)]
            name: String,
            #[serde(default)]
            namespace: String,
        }
        let params: Params = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self
            .client
            .get_ingress(&params.namespace, &params.name)
            .await
        {
            Ok(ingress) => ToolResult::text(format_ingress_details(&ingress)),
            Err(e) => {
                error!("Failed to get ingress: {}", e);
                ToolResult::error(format!("Failed to get ingress: {}", e))
            }
        }
    }
}

/// Tool to list roles in a namespace.
pub struct ListRolesTool {
    client: RbacClient,
}

#[async_trait]
impl Tool for ListRolesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_roles", "List RBAC Roles in a namespace")
            .with_category("rbac")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "namespace": {"type": "string", "description": "Namespace to list roles from"}
                },
                "required": ["namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "list_roles"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.namespace.is_empty() {
            return ToolResult::error("namespace is required");
        }

        match self.client.list_roles(&params.namespace).await {
            Ok(roles) => {
                let mut out = format!("Roles: {}\n\n", roles.len());
                for role in &roles {
                    out.push_str(&format!(
                        "- Role: {}\n",
                        role.metadata.name.as_deref().unwrap_or("")
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list Roles: {}", e);
                ToolResult::error(format!("Failed to list Roles: {}", e))
            }
        }
    }
}

/// Tool to list role bindings in a namespace.
pub struct ListRoleBindingsTool {
    client: RbacClient,
}

#[async_trait]
impl Tool for ListRoleBindingsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_rolebindings", "List RBAC RoleBindings in a namespace")
            .with_category("rbac")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "namespace": {"type": "string", "description": "Namespace to list role bindings from"}
                },
                "required": ["namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "list_rolebindings"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.namespace.is_empty() {
            return ToolResult::error("namespace is required");
        }

        match self.client.list_rolebindings(&params.namespace).await {
            Ok(bindings) => {
                let mut out = format!("RoleBindings: {}\n\n", bindings.len());
                for binding in &bindings {
                    out.push_str(&format!(
                        "- RoleBinding: {} (role: {})\n",
                        binding.metadata.name.as_deref().unwrap_or(""),
                        binding.role_ref.name,
                    ));
                    for subject in binding.subjects.iter().flatten() {
                        out.push_str(&format!(
                            "    Subject: {} {} ({})\n",
                            subject.kind,
                            subject.name,
                            subject.namespace.as_deref().unwrap_or(""),
                        ));
                    }
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list RoleBindings: {}", e);
                ToolResult::error(format!("Failed to list RoleBindings: {}", e))
            }
        }
    }
}

/// Tool to list cluster roles.
pub struct ListClusterRolesTool {
    client: RbacClient,
}

#[async_trait]
impl Tool for ListClusterRolesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_clusterroles", "List RBAC ClusterRoles").with_category("rbac")
    }

    #[instrument(skip(self, _args), fields(tool = "list_clusterroles"))]
    async fn execute(&self, _args: serde_json::Value) -> ToolResult {
        match self.client.list_clusterroles().await {
            Ok(roles) => {
                let mut out = format!("ClusterRoles: {}\n\n", roles.len());
                for role in &roles {
                    out.push_str(&format!(
                        "- ClusterRole: {}\n",
                        role.metadata.name.as_deref().unwrap_or("")
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list ClusterRoles: {}", e);
                ToolResult::error(format!("Failed to list ClusterRoles: {}", e))
            }
        }
    }
}

/// Tool to list cluster role bindings.
pub struct ListClusterRoleBindingsTool {
    client: RbacClient,
}

#[async_trait]
impl Tool for ListClusterRoleBindingsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_clusterrolebindings", "List RBAC ClusterRoleBindings")
            .with_category("rbac")
    }

    #[instrument(skip(self, _args), fields(tool = "list_clusterrolebindings"))]
    async fn execute(&self, _args: serde_json::Value) -> ToolResult {
        match self.client.list_clusterrolebindings().await {
            Ok(bindings) => {
                let mut out = format!("ClusterRoleBindings: {}\n\n", bindings.len());
                for binding in &bindings {
                    out.push_str(&format!(
                        "- ClusterRoleBinding: {} (role: {})\n",
                        binding.metadata.name.as_deref().unwrap_or(""),
                        binding.role_ref.name,
                    ));
                    for subject in binding.subjects.iter().flatten() {
                        out.push_str(&format!(
                            "    Subject: {} {} ({})\n",
                            subject.kind,
                            subject.name,
                            subject.namespace.as_deref().unwrap_or(""),
                        ));
                    }
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list ClusterRoleBindings: {}", e);
                ToolResult::error(format!("Failed to list ClusterRoleBindings: {}", e))
            }
        }
    }
}

fn format_nodes_list(nodes: &[Node]) -> String {
    let mut out = format!("Total Nodes: {}\n\n", nodes.len());
    for node in nodes {
        let info = node.status.as_ref().and_then(|s| s.node_info.as_ref());
        out.push_str(&format!(
            "Name: {}\nKubelet: {}\nOS: {}\nReady: {}\n\n---\n\n",
            node.metadata.name.as_deref().unwrap_or(""),
            info.map(|i| i.kubelet_version.as_str()).unwrap_or(""),
            info.map(|i| i.os_image.as_str()).unwrap_or(""),
            node_ready(node),
        ));
    }
    out
}

fn format_node_details(node: &Node) -> String {
    let info = node.status.as_ref().and_then(|s| s.node_info.as_ref());
    let mut out = format!(
        "Node: {}\nKubelet: {}\nOS: {}\nContainer Runtime: {}\nReady: {}\n",
        node.metadata.name.as_deref().unwrap_or(""),
        info.map(|i| i.kubelet_version.as_str()).unwrap_or(""),
        info.map(|i| i.os_image.as_str()).unwrap_or(""),
        info.map(|i| i.container_runtime_version.as_str())
            .unwrap_or(""),
        node_ready(node),
    );
    if let Some(addresses) = node.status.as_ref().and_then(|s| s.addresses.as_ref()) {
        out.push_str("Addresses:\n");
        for address in addresses {
            out.push_str(&format!("  {}: {}\n", address.type_, address.address));
        }
    }
    out
}

fn node_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false)
}

fn format_storageclasses_list(classes: &[StorageClass]) -> String {
    let mut out = format!("Total StorageClasses: {}\n\n", classes.len());
    for class in classes {
        let default = class
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(DEFAULT_CLASS_ANNOTATION))
            .map(|v| v == "true")
            .unwrap_or(false);
        out.push_str(&format!(
            "Name: {}\nProvisioner: {}\nAllowVolumeExpansion: {}\nDefault: {}\n\n---\n\n",
            class.metadata.name.as_deref().unwrap_or(""),
            class.provisioner,
            class.allow_volume_expansion.unwrap_or(false),
            default,
        ));
    }
    out
}

fn format_ingresses_list(ingresses: &[Ingress]) -> String {
    let mut out = format!("Total Ingresses: {}\n\n", ingresses.len());
    for ingress in ingresses {
        out.push_str(&format!(
            "Name: {}\nNamespace: {}\nClass: {}\n",
            ingress.metadata.name.as_deref().unwrap_or(""),
            ingress.metadata.namespace.as_deref().unwrap_or(""),
            ingress
                .spec
                .as_ref()
                .and_then(|s| s.ingress_class_name.as_deref())
                .unwrap_or(""),
        ));
        for rule in ingress
            .spec
            .as_ref()
            .and_then(|s| s.rules.as_ref())
            .into_iter()
            .flatten()
        {
            out.push_str(&format!("  Host: {}\n", rule.host.as_deref().unwrap_or("")));
        }
        out.push_str("\n---\n\n");
    }
    out
}

fn format_ingress_details(ingress: &Ingress) -> String {
    let mut out = format!(
        "Ingress: {}\nNamespace: {}\nClass: {}\n",
        ingress.metadata.name.as_deref().unwrap_or(""),
        ingress.metadata.namespace.as_deref().unwrap_or(""),
        ingress
            .spec
            .as_ref()
            .and_then(|s| s.ingress_class_name.as_deref())
            .unwrap_or(""),
    );
    for rule in ingress
        .spec
        .as_ref()
        .and_then(|s| s.rules.as_ref())
        .into_iter()
        .flatten()
    {
        out.push_str(&format!("Host: {}\n", rule.host.as_deref().unwrap_or("")));
    }
    out
}

/// Get all cluster inventory tools.
pub fn cluster_tools(
    core: CoreClient,
    network: NetworkClient,
    storage: StorageClient,
    rbac: RbacClient,
) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListNamespacesTool {
            client: core.clone(),
        }),
        Arc::new(ListNodesTool {
            client: core.clone(),
        }),
        Arc::new(GetNodeTool { client: core }),
        Arc::new(ListStorageClassesTool { client: storage }),
        Arc::new(ListIngressesTool {
            client: network.clone(),
        }),
        Arc::new(GetIngressTool { client: network }),
        Arc::new(ListRolesTool {
            client: rbac.clone(),
        }),
        Arc::new(ListRoleBindingsTool {
            client: rbac.clone(),
        }),
        Arc::new(ListClusterRolesTool {
            client: rbac.clone(),
        }),
        Arc::new(ListClusterRoleBindingsTool { client: rbac }),
    ]
}
