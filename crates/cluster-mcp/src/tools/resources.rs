//! Generic resource tools
//!
//! Address any Kubernetes, OpenShift or KubeVirt resource by its
//! group/version/resource triple, with no compile-time knowledge of the
//! shape. Results are returned as JSON documents.

use super::decode_args;
use crate::cluster::object;
use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterBackend, ResourceTarget};
use crate::server::Tool;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Debug, Deserialize)]
struct GvrParams {
    #[serde(default)]
    group: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    resource: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    name: String,
}

impl GvrParams {
    fn target(&self) -> ResourceTarget {
        ResourceTarget::grouped(&self.group, &self.version, &self.resource, "")
            .namespaced(&self.namespace)
    }
}

fn gvr_name_properties() -> serde_json::Value {
    serde_json::json!({
        "group": {"type": "string", "description": "API group (empty for core)"},
        "version": {"type": "string", "description": "API version, e.g. v1"},
        "resource": {"type": "string", "description": "Plural resource name, e.g. pods"},
        "namespace": {"type": "string", "description": "Namespace (empty for cluster scope)"},
        "name": {"type": "string", "description": "Name of the resource"}
    })
}

/// Tool to list the API groups and versions the cluster exposes.
pub struct ApisListTool {
    backend: Arc<dyn ClusterBackend>,
}

#[async_trait]
impl Tool for ApisListTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "apis_list",
            "List all API groups and versions available on the cluster (includes OpenShift and KubeVirt)",
        )
        .with_category("resources")
    }

    #[instrument(skip(self, _args), fields(tool = "apis_list"))]
    async fn execute(&self, _args: Value) -> ToolResult {
        match self.backend.api_groups().await {
            Ok(groups) => ToolResult::json(groups),
            Err(e) => {
                error!("Failed to list APIs: {}", e);
                ToolResult::error(format!("Failed to list APIs: {}", e))
            }
        }
    }
}

/// Tool to list any resource collection by GVR.
pub struct ResourcesListTool {
    client: ResourceClient,
}

#[async_trait]
impl Tool for ResourcesListTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "resources_list",
            "List any resource collection by group/version/resource; pagination is handled internally",
        )
        .with_category("resources")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "group": {"type": "string", "description": "API group (empty for core)"},
                "version": {"type": "string", "description": "API version, e.g. v1"},
                "resource": {"type": "string", "description": "Plural resource name, e.g. pods"},
                "namespace": {"type": "string", "description": "Namespace (empty for cluster scope)"},
                "labelSelector": {"type": "string", "description": "Label selector"},
                "fieldSelector": {"type": "string", "description": "Field selector"},
                "limit": {"type": "integer", "description": "Page size used while fetching"}
            },
            "required": ["version", "resource"]
        }))
    }

    #[instrument(skip(self, args), fields(tool = "resources_list"))]
    async fn execute(&self, args: Value) -> ToolResult {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[serde(default)]
            group: String,
            #[serde(default)]
            version: String,
            #[serde(default)]
            resource: String,
            #[serde(default)]
            namespace: String,
            #[serde(default, rename = "labelSelector")]
            label_selector: String,
            #[serde(default, rename = "fieldSelector")]
            field_selector: String,
            #[serde(default)]
            limit: Option<u32>,
        }
        let params: Params = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.version.is_empty() || params.resource.is_empty() {
            return ToolResult::error("version and resource are required");
        }

        let target = ResourceTarget::grouped(&params.group, &params.version, &params.resource, "")
            .namespaced(&params.namespace);
        let options = ListOptions {
            label_selector: (!params.label_selector.is_empty())
                .then(|| params.label_selector.clone()),
            field_selector: (!params.field_selector.is_empty())
                .then(|| params.field_selector.clone()),
            limit: params.limit,
        };

        match self.client.list(&target, &options).await {
            Ok(items) => ToolResult::json(serde_json::json!({
                "items": items,
                "count": items.len(),
            })),
            Err(e) => {
                error!("Failed to list resources: {}", e);
                ToolResult::error(format!("Failed to list resources: {}", e))
            }
        }
    }
}

/// Tool to get any resource by GVR and name.
pub struct ResourcesGetTool {
    client: ResourceClient,
}

#[async_trait]
impl Tool for ResourcesGetTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "resources_get",
            "Get a specific resource by group/version/resource, namespace and name",
        )
        .with_category("resources")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": gvr_name_properties(),
            "required": ["version", "resource", "name"]
        }))
    }

    #[instrument(skip(self, args), fields(tool = "resources_get"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: GvrParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.version.is_empty() || params.resource.is_empty() || params.name.is_empty() {
            return ToolResult::error("version, resource and name are required");
        }

        match self.client.get(&params.target(), &params.name).await {
            Ok(item) => ToolResult::json(item),
            Err(e) => {
                error!("Failed to get resource: {}", e);
                ToolResult::error(format!("Failed to get resource: {}", e))
            }
        }
    }
}

/// Tool to create or update any resource from a JSON object.
pub struct ResourcesApplyTool {
    client: ResourceClient,
}

#[async_trait]
impl Tool for ResourcesApplyTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "resources_apply",
            "Create or update any resource from a complete JSON object (apiVersion, kind, metadata.name required)",
        )
        .with_category("resources")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "resource": {
                    "type": "string",
                    "description": "Plural resource name of the object's kind, e.g. deployments"
                },
                "object": {
                    "type": "object",
                    "description": "Complete object with apiVersion, kind and metadata"
                }
            },
            "required": ["resource", "object"]
        }))
    }

    #[instrument(skip(self, args), fields(tool = "resources_apply"))]
    async fn execute(&self, args: Value) -> ToolResult {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[serde(default)]
            resource: String,
            #[serde(default)]
            object: Value,
        }
        let params: Params = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.resource.is_empty() {
            return ToolResult::error("resource is required");
        }
        if !params.object.is_object() {
            return ToolResult::error("object is required");
        }

        let api_version = match object::api_version(&params.object) {
            Some(api_version) => api_version.to_string(),
            None => return ToolResult::error("object must have apiVersion, kind and metadata.name"),
        };
        let (group, version) = object::split_api_version(&api_version);
        let namespace = object::namespace(&params.object).unwrap_or("").to_string();
        let target = ResourceTarget::grouped(&group, &version, &params.resource, "")
            .namespaced(&namespace);

        match self.client.apply(&target, params.object).await {
            Ok(applied) => ToolResult::json(applied),
            Err(e) => {
                error!("Failed to apply resource: {}", e);
                ToolResult::error(format!("Failed to apply resource: {}", e))
            }
        }
    }
}

/// Tool to delete any resource by GVR and name.
pub struct ResourcesDeleteTool {
    client: ResourceClient,
}

#[async_trait]
impl Tool for ResourcesDeleteTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "resources_delete",
            "Delete any resource by group/version/resource, namespace and name",
        )
        .with_category("resources")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": gvr_name_properties(),
            "required": ["version", "resource", "name"]
        }))
    }

    #[instrument(skip(self, args), fields(tool = "resources_delete"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: GvrParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.version.is_empty() || params.resource.is_empty() || params.name.is_empty() {
            return ToolResult::error("version, resource and name are required");
        }

        match self.client.delete(&params.target(), &params.name).await {
            Ok(()) => ToolResult::text(format!("deleted {}/{}", params.resource, params.name)),
            Err(e) => {
                error!("Failed to delete resource: {}", e);
                ToolResult::error(format!("Failed to delete resource: {}", e))
            }
        }
    }
}

/// Get all generic resource tools.
pub fn resource_tools(backend: Arc<dyn ClusterBackend>) -> Vec<Arc<dyn Tool>> {
    let client = ResourceClient::new(Arc::clone(&backend));
    vec![
        Arc::new(ApisListTool { backend }),
        Arc::new(ResourcesListTool {
            client: client.clone(),
        }),
        Arc::new(ResourcesGetTool {
            client: client.clone(),
        }),
        Arc::new(ResourcesApplyTool {
            client: client.clone(),
        }),
        Arc::new(ResourcesDeleteTool { client }),
    ]
}
