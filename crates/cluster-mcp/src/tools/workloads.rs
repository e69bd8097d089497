//! Deployment tools
//!
//! Listing, inspection, scaling and rolling restarts for deployments.

use super::decode_args;
use crate::clients::AppsClient;
use crate::server::Tool;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, instrument};

/// Tool to list deployments.
pub struct ListDeploymentsTool {
    client: AppsClient,
}

#[async_trait]
impl Tool for ListDeploymentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_deployments", "List deployments in a namespace or across all namespaces")
            .with_category("workloads")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "namespace": {
                        "type": "string",
                        "description": "Namespace to list deployments from (empty for all namespaces)"
                    }
                }
            }))
    }

    #[instrument(skip(self, args), fields(tool = "list_deployments"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_deployments(&params.namespace).await {
            Ok(deployments) => ToolResult::text(format_deployments_list(&deployments)),
            Err(e) => {
                error!("Failed to list deployments: {}", e);
                ToolResult::error(format!("Failed to list deployments: {}", e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct NamespaceParams {
    #[serde(default)]
    namespace: String,
}

/// Tool to get details for one deployment.
pub struct GetDeploymentTool {
    client: AppsClient,
}

#[async_trait]
impl Tool for GetDeploymentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_deployment", "Get detailed information about a specific deployment")
            .with_category("workloads")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the deployment"},
                    "namespace": {"type": "string", "description": "Namespace of the deployment"}
                },
                "required": ["name", "namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "get_deployment"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self
            .client
            .get_deployment(&params.namespace, &params.name)
            .await
        {
            Ok(deployment) => ToolResult::text(format_deployment_details(&deployment)),
            Err(e) => {
                error!("Failed to get deployment: {}", e);
                ToolResult::error(format!("Failed to get deployment: {}", e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct NamespacedName {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
}

/// Tool to scale a deployment.
pub struct ScaleDeploymentTool {
    client: AppsClient,
}

#[async_trait]
impl Tool for ScaleDeploymentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("scale_deployment", "Scale a deployment to a given number of replicas")
            .with_category("workloads")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the deployment"},
                    "namespace": {"type": "string", "description": "Namespace of the deployment"},
                    "replicas": {
                        "type": "integer",
                        "description": "Desired replica count",
                        "default": 1
                    }
                },
                "required": ["name", "namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "scale_deployment"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: ScaleParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self
            .client
            .scale_deployment(&params.namespace, &params.name, params.replicas)
            .await
        {
            Ok(()) => ToolResult::text(format!(
                "Deployment {} scaled to {} replicas",
                params.name, params.replicas
            )),
            Err(e) => {
                error!("Failed to scale deployment: {}", e);
                ToolResult::error(format!("Failed to scale deployment: {}", e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScaleParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default = "default_replicas")]
    replicas: i32,
}

fn default_replicas() -> i32 {
    1
}

/// Tool to restart a deployment.
pub struct RestartDeploymentTool {
    client: AppsClient,
}

#[async_trait]
impl Tool for RestartDeploymentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("restart_deployment", "Trigger a rolling restart of a deployment")
            .with_category("workloads")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the deployment"},
                    "namespace": {"type": "string", "description": "Namespace of the deployment"}
                },
                "required": ["name", "namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "restart_deployment"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self
            .client
            .restart_deployment(&params.namespace, &params.name)
            .await
        {
            Ok(()) => ToolResult::text(format!(
                "Deployment {} restarted successfully",
                params.name
            )),
            Err(e) => {
                error!("Failed to restart deployment: {}", e);
                ToolResult::error(format!("Failed to restart deployment: {}", e))
            }
        }
    }
}

fn format_deployments_list(deployments: &[Deployment]) -> String {
    let mut out = format!("Total Deployments: {}\n\n", deployments.len());
    for deployment in deployments {
        let status = deployment.status.as_ref();
        out.push_str(&format!(
            "Name: {}\nNamespace: {}\nReplicas: {}\nReady: {}\nAvailable: {}\n\n---\n\n",
            deployment.metadata.name.as_deref().unwrap_or(""),
            deployment.metadata.namespace.as_deref().unwrap_or(""),
            deployment
                .spec
                .as_ref()
                .and_then(|s| s.replicas)
                .unwrap_or(0),
            status.and_then(|s| s.ready_replicas).unwrap_or(0),
            status.and_then(|s| s.available_replicas).unwrap_or(0),
        ));
    }
    out
}

fn format_deployment_details(deployment: &Deployment) -> String {
    let status = deployment.status.as_ref();
    format!(
        "Deployment: {}\nNamespace: {}\nReplicas: {}\nReady: {}\nUpdated: {}\nAvailable: {}\n",
        deployment.metadata.name.as_deref().unwrap_or(""),
        deployment.metadata.namespace.as_deref().unwrap_or(""),
        deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(0),
        status.and_then(|s| s.ready_replicas).unwrap_or(0),
        status.and_then(|s| s.updated_replicas).unwrap_or(0),
        status.and_then(|s| s.available_replicas).unwrap_or(0),
    )
}

/// Get all deployment tools.
pub fn deployment_tools(client: AppsClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListDeploymentsTool {
            client: client.clone(),
        }),
        Arc::new(GetDeploymentTool {
            client: client.clone(),
        }),
        Arc::new(ScaleDeploymentTool {
            client: client.clone(),
        }),
        Arc::new(RestartDeploymentTool { client }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::FakeBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_scale_requires_name_and_namespace() {
        let fake = Arc::new(FakeBackend::new());
        let tool = ScaleDeploymentTool {
            client: AppsClient::new(fake.clone()),
        };

        let result = tool.execute(json!({"replicas": 3})).await;
        assert!(result.is_error);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scale_rejects_non_integer_replicas() {
        let fake = Arc::new(FakeBackend::new());
        let tool = ScaleDeploymentTool {
            client: AppsClient::new(fake.clone()),
        };

        let result = tool
            .execute(json!({"name": "api", "namespace": "demo", "replicas": "three"}))
            .await;
        assert!(result.is_error);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_deployment_tools_count() {
        let fake = Arc::new(FakeBackend::new());
        assert_eq!(deployment_tools(AppsClient::new(fake)).len(), 4);
    }
}
