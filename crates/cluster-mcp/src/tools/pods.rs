//! Pod tools
//!
//! Listing, inspection, logs, deletion and command execution for pods.

use super::decode_args;
use crate::clients::CoreClient;
use crate::cluster::{ExecQuery, LogQuery};
use crate::server::Tool;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Tool to list pods in a namespace or across the cluster.
pub struct ListPodsTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for ListPodsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_pods", "List pods in a namespace or across all namespaces")
            .with_category("pods")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "namespace": {
                        "type": "string",
                        "description": "Namespace to list pods from (empty for all namespaces)"
                    },
                    "labelSelector": {
                        "type": "string",
                        "description": "Label selector to filter pods"
                    }
                }
            }))
    }

    #[instrument(skip(self, args), fields(tool = "list_pods"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: ListPodsParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        debug!(namespace = %params.namespace, "listing pods");
        let selector = if params.label_selector.is_empty() {
            None
        } else {
            Some(params.label_selector.as_str())
        };

        match self.client.list_pods(&params.namespace, selector).await {
            Ok(pods) => ToolResult::text(format_pods_list(&pods)),
            Err(e) => {
                error!("Failed to list pods: {}", e);
                ToolResult::error(format!("Failed to list pods: {}", e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListPodsParams {
    #[serde(default)]
    namespace: String,
    #[serde(default, rename = "labelSelector")]
    label_selector: String,
}

/// Tool to get details for one pod.
pub struct GetPodTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for GetPodTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_pod", "Get detailed information about a specific pod")
            .with_category("pods")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the pod"},
                    "namespace": {"type": "string", "description": "Namespace of the pod"}
                },
                "required": ["name", "namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "get_pod"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self.client.get_pod(&params.namespace, &params.name).await {
            Ok(pod) => ToolResult::text(format_pod_details(&pod)),
            Err(e) => {
                error!("Failed to get pod: {}", e);
                ToolResult::error(format!("Failed to get pod: {}", e))
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

/// Tool to fetch pod logs.
pub struct GetPodLogsTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for GetPodLogsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_pod_logs", "Get logs from a pod container")
            .with_category("pods")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the pod"},
                    "namespace": {"type": "string", "description": "Namespace of the pod"},
                    "container": {
                        "type": "string",
                        "description": "Container name (first container if omitted)"
                    },
                    "tailLines": {
                        "type": "integer",
                        "description": "Number of log lines from the end",
                        "default": 100
                    },
                    "previous": {
                        "type": "boolean",
                        "description": "Get logs from the previous container instance",
                        "default": false
                    }
                },
                "required": ["name", "namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "get_pod_logs"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: PodLogsParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        let query = LogQuery {
            container: if params.container.is_empty() {
                None
            } else {
                Some(params.container.clone())
            },
            tail_lines: Some(params.tail_lines),
            previous: params.previous,
        };

        match self
            .client
            .pod_logs(&params.namespace, &params.name, &query)
            .await
        {
            Ok(logs) => ToolResult::text(logs),
            Err(e) => {
                error!("Failed to get pod logs: {}", e);
                ToolResult::error(format!("Failed to get pod logs: {}", e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PodLogsParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    container: String,
    #[serde(default = "default_tail_lines", rename = "tailLines")]
    tail_lines: i64,
    #[serde(default)]
    previous: bool,
}

fn default_tail_lines() -> i64 {
    100
}

/// Tool to delete a pod.
pub struct DeletePodTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for DeletePodTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_pod", "Delete a specific pod")
            .with_category("pods")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the pod"},
                    "namespace": {"type": "string", "description": "Namespace of the pod"}
                },
                "required": ["name", "namespace"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "delete_pod"))]
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
            .delete_pod(&params.namespace, &params.name)
            .await
        {
            Ok(()) => ToolResult::text(format!(
                "Pod {} in namespace {} deleted successfully",
                params.name, params.namespace
            )),
            Err(e) => {
                error!("Failed to delete pod: {}", e);
                ToolResult::error(format!("Failed to delete pod: {}", e))
            }
        }
    }
}

/// Tool to execute a command in a pod container.
pub struct ExecPodTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for ExecPodTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("exec_pod", "Execute a command in a pod container")
            .with_category("pods")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the pod"},
                    "namespace": {"type": "string", "description": "Namespace of the pod"},
                    "container": {"type": "string", "description": "Container name (optional)"},
                    "command": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Command and arguments to run"
                    }
                },
                "required": ["name", "namespace", "command"]
            }))
    }

    #[instrument(skip(self, args), fields(tool = "exec_pod"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: ExecPodParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }
        if params.command.is_empty() {
            return ToolResult::error("command is required");
        }

        let query = ExecQuery {
            container: if params.container.is_empty() {
                None
            } else {
                Some(params.container.clone())
            },
            command: params.command.clone(),
        };

        match self
            .client
            .exec_pod(&params.namespace, &params.name, &query)
            .await
        {
            Ok(output) => ToolResult::text(format!(
                "Stdout:\n{}\n\nStderr:\n{}",
                output.stdout, output.stderr
            )),
            Err(e) => {
                error!("Exec failed: {}", e);
                ToolResult::error(format!("Exec failed: {}", e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecPodParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    container: String,
    #[serde(default)]
    command: Vec<String>,
}

fn format_pods_list(pods: &[Pod]) -> String {
    let mut out = format!("Total Pods: {}\n\n", pods.len());
    for pod in pods {
        let status = pod.status.as_ref();
        out.push_str(&format!(
            "Name: {}\nNamespace: {}\nStatus: {}\nNode: {}\nIP: {}\n\n---\n\n",
            pod.metadata.name.as_deref().unwrap_or(""),
            pod.metadata.namespace.as_deref().unwrap_or(""),
            status.and_then(|s| s.phase.as_deref()).unwrap_or(""),
            pod.spec
                .as_ref()
                .and_then(|s| s.node_name.as_deref())
                .unwrap_or(""),
            status.and_then(|s| s.pod_ip.as_deref()).unwrap_or(""),
        ));
    }
    out
}

fn format_pod_details(pod: &Pod) -> String {
    let status = pod.status.as_ref();
    let mut out = format!(
        "Pod: {}\nNamespace: {}\nStatus: {}\nNode: {}\nPod IP: {}\nHost IP: {}\n",
        pod.metadata.name.as_deref().unwrap_or(""),
        pod.metadata.namespace.as_deref().unwrap_or(""),
        status.and_then(|s| s.phase.as_deref()).unwrap_or(""),
        pod.spec
            .as_ref()
            .and_then(|s| s.node_name.as_deref())
            .unwrap_or(""),
        status.and_then(|s| s.pod_ip.as_deref()).unwrap_or(""),
        status.and_then(|s| s.host_ip.as_deref()).unwrap_or(""),
    );
    if let Some(spec) = pod.spec.as_ref() {
        out.push_str("Containers:\n");
        for container in &spec.containers {
            out.push_str(&format!(
                "  - {} ({})\n",
                container.name,
                container.image.as_deref().unwrap_or("")
            ));
        }
    }
    out
}

/// Get all pod tools.
pub fn pod_tools(client: CoreClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListPodsTool {
            client: client.clone(),
        }),
        Arc::new(GetPodTool {
            client: client.clone(),
        }),
        Arc::new(GetPodLogsTool {
            client: client.clone(),
        }),
        Arc::new(DeletePodTool {
            client: client.clone(),
        }),
        Arc::new(ExecPodTool { client }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::{CallRecord, FakeBackend};
    use crate::cluster::{ExecOutput, ObjectPage};
    use serde_json::json;

    fn client_with(fake: &Arc<FakeBackend>) -> CoreClient {
        CoreClient::new(fake.clone())
    }

    #[tokio::test]
    async fn test_get_pod_missing_namespace_issues_no_calls() {
        let fake = Arc::new(FakeBackend::new());
        let tool = GetPodTool {
            client: client_with(&fake),
        };

        let result = tool.execute(json!({"name": "web"})).await;
        assert!(result.is_error);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_pod_not_found_is_tool_error() {
        let fake = Arc::new(FakeBackend::new());
        let tool = GetPodTool {
            client: client_with(&fake),
        };

        let result = tool
            .execute(json!({"name": "ghost", "namespace": "demo"}))
            .await;
        assert!(result.is_error);
        assert!(result.text_content().contains("not found"));
    }

    #[tokio::test]
    async fn test_list_pods_formats_summary() {
        let fake = Arc::new(FakeBackend::new());
        fake.push_page(ObjectPage {
            items: vec![json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {"name": "web-1", "namespace": "demo"},
                "spec": {"containers": [{"name": "web", "image": "web:1"}], "nodeName": "node-a"},
                "status": {"phase": "Running", "podIP": "10.0.0.9"}
            })],
            continue_token: None,
        });

        let tool = ListPodsTool {
            client: client_with(&fake),
        };
        let result = tool.execute(json!({"namespace": "demo"})).await;
        assert!(!result.is_error);
        let text = result.text_content();
        assert!(text.contains("Total Pods: 1"));
        assert!(text.contains("Name: web-1"));
        assert!(text.contains("Node: node-a"));
    }

    #[tokio::test]
    async fn test_exec_pod_requires_command() {
        let fake = Arc::new(FakeBackend::new());
        let tool = ExecPodTool {
            client: client_with(&fake),
        };

        let result = tool
            .execute(json!({"name": "web", "namespace": "demo"}))
            .await;
        assert!(result.is_error);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exec_pod_reports_both_streams() {
        let fake = Arc::new(FakeBackend::new());
        fake.set_exec_output(ExecOutput {
            stdout: "hello".to_string(),
            stderr: "warning".to_string(),
        });

        let tool = ExecPodTool {
            client: client_with(&fake),
        };
        let result = tool
            .execute(json!({
                "name": "web",
                "namespace": "demo",
                "command": ["sh", "-c", "echo hello"]
            }))
            .await;

        assert!(!result.is_error);
        let text = result.text_content();
        assert!(text.contains("hello"));
        assert!(text.contains("warning"));

        match &fake.calls()[0] {
            CallRecord::PodExec { command, .. } => {
                assert_eq!(command, &["sh", "-c", "echo hello"]);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_missing_pod_reports_not_found() {
        let fake = Arc::new(FakeBackend::new());
        let tool = DeletePodTool {
            client: client_with(&fake),
        };

        let result = tool
            .execute(json!({"name": "ghost", "namespace": "demo"}))
            .await;
        assert!(result.is_error);
        assert!(result.text_content().contains("not found"));
    }

    #[tokio::test]
    async fn test_get_pod_logs_defaults() {
        let fake = Arc::new(FakeBackend::new());
        fake.set_logs("line1\nline2");

        let tool = GetPodLogsTool {
            client: client_with(&fake),
        };
        let result = tool
            .execute(json!({"name": "web", "namespace": "demo"}))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.text_content(), "line1\nline2");
    }

    #[test]
    fn test_pod_tools_count() {
        let fake = Arc::new(FakeBackend::new());
        assert_eq!(pod_tools(client_with(&fake)).len(), 5);
    }
}
