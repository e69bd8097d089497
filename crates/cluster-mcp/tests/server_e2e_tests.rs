//! End-to-end tests for the MCP dispatcher over a mocked cluster.
//!
//! Requests enter as JSON-RPC frames and leave as tool results; the
//! cluster behind them is a wiremock API server.

use cluster_mcp::cluster::kube_backend::KubeBackend;
use cluster_mcp::server::McpServer;
use cluster_mcp::tools::all_tools;
use cluster_mcp::types::{McpRequest, ToolResult};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_against(mock: &MockServer) -> McpServer {
    let config = kube::Config::new(mock.uri().parse().unwrap());
    let client = kube::Client::try_from(config).expect("client from mock config");
    let backend = Arc::new(KubeBackend::with_client(client));

    let mut server = McpServer::cluster();
    server.register_tools(all_tools(backend));
    server
}

fn tool_result(response: cluster_mcp::types::McpResponse) -> ToolResult {
    serde_json::from_value(response.result.expect("tool call has a result"))
        .expect("result decodes as a tool result")
}

#[tokio::test]
async fn test_tools_list_exposes_the_full_surface() {
    let mock = MockServer::start().await;
    let server = server_against(&mock).await;

    let response = server
        .handle_request(McpRequest::new(1, "tools/list"))
        .await;
    let tools = response.result.unwrap()["tools"]
        .as_array()
        .unwrap()
        .len();
    assert_eq!(tools, 48);
}

#[tokio::test]
async fn test_get_pod_round_trip() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo/pods/web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "web", "namespace": "demo"},
            "spec": {"nodeName": "node-a", "containers": [{"name": "web", "image": "web:1"}]},
            "status": {"phase": "Running", "podIP": "10.0.0.7", "hostIP": "192.168.1.5"}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_against(&mock).await;
    let response = server
        .handle_request(McpRequest::new(1, "tools/call").with_params(json!({
            "name": "get_pod",
            "arguments": {"name": "web", "namespace": "demo"}
        })))
        .await;

    let result = tool_result(response);
    assert!(!result.is_error);
    let text = result.text_content();
    assert!(text.contains("Pod: web"));
    assert!(text.contains("Status: Running"));
}

#[tokio::test]
async fn test_missing_required_argument_issues_no_cluster_call() {
    let mock = MockServer::start().await;

    // Any request reaching the cluster would trip this.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let server = server_against(&mock).await;
    let response = server
        .handle_request(McpRequest::new(1, "tools/call").with_params(json!({
            "name": "get_pod",
            "arguments": {"name": "web"}
        })))
        .await;

    let result = tool_result(response);
    assert!(result.is_error);
    assert!(result.text_content().contains("required"));
}

#[tokio::test]
async fn test_unknown_tool_is_a_protocol_error() {
    let mock = MockServer::start().await;
    let server = server_against(&mock).await;

    let response = server
        .handle_request(McpRequest::new(1, "tools/call").with_params(json!({
            "name": "does_not_exist",
            "arguments": {}
        })))
        .await;

    let error = response.error.expect("unknown tool errors");
    assert!(error.message.contains("Tool not found"));
}

#[tokio::test]
async fn test_remote_failure_stays_inside_the_tool_result() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo/pods/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": "pods \"ghost\" not found",
            "reason": "NotFound",
            "code": 404
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_against(&mock).await;
    let response = server
        .handle_request(McpRequest::new(1, "tools/call").with_params(json!({
            "name": "get_pod",
            "arguments": {"name": "ghost", "namespace": "demo"}
        })))
        .await;

    // The JSON-RPC layer reports success; the failure is a tool error.
    assert!(response.error.is_none());
    let result = tool_result(response);
    assert!(result.is_error);
    assert!(result.text_content().contains("Failed to get pod"));
}
