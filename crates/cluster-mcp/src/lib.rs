//! # cluster-mcp
//!
//! MCP (Model Context Protocol) server exposing Kubernetes, OpenShift
//! and KubeVirt cluster operations as callable tools for AI assistants.
//!
//! ## Overview
//!
//! The crate is a protocol adapter: every tool decodes a request's
//! arguments, calls a cluster client method, formats the result and
//! returns it. It handles:
//!
//! - **Connection resolution**: in-cluster credentials first, local
//!   kubeconfig fallback, fatal on failure
//! - **Typed clients**: per-API-group clients for core workloads,
//!   networking, storage, RBAC, OpenShift and KubeVirt kinds
//! - **Generic resources**: list/get/apply/delete for any
//!   group/version/resource triple on a dynamic object model, with
//!   pagination handled internally
//! - **JSON-RPC**: the MCP protocol over stdio or streamable HTTP
//!
//! ## Supported methods
//!
//! - `initialize`: initialize the MCP session
//! - `ping`: liveness probe
//! - `tools/list`: list available tools
//! - `tools/call`: execute a tool
//!
//! ## Tool families
//!
//! - Pods: `list_pods`, `get_pod`, `get_pod_logs`, `delete_pod`,
//!   `exec_pod`
//! - Workloads: `list_deployments`, `get_deployment`,
//!   `scale_deployment`, `restart_deployment`
//! - Inventory: services, configmaps, secrets, PVCs, namespaces,
//!   nodes, storage classes, ingresses, RBAC
//! - Generic resources: `apis_list`, `resources_list`, `resources_get`,
//!   `resources_apply`, `resources_delete`
//! - OpenShift: routes, projects, image streams (including
//!   `imagestream_promote_tag`), build configs, deployment configs
//! - KubeVirt: list/get/start/stop/restart virtual machines and edit
//!   their resource requests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cluster_mcp::cluster::kube_backend::KubeBackend;
//! use cluster_mcp::config::ServerConfig;
//! use cluster_mcp::server::McpServer;
//! use cluster_mcp::tools::all_tools;
//! use std::sync::Arc;
//!
//! async fn setup() -> anyhow::Result<McpServer> {
//!     let config = ServerConfig::from_env();
//!     let backend = Arc::new(KubeBackend::connect(&config.cluster).await?);
//!
//!     let mut server = McpServer::cluster();
//!     server.register_tools(all_tools(backend));
//!     Ok(server)
//! }
//! ```
//!
//! ## Error model
//!
//! Startup failures (credential resolution, client construction) are
//! fatal. Everything else is contained within a single tool call's
//! result: argument errors issue no cluster call, remote errors are
//! wrapped with the attempted operation and surfaced verbatim, and
//! nothing is retried anywhere.

pub mod clients;
pub mod cluster;
pub mod config;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types
pub use config::{ServerConfig, Transport};
pub use server::{McpServer, McpServerError, McpServerResult, Tool};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolCall, ToolCapabilities, ToolDefinition, ToolResult,
};

// Re-export the cluster access layer
pub use cluster::{ClusterBackend, ClusterError, ResourceTarget};

// Re-export tool collections
pub use tools::all_tools;
