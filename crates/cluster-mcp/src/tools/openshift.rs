//! OpenShift tools: routes, projects, image streams, build configs and
//! deployment configs.

use super::decode_args;
use crate::clients::OpenShiftClient;
use crate::cluster::object;
use crate::server::Tool;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Debug, Deserialize)]
struct NamespaceParams {
    #[serde(default)]
    namespace: String,
}

#[derive(Debug, Deserialize)]
struct NamespacedName {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
}

fn namespace_schema(noun: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "namespace": {
                "type": "string",
                "description": format!("Namespace to list {noun} from (empty for all namespaces)")
            }
        }
    })
}

fn namespaced_name_schema(noun: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "description": format!("Name of the {noun}")},
            "namespace": {"type": "string", "description": format!("Namespace of the {noun}")}
        },
        "required": ["name", "namespace"]
    })
}

/// Tool to list routes.
pub struct ListRoutesTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for ListRoutesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_routes", "List OpenShift Routes (route.openshift.io/v1)")
            .with_category("openshift")
            .with_schema(namespace_schema("routes"))
    }

    #[instrument(skip(self, args), fields(tool = "list_routes"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_routes(&params.namespace).await {
            Ok(routes) => {
                let mut out = format!("Total Routes: {}\n\n", routes.len());
                for route in &routes {
                    out.push_str(&format!(
                        "Name: {}\nNamespace: {}\nHost: {}\nService: {}\n\n---\n\n",
                        object::name(route).unwrap_or(""),
                        object::namespace(route).unwrap_or(""),
                        object::nested_str(route, &["spec", "host"]).unwrap_or(""),
                        object::nested_str(route, &["spec", "to", "name"]).unwrap_or(""),
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list routes: {}", e);
                ToolResult::error(format!("Failed to list routes: {}", e))
            }
        }
    }
}

/// Tool to get one route.
pub struct GetRouteTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for GetRouteTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_route", "Get a specific OpenShift Route as JSON")
            .with_category("openshift")
            .with_schema(namespaced_name_schema("route"))
    }

    #[instrument(skip(self, args), fields(tool = "get_route"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self.client.get_route(&params.namespace, &params.name).await {
            Ok(route) => ToolResult::json(route),
            Err(e) => {
                error!("Failed to get route: {}", e);
                ToolResult::error(format!("Failed to get route: {}", e))
            }
        }
    }
}

/// Tool to list projects.
pub struct ListProjectsTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for ListProjectsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_projects", "List OpenShift Projects (project.openshift.io/v1)")
            .with_category("openshift")
    }

    #[instrument(skip(self, _args), fields(tool = "list_projects"))]
    async fn execute(&self, _args: Value) -> ToolResult {
        match self.client.list_projects().await {
            Ok(projects) => {
                let mut out = format!("Total Projects: {}\n\n", projects.len());
                for project in &projects {
                    out.push_str(&format!(
                        "Name: {}\nStatus: {}\n\n",
                        object::name(project).unwrap_or(""),
                        object::nested_str(project, &["status", "phase"]).unwrap_or(""),
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list Projects: {}", e);
                ToolResult::error(format!("Failed to list Projects: {}", e))
            }
        }
    }
}

/// Tool to list image streams.
pub struct ListImageStreamsTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for ListImageStreamsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_imagestreams", "List OpenShift ImageStreams (image.openshift.io/v1)")
            .with_category("openshift")
            .with_schema(namespace_schema("image streams"))
    }

    #[instrument(skip(self, args), fields(tool = "list_imagestreams"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_imagestreams(&params.namespace).await {
            Ok(streams) => {
                let mut out = format!("Total ImageStreams: {}\n\n", streams.len());
                for stream in &streams {
                    let tags = object::nested(stream, &["status", "tags"])
                        .and_then(Value::as_array)
                        .map(|t| t.len())
                        .unwrap_or(0);
                    out.push_str(&format!(
                        "Name: {}\nNamespace: {}\nTags: {}\n\n---\n\n",
                        object::name(stream).unwrap_or(""),
                        object::namespace(stream).unwrap_or(""),
                        tags,
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list ImageStreams: {}", e);
                ToolResult::error(format!("Failed to list ImageStreams: {}", e))
            }
        }
    }
}

/// Tool to get one image stream.
pub struct GetImageStreamTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for GetImageStreamTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_imagestream", "Get a specific OpenShift ImageStream as JSON")
            .with_category("openshift")
            .with_schema(namespaced_name_schema("image stream"))
    }

    #[instrument(skip(self, args), fields(tool = "get_imagestream"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self
            .client
            .get_imagestream(&params.namespace, &params.name)
            .await
        {
            Ok(stream) => ToolResult::json(stream),
            Err(e) => {
                error!("Failed to get ImageStream: {}", e);
                ToolResult::error(format!("Failed to get ImageStream: {}", e))
            }
        }
    }
}

/// Tool to list build configs.
pub struct ListBuildConfigsTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for ListBuildConfigsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_buildconfigs", "List OpenShift BuildConfigs (build.openshift.io/v1)")
            .with_category("openshift")
            .with_schema(namespace_schema("build configs"))
    }

    #[instrument(skip(self, args), fields(tool = "list_buildconfigs"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_buildconfigs(&params.namespace).await {
            Ok(configs) => {
                let mut out = format!("Total BuildConfigs: {}\n\n", configs.len());
                for config in &configs {
                    out.push_str(&format!(
                        "Name: {}\nNamespace: {}\nStrategy: {}\n\n---\n\n",
                        object::name(config).unwrap_or(""),
                        object::namespace(config).unwrap_or(""),
                        object::nested_str(config, &["spec", "strategy", "type"]).unwrap_or(""),
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list BuildConfigs: {}", e);
                ToolResult::error(format!("Failed to list BuildConfigs: {}", e))
            }
        }
    }
}

/// Tool to start a build from a build config.
pub struct StartBuildTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for StartBuildTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "buildconfig_start_build",
            "Start a build from a BuildConfig (equivalent to 'oc start-build')",
        )
        .with_category("openshift")
        .with_schema(namespaced_name_schema("build config"))
    }

    #[instrument(skip(self, args), fields(tool = "buildconfig_start_build"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self
            .client
            .start_build(&params.namespace, &params.name)
            .await
        {
            Ok(build) => ToolResult::json(build),
            Err(e) => {
                error!("Failed to start build: {}", e);
                ToolResult::error(format!("Failed to start build: {}", e))
            }
        }
    }
}

/// Tool to list deployment configs.
pub struct ListDeploymentConfigsTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for ListDeploymentConfigsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_deploymentconfigs",
            "List OpenShift DeploymentConfigs (apps.openshift.io/v1)",
        )
        .with_category("openshift")
        .with_schema(namespace_schema("deployment configs"))
    }

    #[instrument(skip(self, args), fields(tool = "list_deploymentconfigs"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_deploymentconfigs(&params.namespace).await {
            Ok(configs) => {
                let mut out = format!("Total DeploymentConfigs: {}\n\n", configs.len());
                for config in &configs {
                    out.push_str(&format!(
                        "Name: {}\nNamespace: {}\nReplicas: {}\nLatestVersion: {}\n\n---\n\n",
                        object::name(config).unwrap_or(""),
                        object::namespace(config).unwrap_or(""),
                        object::nested_i64(config, &["spec", "replicas"]).unwrap_or(0),
                        object::nested_i64(config, &["status", "latestVersion"]).unwrap_or(0),
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list DeploymentConfigs: {}", e);
                ToolResult::error(format!("Failed to list DeploymentConfigs: {}", e))
            }
        }
    }
}

/// Tool to trigger a manual deployment config rollout.
pub struct RolloutLatestTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for RolloutLatestTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "deploymentconfig_rollout_latest",
            "Trigger a manual rollout of a DeploymentConfig (equivalent to 'oc rollout latest')",
        )
        .with_category("openshift")
        .with_schema(namespaced_name_schema("deployment config"))
    }

    #[instrument(skip(self, args), fields(tool = "deploymentconfig_rollout_latest"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self
            .client
            .rollout_latest(&params.namespace, &params.name)
            .await
        {
            Ok((version, _)) => ToolResult::text(format!(
                "DeploymentConfig {}/{} rollout triggered (latestVersion={})",
                params.namespace, params.name, version
            )),
            Err(e) => {
                error!("Failed to trigger rollout: {}", e);
                ToolResult::error(format!("Failed to trigger rollout: {}", e))
            }
        }
    }
}

/// Tool to promote an image stream tag.
pub struct PromoteTagTool {
    client: OpenShiftClient,
}

#[async_trait]
impl Tool for PromoteTagTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "imagestream_promote_tag",
            "Promote an ImageStream tag (e.g. 'app:dev' -> 'app:prod') via ImageStreamTag",
        )
        .with_category("openshift")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "namespace": {"type": "string", "description": "Namespace of the ImageStream"},
                "imageStream": {"type": "string", "description": "Name of the ImageStream"},
                "sourceTag": {"type": "string", "description": "Source tag (e.g. dev)"},
                "targetTag": {"type": "string", "description": "Target tag (e.g. prod)"},
                "targetIsCopy": {
                    "type": "boolean",
                    "description": "Pin the resolved image instead of referencing the source tag",
                    "default": false
                }
            },
            "required": ["namespace", "imageStream", "sourceTag", "targetTag"]
        }))
    }

    #[instrument(skip(self, args), fields(tool = "imagestream_promote_tag"))]
    async fn execute(&self, args: Value) -> ToolResult {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[serde(default)]
            namespace: String,
            #[serde(default, rename = "imageStream")]
            image_stream: String,
            #[serde(default, rename = "sourceTag")]
            source_tag: String,
            #[serde(default, rename = "targetTag")]
            target_tag: String,
            #[serde(default, rename = "targetIsCopy")]
            target_is_copy: bool,
        }
        let params: Params = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.namespace.is_empty()
            || params.image_stream.is_empty()
            || params.source_tag.is_empty()
            || params.target_tag.is_empty()
        {
            return ToolResult::error("namespace, imageStream, sourceTag and targetTag are required");
        }

        match self
            .client
            .promote_tag(
                &params.namespace,
                &params.image_stream,
                &params.source_tag,
                &params.target_tag,
                params.target_is_copy,
            )
            .await
        {
            Ok(destination) => ToolResult::json(destination),
            Err(e) => {
                error!("Failed to promote tag: {}", e);
                ToolResult::error(format!("Failed to promote tag: {}", e))
            }
        }
    }
}

/// Get all OpenShift tools.
pub fn openshift_tools(client: OpenShiftClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListRoutesTool {
            client: client.clone(),
        }),
        Arc::new(GetRouteTool {
            client: client.clone(),
        }),
        Arc::new(ListProjectsTool {
            client: client.clone(),
        }),
        Arc::new(ListImageStreamsTool {
            client: client.clone(),
        }),
        Arc::new(GetImageStreamTool {
            client: client.clone(),
        }),
        Arc::new(ListBuildConfigsTool {
            client: client.clone(),
        }),
        Arc::new(StartBuildTool {
            client: client.clone(),
        }),
        Arc::new(ListDeploymentConfigsTool {
            client: client.clone(),
        }),
        Arc::new(RolloutLatestTool {
            client: client.clone(),
        }),
        Arc::new(PromoteTagTool { client }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::FakeBackend;
    use crate::cluster::ObjectPage;
    use serde_json::json;

    #[tokio::test]
    async fn test_promote_tag_requires_arguments() {
        let fake = Arc::new(FakeBackend::new());
        let tool = PromoteTagTool {
            client: OpenShiftClient::new(fake.clone()),
        };

        let result = tool
            .execute(json!({"namespace": "demo", "imageStream": "app"}))
            .await;
        assert!(result.is_error);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_promote_tag_error_names_failed_step() {
        let fake = Arc::new(FakeBackend::new());
        let tool = PromoteTagTool {
            client: OpenShiftClient::new(fake.clone()),
        };

        let result = tool
            .execute(json!({
                "namespace": "demo",
                "imageStream": "app",
                "sourceTag": "dev",
                "targetTag": "prod"
            }))
            .await;
        assert!(result.is_error);
        assert!(result.text_content().contains("get-source"));
    }

    #[tokio::test]
    async fn test_list_routes_formats_hosts() {
        let fake = Arc::new(FakeBackend::new());
        fake.push_page(ObjectPage {
            items: vec![json!({
                "apiVersion": "route.openshift.io/v1",
                "kind": "Route",
                "metadata": {"name": "web", "namespace": "demo"},
                "spec": {"host": "web.apps.example.com", "to": {"kind": "Service", "name": "web"}}
            })],
            continue_token: None,
        });

        let tool = ListRoutesTool {
            client: OpenShiftClient::new(fake.clone()),
        };
        let result = tool.execute(json!({"namespace": "demo"})).await;
        let text = result.text_content();
        assert!(text.contains("Host: web.apps.example.com"));
        assert!(text.contains("Service: web"));
    }

    #[tokio::test]
    async fn test_rollout_latest_reports_version() {
        let fake = Arc::new(FakeBackend::new());
        fake.insert_object(
            &crate::cluster::ResourceTarget::grouped(
                "apps.openshift.io",
                "v1",
                "deploymentconfigs",
                "DeploymentConfig",
            )
            .namespaced("demo"),
            json!({
                "apiVersion": "apps.openshift.io/v1",
                "kind": "DeploymentConfig",
                "metadata": {"name": "api", "namespace": "demo"},
                "status": {"latestVersion": 7}
            }),
        );

        let tool = RolloutLatestTool {
            client: OpenShiftClient::new(fake.clone()),
        };
        let result = tool
            .execute(json!({"name": "api", "namespace": "demo"}))
            .await;
        assert!(!result.is_error);
        assert!(result.text_content().contains("latestVersion=8"));
    }

    #[test]
    fn test_openshift_tools_count() {
        let fake = Arc::new(FakeBackend::new());
        assert_eq!(openshift_tools(OpenShiftClient::new(fake)).len(), 10);
    }
}
