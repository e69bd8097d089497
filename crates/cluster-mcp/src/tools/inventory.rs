//! Namespace inventory tools: services, configmaps, secrets and
//! persistent volume claims.
//!
//! Secret values are never included in results, only key names.

use super::decode_args;
use crate::clients::CoreClient;
use crate::server::Tool;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret, Service};
use serde::Deserialize;
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

/// Tool to list services.
pub struct ListServicesTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for ListServicesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_services", "List services in a namespace or across all namespaces")
            .with_category("inventory")
            .with_schema(namespace_schema("services"))
    }

    #[instrument(skip(self, args), fields(tool = "list_services"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_services(&params.namespace).await {
            Ok(services) => ToolResult::text(format_services_list(&services)),
            Err(e) => {
                error!("Failed to list services: {}", e);
                ToolResult::error(format!("Failed to list services: {}", e))
            }
        }
    }
}

/// Tool to get one service.
pub struct GetServiceTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for GetServiceTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_service", "Get detailed information about a specific service")
            .with_category("inventory")
            .with_schema(namespaced_name_schema("service"))
    }

    #[instrument(skip(self, args), fields(tool = "get_service"))]
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
            .get_service(&params.namespace, &params.name)
            .await
        {
            Ok(service) => ToolResult::text(format_service_details(&service)),
            Err(e) => {
                error!("Failed to get service: {}", e);
                ToolResult::error(format!("Failed to get service: {}", e))
            }
        }
    }
}

/// Tool to list configmaps.
pub struct ListConfigMapsTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for ListConfigMapsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_configmaps", "List configmaps in a namespace or across all namespaces")
            .with_category("inventory")
            .with_schema(namespace_schema("configmaps"))
    }

    #[instrument(skip(self, args), fields(tool = "list_configmaps"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_configmaps(&params.namespace).await {
            Ok(configmaps) => ToolResult::text(format_configmaps_list(&configmaps)),
            Err(e) => {
                error!("Failed to list configmaps: {}", e);
                ToolResult::error(format!("Failed to list configmaps: {}", e))
            }
        }
    }
}

/// Tool to get one configmap.
pub struct GetConfigMapTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for GetConfigMapTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_configmap", "Get the keys and values of a specific configmap")
            .with_category("inventory")
            .with_schema(namespaced_name_schema("configmap"))
    }

    #[instrument(skip(self, args), fields(tool = "get_configmap"))]
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
            .get_configmap(&params.namespace, &params.name)
            .await
        {
            Ok(configmap) => ToolResult::text(format_configmap_details(&configmap)),
            Err(e) => {
                error!("Failed to get configmap: {}", e);
                ToolResult::error(format!("Failed to get configmap: {}", e))
            }
        }
    }
}

/// Tool to list secrets.
pub struct ListSecretsTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for ListSecretsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_secrets", "List secrets in a namespace or across all namespaces (names and types only)")
            .with_category("inventory")
            .with_schema(namespace_schema("secrets"))
    }

    #[instrument(skip(self, args), fields(tool = "list_secrets"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_secrets(&params.namespace).await {
            Ok(secrets) => ToolResult::text(format_secrets_list(&secrets)),
            Err(e) => {
                error!("Failed to list secrets: {}", e);
                ToolResult::error(format!("Failed to list secrets: {}", e))
            }
        }
    }
}

/// Tool to get one secret's metadata and key names.
pub struct GetSecretTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for GetSecretTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_secret", "Get a secret's type and key names (values are not returned)")
            .with_category("inventory")
            .with_schema(namespaced_name_schema("secret"))
    }

    #[instrument(skip(self, args), fields(tool = "get_secret"))]
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
            .get_secret(&params.namespace, &params.name)
            .await
        {
            Ok(secret) => ToolResult::text(format_secret_details(&secret)),
            Err(e) => {
                error!("Failed to get secret: {}", e);
                ToolResult::error(format!("Failed to get secret: {}", e))
            }
        }
    }
}

/// Tool to list persistent volume claims.
pub struct ListPvcsTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for ListPvcsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_pvcs", "List persistent volume claims in a namespace or across all namespaces")
            .with_category("inventory")
            .with_schema(namespace_schema("persistent volume claims"))
    }

    #[instrument(skip(self, args), fields(tool = "list_pvcs"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespaceParams = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list_pvcs(&params.namespace).await {
            Ok(pvcs) => ToolResult::text(format_pvcs_list(&pvcs)),
            Err(e) => {
                error!("Failed to list PVCs: {}", e);
                ToolResult::error(format!("Failed to list PVCs: {}", e))
            }
        }
    }
}

/// Tool to get one persistent volume claim.
pub struct GetPvcTool {
    client: CoreClient,
}

#[async_trait]
impl Tool for GetPvcTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_pvc", "Get detailed information about a specific persistent volume claim")
            .with_category("inventory")
            .with_schema(namespaced_name_schema("persistent volume claim"))
    }

    #[instrument(skip(self, args), fields(tool = "get_pvc"))]
    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self.client.get_pvc(&params.namespace, &params.name).await {
            Ok(pvc) => ToolResult::text(format_pvc_details(&pvc)),
            Err(e) => {
                error!("Failed to get PVC: {}", e);
                ToolResult::error(format!("Failed to get PVC: {}", e))
            }
        }
    }
}

fn format_services_list(services: &[Service]) -> String {
    let mut out = format!("Total Services: {}\n\n", services.len());
    for service in services {
        let spec = service.spec.as_ref();
        out.push_str(&format!(
            "Name: {}\nNamespace: {}\nType: {}\nClusterIP: {}\n\n---\n\n",
            service.metadata.name.as_deref().unwrap_or(""),
            service.metadata.namespace.as_deref().unwrap_or(""),
            spec.and_then(|s| s.type_.as_deref()).unwrap_or(""),
            spec.and_then(|s| s.cluster_ip.as_deref()).unwrap_or(""),
        ));
    }
    out
}

fn format_service_details(service: &Service) -> String {
    let spec = service.spec.as_ref();
    let mut out = format!(
        "Service: {}\nNamespace: {}\nType: {}\nClusterIP: {}\n",
        service.metadata.name.as_deref().unwrap_or(""),
        service.metadata.namespace.as_deref().unwrap_or(""),
        spec.and_then(|s| s.type_.as_deref()).unwrap_or(""),
        spec.and_then(|s| s.cluster_ip.as_deref()).unwrap_or(""),
    );
    if let Some(ports) = spec.and_then(|s| s.ports.as_ref()) {
        out.push_str("Ports:\n");
        for port in ports {
            out.push_str(&format!(
                "  - {} {}/{}\n",
                port.name.as_deref().unwrap_or(""),
                port.port,
                port.protocol.as_deref().unwrap_or("TCP"),
            ));
        }
    }
    out
}

fn format_configmaps_list(configmaps: &[ConfigMap]) -> String {
    let mut out = format!("Total ConfigMaps: {}\n\n", configmaps.len());
    for configmap in configmaps {
        out.push_str(&format!(
            "Name: {}\nNamespace: {}\nKeys: {}\n\n---\n\n",
            configmap.metadata.name.as_deref().unwrap_or(""),
            configmap.metadata.namespace.as_deref().unwrap_or(""),
            configmap.data.as_ref().map(|d| d.len()).unwrap_or(0),
        ));
    }
    out
}

fn format_configmap_details(configmap: &ConfigMap) -> String {
    let mut out = format!(
        "ConfigMap: {}\nNamespace: {}\n",
        configmap.metadata.name.as_deref().unwrap_or(""),
        configmap.metadata.namespace.as_deref().unwrap_or(""),
    );
    if let Some(data) = configmap.data.as_ref() {
        out.push_str("Data:\n");
        for (key, value) in data {
            out.push_str(&format!("  {}: {}\n", key, value));
        }
    }
    out
}

fn format_secrets_list(secrets: &[Secret]) -> String {
    let mut out = format!("Total Secrets: {}\n\n", secrets.len());
    for secret in secrets {
        out.push_str(&format!(
            "Name: {}\nNamespace: {}\nType: {}\nKeys: {}\n\n---\n\n",
            secret.metadata.name.as_deref().unwrap_or(""),
            secret.metadata.namespace.as_deref().unwrap_or(""),
            secret.type_.as_deref().unwrap_or(""),
            secret.data.as_ref().map(|d| d.len()).unwrap_or(0),
        ));
    }
    out
}

fn format_secret_details(secret: &Secret) -> String {
    let mut out = format!(
        "Secret: {}\nNamespace: {}\nType: {}\n",
        secret.metadata.name.as_deref().unwrap_or(""),
        secret.metadata.namespace.as_deref().unwrap_or(""),
        secret.type_.as_deref().unwrap_or(""),
    );
    if let Some(data) = secret.data.as_ref() {
        out.push_str("Keys:\n");
        for key in data.keys() {
            out.push_str(&format!("  - {}\n", key));
        }
    }
    out
}

fn format_pvcs_list(pvcs: &[PersistentVolumeClaim]) -> String {
    let mut out = format!("Total PVCs: {}\n\n", pvcs.len());
    for pvc in pvcs {
        out.push_str(&format!(
            "Name: {}\nNamespace: {}\nStatus: {}\nStorageClass: {}\n\n---\n\n",
            pvc.metadata.name.as_deref().unwrap_or(""),
            pvc.metadata.namespace.as_deref().unwrap_or(""),
            pvc.status
                .as_ref()
                .and_then(|s| s.phase.as_deref())
                .unwrap_or(""),
            pvc.spec
                .as_ref()
                .and_then(|s| s.storage_class_name.as_deref())
                .unwrap_or(""),
        ));
    }
    out
}

fn format_pvc_details(pvc: &PersistentVolumeClaim) -> String {
    let requested = pvc
        .spec
        .as_ref()
        .and_then(|s| s.resources.as_ref())
        .and_then(|r| r.requests.as_ref())
        .and_then(|requests| requests.get("storage"))
        .map(|quantity| quantity.0.clone())
        .unwrap_or_default();
    format!(
        "PVC: {}\nNamespace: {}\nStatus: {}\nStorageClass: {}\nRequested: {}\n",
        pvc.metadata.name.as_deref().unwrap_or(""),
        pvc.metadata.namespace.as_deref().unwrap_or(""),
        pvc.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .unwrap_or(""),
        pvc.spec
            .as_ref()
            .and_then(|s| s.storage_class_name.as_deref())
            .unwrap_or(""),
        requested,
    )
}

/// Get all namespace inventory tools.
pub fn inventory_tools(client: CoreClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListServicesTool {
            client: client.clone(),
        }),
        Arc::new(GetServiceTool {
            client: client.clone(),
        }),
        Arc::new(ListConfigMapsTool {
            client: client.clone(),
        }),
        Arc::new(GetConfigMapTool {
            client: client.clone(),
        }),
        Arc::new(ListSecretsTool {
            client: client.clone(),
        }),
        Arc::new(GetSecretTool {
            client: client.clone(),
        }),
        Arc::new(ListPvcsTool {
            client: client.clone(),
        }),
        Arc::new(GetPvcTool { client }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::FakeBackend;
    use crate::cluster::ObjectPage;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_service_requires_arguments() {
        let fake = Arc::new(FakeBackend::new());
        let tool = GetServiceTool {
            client: CoreClient::new(fake.clone()),
        };

        let result = tool.execute(json!({"name": "web"})).await;
        assert!(result.is_error);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_secret_values_are_not_leaked() {
        let fake = Arc::new(FakeBackend::new());
        fake.insert_object(
            &crate::cluster::ResourceTarget::core("v1", "secrets", "Secret").namespaced("demo"),
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": {"name": "db-creds", "namespace": "demo"},
                "type": "Opaque",
                "data": {"password": "aHVudGVyMg=="}
            }),
        );

        let tool = GetSecretTool {
            client: CoreClient::new(fake.clone()),
        };
        let result = tool
            .execute(json!({"name": "db-creds", "namespace": "demo"}))
            .await;

        assert!(!result.is_error);
        let text = result.text_content();
        assert!(text.contains("password"));
        assert!(!text.contains("aHVudGVyMg=="));
    }

    #[tokio::test]
    async fn test_list_services_formats_summary() {
        let fake = Arc::new(FakeBackend::new());
        fake.push_page(ObjectPage {
            items: vec![json!({
                "apiVersion": "v1",
                "kind": "Service",
                "metadata": {"name": "web", "namespace": "demo"},
                "spec": {"type": "ClusterIP", "clusterIP": "10.96.0.10"}
            })],
            continue_token: None,
        });

        let tool = ListServicesTool {
            client: CoreClient::new(fake.clone()),
        };
        let result = tool.execute(json!({"namespace": "demo"})).await;
        let text = result.text_content();
        assert!(text.contains("Total Services: 1"));
        assert!(text.contains("ClusterIP: 10.96.0.10"));
    }

    #[test]
    fn test_inventory_tools_count() {
        let fake = Arc::new(FakeBackend::new());
        assert_eq!(inventory_tools(CoreClient::new(fake)).len(), 8);
    }
}
