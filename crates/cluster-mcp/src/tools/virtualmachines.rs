//! KubeVirt VirtualMachine tools.

use super::decode_args;
use crate::clients::kubevirt::RestartStep;
use crate::clients::KubeVirtClient;
use crate::cluster::object;
use crate::server::Tool;
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Debug, Deserialize)]
struct NamespacedName {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
}

fn vm_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "description": "Name of the VirtualMachine"},
            "namespace": {"type": "string", "description": "Namespace of the VirtualMachine"}
        },
        "required": ["name", "namespace"]
    })
}

/// Tool to list virtual machines.
pub struct ListVirtualMachinesTool {
    client: KubeVirtClient,
}

#[async_trait]
impl Tool for ListVirtualMachinesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_virtualmachines",
            "List KubeVirt VirtualMachines (kubevirt.io/v1)",
        )
        .with_category("kubevirt")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "namespace": {
                    "type": "string",
                    "description": "Namespace to list VMs from (empty for all namespaces)"
                }
            }
        }))
    }

    #[instrument(skip(self, args), fields(tool = "list_virtualmachines"))]
    async fn execute(&self, args: Value) -> ToolResult {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[serde(default)]
            namespace: String,
        }
        let params: Params = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };

        match self.client.list(&params.namespace).await {
            Ok(machines) => {
                let mut out = format!("Total VirtualMachines: {}\n\n", machines.len());
                for machine in &machines {
                    out.push_str(&format!(
                        "Name: {}\nNamespace: {}\nRunStrategy: {}\nStatus: {}\n\n---\n\n",
                        object::name(machine).unwrap_or(""),
                        object::namespace(machine).unwrap_or(""),
                        object::nested_str(machine, &["spec", "runStrategy"]).unwrap_or(""),
                        object::nested_str(machine, &["status", "printableStatus"]).unwrap_or(""),
                    ));
                }
                ToolResult::text(out)
            }
            Err(e) => {
                error!("Failed to list VirtualMachines: {}", e);
                ToolResult::error(format!("Failed to list VirtualMachines: {}", e))
            }
        }
    }
}

/// Tool to get one virtual machine.
pub struct GetVirtualMachineTool {
    client: KubeVirtClient,
}

#[async_trait]
impl Tool for GetVirtualMachineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_virtualmachine", "Get a specific KubeVirt VirtualMachine as JSON")
            .with_category("kubevirt")
            .with_schema(vm_schema())
    }

    #[instrument(skip(self, args), fields(tool = "get_virtualmachine"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self.client.get(&params.namespace, &params.name).await {
            Ok(machine) => ToolResult::json(machine),
            Err(e) => {
                error!("Failed to get VirtualMachine: {}", e);
                ToolResult::error(format!("Failed to get VirtualMachine: {}", e))
            }
        }
    }
}

/// Tool to start a virtual machine.
pub struct StartVirtualMachineTool {
    client: KubeVirtClient,
}

#[async_trait]
impl Tool for StartVirtualMachineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "start_virtualmachine",
            "Start a VirtualMachine by setting spec.runStrategy=Always",
        )
        .with_category("kubevirt")
        .with_schema(vm_schema())
    }

    #[instrument(skip(self, args), fields(tool = "start_virtualmachine"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self.client.start(&params.namespace, &params.name).await {
            Ok(()) => ToolResult::text(format!(
                "VirtualMachine {}/{} started (runStrategy=Always)",
                params.namespace, params.name
            )),
            Err(e) => {
                error!("Failed to start VirtualMachine: {}", e);
                ToolResult::error(format!("Failed to start VirtualMachine: {}", e))
            }
        }
    }
}

/// Tool to stop a virtual machine.
pub struct StopVirtualMachineTool {
    client: KubeVirtClient,
}

#[async_trait]
impl Tool for StopVirtualMachineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "stop_virtualmachine",
            "Stop a VirtualMachine by setting spec.runStrategy=Halted",
        )
        .with_category("kubevirt")
        .with_schema(vm_schema())
    }

    #[instrument(skip(self, args), fields(tool = "stop_virtualmachine"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self.client.stop(&params.namespace, &params.name).await {
            Ok(()) => ToolResult::text(format!(
                "VirtualMachine {}/{} stopped (runStrategy=Halted)",
                params.namespace, params.name
            )),
            Err(e) => {
                error!("Failed to stop VirtualMachine: {}", e);
                ToolResult::error(format!("Failed to stop VirtualMachine: {}", e))
            }
        }
    }
}

/// Tool to restart a virtual machine.
pub struct RestartVirtualMachineTool {
    client: KubeVirtClient,
}

#[async_trait]
impl Tool for RestartVirtualMachineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "restart_virtualmachine",
            "Restart a VirtualMachine by toggling spec.runStrategy (Halted, then Always)",
        )
        .with_category("kubevirt")
        .with_schema(vm_schema())
    }

    #[instrument(skip(self, args), fields(tool = "restart_virtualmachine"))]
    async fn execute(&self, args: Value) -> ToolResult {
        let params: NamespacedName = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }

        match self.client.restart(&params.namespace, &params.name).await {
            Ok(()) => ToolResult::text(format!(
                "VirtualMachine {}/{} restarted via runStrategy toggle",
                params.namespace, params.name
            )),
            Err(e) => {
                error!("Failed to restart VirtualMachine: {}", e);
                let note = match e.step {
                    RestartStep::Stop => "no patch has taken effect",
                    RestartStep::Start => "the VM was already halted by the first patch",
                };
                ToolResult::error(format!("Failed to restart VirtualMachine ({note}): {e}"))
            }
        }
    }
}

/// Tool to edit a virtual machine's CPU/memory requests.
pub struct EditVirtualMachineResourcesTool {
    client: KubeVirtClient,
}

#[async_trait]
impl Tool for EditVirtualMachineResourcesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "edit_virtualmachine_resources",
            "Edit CPU and memory requests of a VirtualMachine",
        )
        .with_category("kubevirt")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Name of the VirtualMachine"},
                "namespace": {"type": "string", "description": "Namespace of the VirtualMachine"},
                "cpu": {"type": "string", "description": "CPU request, e.g. '2'"},
                "memory": {"type": "string", "description": "Memory request, e.g. '4Gi'"}
            },
            "required": ["name", "namespace"]
        }))
    }

    #[instrument(skip(self, args), fields(tool = "edit_virtualmachine_resources"))]
    async fn execute(&self, args: Value) -> ToolResult {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[serde(default)]
            name: String,
            #[serde(default)]
            namespace: String,
            #[serde(default)]
            cpu: String,
            #[serde(default)]
            memory: String,
        }
        let params: Params = match decode_args(args) {
            Ok(p) => p,
            Err(msg) => return ToolResult::error(msg),
        };
        if params.name.is_empty() || params.namespace.is_empty() {
            return ToolResult::error("name and namespace are required");
        }
        if params.cpu.is_empty() && params.memory.is_empty() {
            return ToolResult::error("at least one of cpu or memory is required");
        }

        let cpu = (!params.cpu.is_empty()).then_some(params.cpu.as_str());
        let memory = (!params.memory.is_empty()).then_some(params.memory.as_str());

        match self
            .client
            .edit_resources(&params.namespace, &params.name, cpu, memory)
            .await
        {
            Ok(()) => ToolResult::text(format!(
                "VirtualMachine {}/{} resources updated (cpu={}, memory={})",
                params.namespace, params.name, params.cpu, params.memory
            )),
            Err(e) => {
                error!("Failed to update VirtualMachine resources: {}", e);
                ToolResult::error(format!("Failed to update VirtualMachine resources: {}", e))
            }
        }
    }
}

/// Get all KubeVirt tools.
pub fn virtualmachine_tools(client: KubeVirtClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListVirtualMachinesTool {
            client: client.clone(),
        }),
        Arc::new(GetVirtualMachineTool {
            client: client.clone(),
        }),
        Arc::new(StartVirtualMachineTool {
            client: client.clone(),
        }),
        Arc::new(StopVirtualMachineTool {
            client: client.clone(),
        }),
        Arc::new(RestartVirtualMachineTool {
            client: client.clone(),
        }),
        Arc::new(EditVirtualMachineResourcesTool { client }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::{CallRecord, FakeBackend};
    use crate::cluster::ResourceTarget;
    use serde_json::json;

    fn vm_target() -> ResourceTarget {
        ResourceTarget::grouped("kubevirt.io", "v1", "virtualmachines", "VirtualMachine")
            .namespaced("demo")
    }

    fn seed_vm(fake: &FakeBackend) {
        fake.insert_object(
            &vm_target(),
            json!({
                "apiVersion": "kubevirt.io/v1",
                "kind": "VirtualMachine",
                "metadata": {"name": "vm-a", "namespace": "demo"},
                "spec": {"runStrategy": "Always"}
            }),
        );
    }

    #[tokio::test]
    async fn test_start_requires_namespace() {
        let fake = Arc::new(FakeBackend::new());
        let tool = StartVirtualMachineTool {
            client: KubeVirtClient::new(fake.clone()),
        };

        let result = tool.execute(json!({"name": "vm-a"})).await;
        assert!(result.is_error);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_start_patches_run_strategy() {
        let fake = Arc::new(FakeBackend::new());
        seed_vm(&fake);

        let tool = StartVirtualMachineTool {
            client: KubeVirtClient::new(fake.clone()),
        };
        let result = tool
            .execute(json!({"name": "vm-a", "namespace": "demo"}))
            .await;

        assert!(!result.is_error);
        let patches: Vec<_> = fake
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                CallRecord::PatchMerge { patch, .. } => Some(patch),
                _ => None,
            })
            .collect();
        assert_eq!(patches, vec![json!({"spec": {"runStrategy": "Always"}})]);
    }

    #[tokio::test]
    async fn test_restart_failure_reports_start_step_and_prior_effect() {
        let fake = Arc::new(FakeBackend::new());
        seed_vm(&fake);
        fake.fail_patches_after(1);

        let tool = RestartVirtualMachineTool {
            client: KubeVirtClient::new(fake.clone()),
        };
        let result = tool
            .execute(json!({"name": "vm-a", "namespace": "demo"}))
            .await;

        assert!(result.is_error);
        let text = result.text_content();
        assert!(text.contains("start step"));
        assert!(text.contains("already halted"));

        // The stop patch landed and stayed.
        let stored = fake.object(&vm_target(), "vm-a").unwrap();
        assert_eq!(
            object::nested_str(&stored, &["spec", "runStrategy"]),
            Some("Halted")
        );
    }

    #[tokio::test]
    async fn test_edit_resources_requires_cpu_or_memory() {
        let fake = Arc::new(FakeBackend::new());
        let tool = EditVirtualMachineResourcesTool {
            client: KubeVirtClient::new(fake.clone()),
        };

        let result = tool
            .execute(json!({"name": "vm-a", "namespace": "demo"}))
            .await;
        assert!(result.is_error);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_formats_run_strategy() {
        let fake = Arc::new(FakeBackend::new());
        fake.push_page(crate::cluster::ObjectPage {
            items: vec![json!({
                "apiVersion": "kubevirt.io/v1",
                "kind": "VirtualMachine",
                "metadata": {"name": "vm-a", "namespace": "demo"},
                "spec": {"runStrategy": "Always"},
                "status": {"printableStatus": "Running"}
            })],
            continue_token: None,
        });

        let tool = ListVirtualMachinesTool {
            client: KubeVirtClient::new(fake.clone()),
        };
        let result = tool.execute(json!({"namespace": "demo"})).await;
        let text = result.text_content();
        assert!(text.contains("RunStrategy: Always"));
        assert!(text.contains("Status: Running"));
    }

    #[test]
    fn test_virtualmachine_tools_count() {
        let fake = Arc::new(FakeBackend::new());
        assert_eq!(virtualmachine_tools(KubeVirtClient::new(fake)).len(), 6);
    }
}
