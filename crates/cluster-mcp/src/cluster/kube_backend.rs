//! `kube`-backed implementation of the cluster backend.
//!
//! Connection resolution prefers in-cluster credentials and falls back
//! to a kubeconfig file: explicit path, `KUBECONFIG`, then the
//! conventional home-directory location, the default `kube` search
//! chain. Resolution failures are fatal at startup and never retried.

use super::{
    ClusterBackend, ClusterError, ExecOutput, ExecQuery, ListQuery, LogQuery, ObjectPage,
    ResourceTarget,
};
use crate::config::ClusterSettings;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{
    Api, ApiResource, AttachParams, AttachedProcess, DeleteParams, DynamicObject, ListParams,
    LogParams, Patch, PatchParams, PostParams,
};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument};

/// Cluster backend speaking to a real API server through `kube`.
#[derive(Clone)]
pub struct KubeBackend {
    client: Client,
}

impl KubeBackend {
    /// Resolve credentials and build the shared connection handle.
    pub async fn connect(settings: &ClusterSettings) -> Result<Self, ClusterError> {
        let config = if settings.in_cluster {
            Config::incluster().map_err(|e| ClusterError::Credentials(e.to_string()))?
        } else if let Some(path) = &settings.kubeconfig {
            let kubeconfig = Kubeconfig::read_from(path)
                .map_err(|e| ClusterError::Credentials(e.to_string()))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| ClusterError::Credentials(e.to_string()))?
        } else {
            Config::infer()
                .await
                .map_err(|e| ClusterError::Credentials(e.to_string()))?
        };

        let client =
            Client::try_from(config).map_err(|e| ClusterError::Credentials(e.to_string()))?;
        debug!("cluster connection resolved");
        Ok(Self { client })
    }

    /// Wrap an already-built client. Used by integration tests that
    /// point the client at a mock API server.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn dynamic_api(&self, target: &ResourceTarget) -> Api<DynamicObject> {
        let resource = ApiResource {
            group: target.group.clone(),
            version: target.version.clone(),
            api_version: target.api_version(),
            kind: target.kind.clone(),
            plural: target.plural.clone(),
        };
        match &target.namespace {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Map a `kube` error into the layer's taxonomy, preserving the API
/// server's message text.
fn map_kube_error(err: kube::Error, resource: &str, name: &str) -> ClusterError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ClusterError::NotFound {
            resource: resource.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(response) => ClusterError::Api {
            code: response.code,
            message: response.message,
        },
        other => ClusterError::Request(other.to_string()),
    }
}

fn to_dynamic(object: &Value) -> Result<DynamicObject, ClusterError> {
    serde_json::from_value(object.clone()).map_err(|e| ClusterError::InvalidObject(e.to_string()))
}

fn to_value(object: DynamicObject) -> Result<Value, ClusterError> {
    serde_json::to_value(object).map_err(|e| ClusterError::InvalidObject(e.to_string()))
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> Result<String, std::io::Error> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buffer).await?;
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[async_trait]
impl ClusterBackend for KubeBackend {
    #[instrument(skip(self, query), fields(resource = %target.plural))]
    async fn list_page(
        &self,
        target: &ResourceTarget,
        query: &ListQuery,
    ) -> Result<ObjectPage, ClusterError> {
        let api = self.dynamic_api(target);
        let params = ListParams {
            label_selector: query.label_selector.clone(),
            field_selector: query.field_selector.clone(),
            limit: query.limit,
            continue_token: query.continue_token.clone(),
            ..Default::default()
        };

        let list = api
            .list(&params)
            .await
            .map_err(|e| map_kube_error(e, &target.plural, ""))?;

        let continue_token = list
            .metadata
            .continue_
            .clone()
            .filter(|token| !token.is_empty());
        let items = list
            .items
            .into_iter()
            .map(to_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ObjectPage {
            items,
            continue_token,
        })
    }

    #[instrument(skip(self), fields(resource = %target.plural))]
    async fn get(&self, target: &ResourceTarget, name: &str) -> Result<Value, ClusterError> {
        let api = self.dynamic_api(target);
        let object = api
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, &target.plural, name))?;
        to_value(object)
    }

    #[instrument(skip(self, object), fields(resource = %target.plural))]
    async fn create(&self, target: &ResourceTarget, object: &Value) -> Result<Value, ClusterError> {
        let api = self.dynamic_api(target);
        let payload = to_dynamic(object)?;
        let created = api
            .create(&PostParams::default(), &payload)
            .await
            .map_err(|e| map_kube_error(e, &target.plural, ""))?;
        to_value(created)
    }

    #[instrument(skip(self, object), fields(resource = %target.plural))]
    async fn update(
        &self,
        target: &ResourceTarget,
        name: &str,
        object: &Value,
    ) -> Result<Value, ClusterError> {
        let api = self.dynamic_api(target);
        let payload = to_dynamic(object)?;
        let updated = api
            .replace(name, &PostParams::default(), &payload)
            .await
            .map_err(|e| map_kube_error(e, &target.plural, name))?;
        to_value(updated)
    }

    #[instrument(skip(self, patch), fields(resource = %target.plural))]
    async fn patch_merge(
        &self,
        target: &ResourceTarget,
        name: &str,
        patch: &Value,
    ) -> Result<Value, ClusterError> {
        let api = self.dynamic_api(target);
        let patched = api
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| map_kube_error(e, &target.plural, name))?;
        to_value(patched)
    }

    #[instrument(skip(self), fields(resource = %target.plural))]
    async fn delete(&self, target: &ResourceTarget, name: &str) -> Result<(), ClusterError> {
        let api = self.dynamic_api(target);
        api.delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| map_kube_error(e, &target.plural, name))
    }

    #[instrument(skip(self, query))]
    async fn pod_logs(
        &self,
        namespace: &str,
        name: &str,
        query: &LogQuery,
    ) -> Result<String, ClusterError> {
        let params = LogParams {
            container: query.container.clone(),
            tail_lines: query.tail_lines,
            previous: query.previous,
            ..Default::default()
        };
        self.pods(namespace)
            .logs(name, &params)
            .await
            .map_err(|e| map_kube_error(e, "pods", name))
    }

    #[instrument(skip(self, query))]
    async fn pod_exec(
        &self,
        namespace: &str,
        name: &str,
        query: &ExecQuery,
    ) -> Result<ExecOutput, ClusterError> {
        let mut params = AttachParams::default().stdout(true).stderr(true);
        if let Some(container) = &query.container {
            params = params.container(container);
        }

        let mut attached: AttachedProcess = self
            .pods(namespace)
            .exec(name, query.command.clone(), &params)
            .await
            .map_err(|e| map_kube_error(e, "pods", name))?;

        let stdout_reader = attached.stdout();
        let stderr_reader = attached.stderr();
        let (stdout, stderr) = tokio::try_join!(drain(stdout_reader), drain(stderr_reader))
            .map_err(|e| ClusterError::Request(format!("exec stream failed: {e}")))?;

        attached
            .join()
            .await
            .map_err(|e| ClusterError::Request(format!("exec failed: {e}; stderr: {stderr}")))?;

        Ok(ExecOutput { stdout, stderr })
    }

    #[instrument(skip(self))]
    async fn api_groups(&self) -> Result<Value, ClusterError> {
        let core = self
            .client
            .list_core_api_versions()
            .await
            .map_err(|e| map_kube_error(e, "apis", ""))?;
        let groups = self
            .client
            .list_api_groups()
            .await
            .map_err(|e| map_kube_error(e, "apis", ""))?;

        serde_json::to_value(serde_json::json!({
            "coreVersions": core.versions,
            "groups": groups.groups,
        }))
        .map_err(|e| ClusterError::InvalidObject(e.to_string()))
    }
}
