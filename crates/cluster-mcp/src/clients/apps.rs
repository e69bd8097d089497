//! apps/v1 client: deployments.

use super::{get_typed, list_typed};
use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterBackend, ClusterError, ResourceTarget};
use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use std::sync::Arc;

const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Client for the `apps/v1` API group.
#[derive(Clone)]
pub struct AppsClient {
    resources: ResourceClient,
    backend: Arc<dyn ClusterBackend>,
}

fn deployments(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped("apps", "v1", "deployments", "Deployment").namespaced(namespace)
}

impl AppsClient {
    /// Create a new apps client over the shared backend.
    pub fn new(backend: Arc<dyn ClusterBackend>) -> Self {
        Self {
            resources: ResourceClient::new(Arc::clone(&backend)),
            backend,
        }
    }

    /// List deployments.
    pub async fn list_deployments(
        &self,
        namespace: &str,
    ) -> Result<Vec<Deployment>, ClusterError> {
        list_typed(
            &self.resources,
            &deployments(namespace),
            &ListOptions::default(),
        )
        .await
    }

    /// Get one deployment.
    pub async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Deployment, ClusterError> {
        get_typed(&self.resources, &deployments(namespace), name).await
    }

    /// Scale a deployment to the given replica count.
    pub async fn scale_deployment(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<(), ClusterError> {
        let mut deployment = self.get_deployment(namespace, name).await?;
        let spec = deployment.spec.as_mut().ok_or_else(|| {
            ClusterError::InvalidObject(format!("deployment {name} has no spec"))
        })?;
        spec.replicas = Some(replicas);

        self.backend
            .update(&deployments(namespace), name, &replace_payload(&deployment)?)
            .await
            .map(|_| ())
    }

    /// Trigger a rolling restart by stamping the pod template with the
    /// current time, the same way `kubectl rollout restart` does.
    pub async fn restart_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        let mut deployment = self.get_deployment(namespace, name).await?;
        let spec = deployment.spec.as_mut().ok_or_else(|| {
            ClusterError::InvalidObject(format!("deployment {name} has no spec"))
        })?;

        let metadata = spec.template.metadata.get_or_insert_with(Default::default);
        metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(RESTARTED_AT_ANNOTATION.to_string(), Utc::now().to_rfc3339());

        self.backend
            .update(&deployments(namespace), name, &replace_payload(&deployment)?)
            .await
            .map(|_| ())
    }
}

/// Serialize a typed deployment for a replace call. The generated
/// structs do not carry the type envelope, which the API server
/// requires on PUT.
fn replace_payload(deployment: &Deployment) -> Result<serde_json::Value, ClusterError> {
    let mut payload = serde_json::to_value(deployment)
        .map_err(|e| ClusterError::InvalidObject(e.to_string()))?;
    payload["apiVersion"] = serde_json::Value::String("apps/v1".to_string());
    payload["kind"] = serde_json::Value::String("Deployment".to_string());
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::{CallRecord, FakeBackend};
    use crate::cluster::object;
    use serde_json::json;

    fn seed_deployment(fake: &FakeBackend) {
        fake.insert_object(
            &deployments("demo"),
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {"name": "api", "namespace": "demo", "resourceVersion": "3"},
                "spec": {
                    "replicas": 2,
                    "selector": {"matchLabels": {"app": "api"}},
                    "template": {
                        "metadata": {"labels": {"app": "api"}},
                        "spec": {"containers": [{"name": "api", "image": "api:1"}]}
                    }
                }
            }),
        );
    }

    #[tokio::test]
    async fn test_scale_updates_replicas() {
        let fake = Arc::new(FakeBackend::new());
        seed_deployment(&fake);

        let client = AppsClient::new(fake.clone());
        client.scale_deployment("demo", "api", 5).await.unwrap();

        let update = fake
            .calls()
            .into_iter()
            .find_map(|call| match call {
                CallRecord::Update { object, .. } => Some(object),
                _ => None,
            })
            .expect("an update call was issued");
        assert_eq!(object::nested_i64(&update, &["spec", "replicas"]), Some(5));
    }

    #[tokio::test]
    async fn test_restart_stamps_pod_template() {
        let fake = Arc::new(FakeBackend::new());
        seed_deployment(&fake);

        let client = AppsClient::new(fake.clone());
        client.restart_deployment("demo", "api").await.unwrap();

        let update = fake
            .calls()
            .into_iter()
            .find_map(|call| match call {
                CallRecord::Update { object, .. } => Some(object),
                _ => None,
            })
            .expect("an update call was issued");
        let stamp = object::nested_str(
            &update,
            &[
                "spec",
                "template",
                "metadata",
                "annotations",
                RESTARTED_AT_ANNOTATION,
            ],
        );
        assert!(stamp.is_some());
    }

    #[tokio::test]
    async fn test_scale_missing_deployment() {
        let fake = Arc::new(FakeBackend::new());
        let client = AppsClient::new(fake.clone());
        let err = client.scale_deployment("demo", "ghost", 1).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
