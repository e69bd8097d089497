//! OpenShift API group clients: routes, projects, image streams,
//! build configs and deployment configs.
//!
//! None of these kinds have generated types, so everything here stays
//! on the dynamic object representation.

use crate::cluster::object;
use crate::cluster::resources::{ListOptions, ResourceClient};
use crate::cluster::{ClusterBackend, ClusterError, ResourceTarget};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Step of the tag promotion sequence that failed.
///
/// Promotion is get-source → resolve-image → write-target; a failure in
/// a later step can leave earlier effects in place, so callers get told
/// which step broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteStep {
    /// Reading the source ImageStreamTag.
    GetSource,
    /// Resolving the source's image reference (copy mode only).
    ResolveImage,
    /// Creating or updating the destination ImageStreamTag.
    WriteTarget,
}

impl fmt::Display for PromoteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            PromoteStep::GetSource => "get-source",
            PromoteStep::ResolveImage => "resolve-image",
            PromoteStep::WriteTarget => "write-target",
        };
        f.write_str(step)
    }
}

/// Tag promotion failure, carrying the failing step.
#[derive(Debug, Error)]
#[error("tag promotion failed at step {step}: {source}")]
pub struct PromoteTagError {
    /// The step that failed.
    pub step: PromoteStep,
    /// The underlying cluster error.
    #[source]
    pub source: ClusterError,
}

/// Client for the OpenShift API groups.
#[derive(Clone)]
pub struct OpenShiftClient {
    resources: ResourceClient,
    backend: Arc<dyn ClusterBackend>,
}

fn routes(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped("route.openshift.io", "v1", "routes", "Route").namespaced(namespace)
}

fn projects() -> ResourceTarget {
    ResourceTarget::grouped("project.openshift.io", "v1", "projects", "Project")
}

fn imagestreams(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped("image.openshift.io", "v1", "imagestreams", "ImageStream")
        .namespaced(namespace)
}

fn imagestreamtags(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped(
        "image.openshift.io",
        "v1",
        "imagestreamtags",
        "ImageStreamTag",
    )
    .namespaced(namespace)
}

fn buildconfigs(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped("build.openshift.io", "v1", "buildconfigs", "BuildConfig")
        .namespaced(namespace)
}

fn builds(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped("build.openshift.io", "v1", "builds", "Build").namespaced(namespace)
}

fn deploymentconfigs(namespace: &str) -> ResourceTarget {
    ResourceTarget::grouped(
        "apps.openshift.io",
        "v1",
        "deploymentconfigs",
        "DeploymentConfig",
    )
    .namespaced(namespace)
}

impl OpenShiftClient {
    /// Create a new OpenShift client over the shared backend.
    pub fn new(backend: Arc<dyn ClusterBackend>) -> Self {
        Self {
            resources: ResourceClient::new(Arc::clone(&backend)),
            backend,
        }
    }

    /// List routes.
    pub async fn list_routes(&self, namespace: &str) -> Result<Vec<Value>, ClusterError> {
        self.resources
            .list(&routes(namespace), &ListOptions::default())
            .await
    }

    /// Get one route.
    pub async fn get_route(&self, namespace: &str, name: &str) -> Result<Value, ClusterError> {
        self.resources.get(&routes(namespace), name).await
    }

    /// List projects.
    pub async fn list_projects(&self) -> Result<Vec<Value>, ClusterError> {
        self.resources.list(&projects(), &ListOptions::default()).await
    }

    /// List image streams.
    pub async fn list_imagestreams(&self, namespace: &str) -> Result<Vec<Value>, ClusterError> {
        self.resources
            .list(&imagestreams(namespace), &ListOptions::default())
            .await
    }

    /// Get one image stream.
    pub async fn get_imagestream(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Value, ClusterError> {
        self.resources.get(&imagestreams(namespace), name).await
    }

    /// List build configs.
    pub async fn list_buildconfigs(&self, namespace: &str) -> Result<Vec<Value>, ClusterError> {
        self.resources
            .list(&buildconfigs(namespace), &ListOptions::default())
            .await
    }

    /// List deployment configs.
    pub async fn list_deploymentconfigs(
        &self,
        namespace: &str,
    ) -> Result<Vec<Value>, ClusterError> {
        self.resources
            .list(&deploymentconfigs(namespace), &ListOptions::default())
            .await
    }

    /// Start a build from a build config, the way `oc start-build`
    /// does: read the config and create a Build carrying its source,
    /// strategy and output.
    pub async fn start_build(&self, namespace: &str, name: &str) -> Result<Value, ClusterError> {
        let config = self.resources.get(&buildconfigs(namespace), name).await?;
        let spec = object::nested(&config, &["spec"]).cloned().ok_or_else(|| {
            ClusterError::InvalidObject(format!("BuildConfig {name} has no spec"))
        })?;

        let mut build_spec = json!({
            "source": spec.get("source").cloned().unwrap_or(Value::Null),
            "strategy": spec.get("strategy").cloned().unwrap_or(Value::Null),
            "output": spec.get("output").cloned().unwrap_or(Value::Null),
        });
        if let Some(service_account) = spec.get("serviceAccount") {
            build_spec["serviceAccount"] = service_account.clone();
        }

        let build = json!({
            "apiVersion": "build.openshift.io/v1",
            "kind": "Build",
            "metadata": {
                "generateName": format!("{name}-"),
                "namespace": namespace,
                "labels": {"buildconfig": name}
            },
            "spec": build_spec
        });

        debug!(buildconfig = name, "starting build");
        self.backend.create(&builds(namespace), &build).await
    }

    /// Trigger a manual rollout of a deployment config by bumping
    /// `status.latestVersion`, the way `oc rollout latest` does.
    pub async fn rollout_latest(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<(i64, Value), ClusterError> {
        let config = self
            .resources
            .get(&deploymentconfigs(namespace), name)
            .await?;
        let latest = object::nested_i64(&config, &["status", "latestVersion"]).unwrap_or(0);
        let next = latest + 1;

        let patch = json!({"status": {"latestVersion": next}});
        let updated = self
            .backend
            .patch_merge(&deploymentconfigs(namespace), name, &patch)
            .await?;
        Ok((next, updated))
    }

    /// Promote an image stream tag (e.g. `app:dev` → `app:prod`).
    ///
    /// With `copy` the destination pins the source's resolved image
    /// reference; otherwise it references the source tag itself. The
    /// destination is created or updated with the live resourceVersion
    /// carried forward.
    pub async fn promote_tag(
        &self,
        namespace: &str,
        stream: &str,
        source_tag: &str,
        target_tag: &str,
        copy: bool,
    ) -> Result<Value, PromoteTagError> {
        let source_name = format!("{stream}:{source_tag}");
        let target_name = format!("{stream}:{target_tag}");
        let target = imagestreamtags(namespace);

        let source = self
            .resources
            .get(&target, &source_name)
            .await
            .map_err(|source| PromoteTagError {
                step: PromoteStep::GetSource,
                source,
            })?;

        let from = if copy {
            let image = object::nested_str(&source, &["image", "dockerImageReference"])
                .unwrap_or_default();
            if image.is_empty() {
                return Err(PromoteTagError {
                    step: PromoteStep::ResolveImage,
                    source: ClusterError::InvalidObject(format!(
                        "source tag {source_name} has no resolved image reference"
                    )),
                });
            }
            json!({"kind": "DockerImage", "name": image})
        } else {
            json!({"kind": "ImageStreamTag", "name": source_name})
        };

        let destination = json!({
            "apiVersion": "image.openshift.io/v1",
            "kind": "ImageStreamTag",
            "metadata": {"name": target_name, "namespace": namespace},
            "tag": {"name": target_tag, "from": from}
        });

        debug!(stream, source_tag, target_tag, copy, "promoting tag");
        self.resources
            .apply(&target, destination)
            .await
            .map_err(|source| PromoteTagError {
                step: PromoteStep::WriteTarget,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::{CallRecord, FakeBackend};

    fn seed_source_tag(fake: &FakeBackend, with_image: bool) {
        let mut tag = json!({
            "apiVersion": "image.openshift.io/v1",
            "kind": "ImageStreamTag",
            "metadata": {"name": "app:dev", "namespace": "demo", "resourceVersion": "7"}
        });
        if with_image {
            tag["image"] = json!({"dockerImageReference": "registry.local/app@sha256:abc"});
        }
        fake.insert_object(&imagestreamtags("demo"), tag);
    }

    #[tokio::test]
    async fn test_promote_tag_by_reference() {
        let fake = Arc::new(FakeBackend::new());
        seed_source_tag(&fake, false);

        let client = OpenShiftClient::new(fake.clone());
        let promoted = client
            .promote_tag("demo", "app", "dev", "prod", false)
            .await
            .unwrap();

        assert_eq!(
            object::nested_str(&promoted, &["tag", "from", "kind"]),
            Some("ImageStreamTag")
        );
        assert_eq!(
            object::nested_str(&promoted, &["tag", "from", "name"]),
            Some("app:dev")
        );
    }

    #[tokio::test]
    async fn test_promote_tag_copy_pins_image() {
        let fake = Arc::new(FakeBackend::new());
        seed_source_tag(&fake, true);

        let client = OpenShiftClient::new(fake.clone());
        let promoted = client
            .promote_tag("demo", "app", "dev", "prod", true)
            .await
            .unwrap();

        assert_eq!(
            object::nested_str(&promoted, &["tag", "from", "kind"]),
            Some("DockerImage")
        );
        assert_eq!(
            object::nested_str(&promoted, &["tag", "from", "name"]),
            Some("registry.local/app@sha256:abc")
        );
    }

    #[tokio::test]
    async fn test_promote_tag_copy_requires_image() {
        let fake = Arc::new(FakeBackend::new());
        seed_source_tag(&fake, false);

        let client = OpenShiftClient::new(fake.clone());
        let err = client
            .promote_tag("demo", "app", "dev", "prod", true)
            .await
            .unwrap_err();

        assert_eq!(err.step, PromoteStep::ResolveImage);
        // Only the source read happened; nothing was written.
        let writes = fake
            .calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    CallRecord::Create { .. } | CallRecord::Update { .. }
                )
            })
            .count();
        assert_eq!(writes, 0);
    }

    #[tokio::test]
    async fn test_promote_tag_updates_existing_destination() {
        let fake = Arc::new(FakeBackend::new());
        seed_source_tag(&fake, false);
        fake.insert_object(
            &imagestreamtags("demo"),
            json!({
                "apiVersion": "image.openshift.io/v1",
                "kind": "ImageStreamTag",
                "metadata": {"name": "app:prod", "namespace": "demo", "resourceVersion": "12"}
            }),
        );

        let client = OpenShiftClient::new(fake.clone());
        client
            .promote_tag("demo", "app", "dev", "prod", false)
            .await
            .unwrap();

        let update = fake
            .calls()
            .into_iter()
            .find_map(|call| match call {
                CallRecord::Update { object, .. } => Some(object),
                _ => None,
            })
            .expect("destination was updated, not created");
        assert_eq!(object::resource_version(&update), Some("12"));
    }

    #[tokio::test]
    async fn test_promote_tag_missing_source() {
        let fake = Arc::new(FakeBackend::new());
        let client = OpenShiftClient::new(fake.clone());
        let err = client
            .promote_tag("demo", "app", "dev", "prod", false)
            .await
            .unwrap_err();
        assert_eq!(err.step, PromoteStep::GetSource);
    }

    #[tokio::test]
    async fn test_start_build_copies_config_spec() {
        let fake = Arc::new(FakeBackend::new());
        fake.insert_object(
            &buildconfigs("demo"),
            json!({
                "apiVersion": "build.openshift.io/v1",
                "kind": "BuildConfig",
                "metadata": {"name": "web", "namespace": "demo"},
                "spec": {
                    "source": {"git": {"uri": "https://example.com/web.git"}},
                    "strategy": {"type": "Source"},
                    "output": {"to": {"kind": "ImageStreamTag", "name": "web:latest"}},
                    "serviceAccount": "builder"
                }
            }),
        );

        let client = OpenShiftClient::new(fake.clone());
        let build = client.start_build("demo", "web").await.unwrap();

        assert_eq!(object::kind(&build), Some("Build"));
        assert!(object::name(&build).unwrap().starts_with("web-"));
        assert_eq!(
            object::nested_str(&build, &["spec", "serviceAccount"]),
            Some("builder")
        );
        assert_eq!(
            object::nested_str(&build, &["metadata", "labels", "buildconfig"]),
            Some("web")
        );
    }

    #[tokio::test]
    async fn test_rollout_latest_bumps_version() {
        let fake = Arc::new(FakeBackend::new());
        fake.insert_object(
            &deploymentconfigs("demo"),
            json!({
                "apiVersion": "apps.openshift.io/v1",
                "kind": "DeploymentConfig",
                "metadata": {"name": "api", "namespace": "demo"},
                "status": {"latestVersion": 3}
            }),
        );

        let client = OpenShiftClient::new(fake.clone());
        let (next, _) = client.rollout_latest("demo", "api").await.unwrap();
        assert_eq!(next, 4);

        let stored = fake.object(&deploymentconfigs("demo"), "api").unwrap();
        assert_eq!(
            object::nested_i64(&stored, &["status", "latestVersion"]),
            Some(4)
        );
    }
}
