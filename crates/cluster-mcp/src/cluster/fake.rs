//! In-memory cluster backend for tests.
//!
//! Simulates the API server without any network: scripted list pages,
//! a keyed object store with create/update/patch/delete semantics, and
//! a full call log so tests can assert exactly which requests a handler
//! issued (including that none were issued at all).

use super::{
    ClusterBackend, ClusterError, ExecOutput, ExecQuery, ListQuery, LogQuery, ObjectPage,
    ResourceTarget,
};
use crate::cluster::object;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One recorded backend call.
#[derive(Debug, Clone)]
pub(crate) enum CallRecord {
    ListPage {
        plural: String,
        query: ListQuery,
    },
    Get {
        plural: String,
        name: String,
    },
    Create {
        plural: String,
        object: Value,
    },
    Update {
        plural: String,
        name: String,
        object: Value,
    },
    PatchMerge {
        plural: String,
        name: String,
        patch: Value,
    },
    Delete {
        plural: String,
        name: String,
    },
    PodLogs {
        namespace: String,
        name: String,
    },
    PodExec {
        namespace: String,
        name: String,
        command: Vec<String>,
    },
    ApiGroups,
}

/// Fake backend with scripted responses and a call log.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pages: Mutex<VecDeque<ObjectPage>>,
    objects: Mutex<HashMap<(String, String), Value>>,
    calls: Mutex<Vec<CallRecord>>,
    logs: Mutex<String>,
    exec_output: Mutex<ExecOutput>,
    api_groups: Mutex<Value>,
    /// `Some(n)`: the first `n` merge patches succeed, the rest fail.
    patch_budget: Mutex<Option<usize>>,
}

fn store_key(target: &ResourceTarget, name: &str) -> (String, String) {
    (
        format!(
            "{}|{}|{}",
            target.group,
            target.plural,
            target.namespace.as_deref().unwrap_or("*")
        ),
        name.to_string(),
    )
}

/// Recursive JSON merge patch: objects merge key-wise, `null` removes,
/// everything else replaces.
fn merge_patch(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                if patch_value.is_null() {
                    base_map.remove(key);
                } else {
                    merge_patch(
                        base_map.entry(key.clone()).or_insert(Value::Null),
                        patch_value,
                    );
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a list page; pages are served in push order.
    pub fn push_page(&self, page: ObjectPage) {
        self.pages.lock().unwrap().push_back(page);
    }

    /// Seed an object into the store. The name is taken from the
    /// object's metadata.
    pub fn insert_object(&self, target: &ResourceTarget, object: Value) {
        let name = object::name(&object).expect("seeded object has a name").to_string();
        self.objects
            .lock()
            .unwrap()
            .insert(store_key(target, &name), object);
    }

    /// The stored object, if present.
    pub fn object(&self, target: &ResourceTarget, name: &str) -> Option<Value> {
        self.objects
            .lock()
            .unwrap()
            .get(&store_key(target, name))
            .cloned()
    }

    /// Everything recorded so far.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    /// Set the scripted pod log output.
    pub fn set_logs(&self, logs: &str) {
        *self.logs.lock().unwrap() = logs.to_string();
    }

    /// Set the scripted exec output.
    pub fn set_exec_output(&self, output: ExecOutput) {
        *self.exec_output.lock().unwrap() = output;
    }

    /// Allow `budget` merge patches to succeed; later ones fail with a
    /// server error.
    pub fn fail_patches_after(&self, budget: usize) {
        *self.patch_budget.lock().unwrap() = Some(budget);
    }

    fn record(&self, call: CallRecord) {
        self.calls.lock().unwrap().push(call);
    }

    fn not_found(target: &ResourceTarget, name: &str) -> ClusterError {
        ClusterError::NotFound {
            resource: target.plural.clone(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ClusterBackend for FakeBackend {
    async fn list_page(
        &self,
        target: &ResourceTarget,
        query: &ListQuery,
    ) -> Result<ObjectPage, ClusterError> {
        self.record(CallRecord::ListPage {
            plural: target.plural.clone(),
            query: query.clone(),
        });
        Ok(self
            .pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn get(&self, target: &ResourceTarget, name: &str) -> Result<Value, ClusterError> {
        self.record(CallRecord::Get {
            plural: target.plural.clone(),
            name: name.to_string(),
        });
        self.object(target, name)
            .ok_or_else(|| Self::not_found(target, name))
    }

    async fn create(&self, target: &ResourceTarget, object: &Value) -> Result<Value, ClusterError> {
        self.record(CallRecord::Create {
            plural: target.plural.clone(),
            object: object.clone(),
        });

        let mut stored = object.clone();
        let name = match object::name(&stored) {
            Some(name) => name.to_string(),
            None => {
                // generateName support, the way the API server fills it in.
                let prefix = object::nested_str(&stored, &["metadata", "generateName"])
                    .ok_or_else(|| {
                        ClusterError::InvalidObject("object must have metadata.name".to_string())
                    })?
                    .to_string();
                let generated = format!("{prefix}abc12");
                if let Some(Value::Object(metadata)) = stored.get_mut("metadata") {
                    metadata.insert("name".to_string(), Value::String(generated.clone()));
                }
                generated
            }
        };

        if object::resource_version(&stored).is_none() {
            object::set_resource_version(&mut stored, "1");
        }
        self.objects
            .lock()
            .unwrap()
            .insert(store_key(target, &name), stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        target: &ResourceTarget,
        name: &str,
        object: &Value,
    ) -> Result<Value, ClusterError> {
        self.record(CallRecord::Update {
            plural: target.plural.clone(),
            name: name.to_string(),
            object: object.clone(),
        });

        let key = store_key(target, name);
        let mut objects = self.objects.lock().unwrap();
        if !objects.contains_key(&key) {
            return Err(Self::not_found(target, name));
        }
        objects.insert(key, object.clone());
        Ok(object.clone())
    }

    async fn patch_merge(
        &self,
        target: &ResourceTarget,
        name: &str,
        patch: &Value,
    ) -> Result<Value, ClusterError> {
        self.record(CallRecord::PatchMerge {
            plural: target.plural.clone(),
            name: name.to_string(),
            patch: patch.clone(),
        });

        let mut budget = self.patch_budget.lock().unwrap();
        if let Some(remaining) = budget.as_mut() {
            if *remaining == 0 {
                return Err(ClusterError::Api {
                    code: 500,
                    message: "injected patch failure".to_string(),
                });
            }
            *remaining -= 1;
        }
        drop(budget);

        let key = store_key(target, name);
        let mut objects = self.objects.lock().unwrap();
        let stored = objects
            .get_mut(&key)
            .ok_or_else(|| Self::not_found(target, name))?;
        merge_patch(stored, patch);
        Ok(stored.clone())
    }

    async fn delete(&self, target: &ResourceTarget, name: &str) -> Result<(), ClusterError> {
        self.record(CallRecord::Delete {
            plural: target.plural.clone(),
            name: name.to_string(),
        });
        self.objects
            .lock()
            .unwrap()
            .remove(&store_key(target, name))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(target, name))
    }

    async fn pod_logs(
        &self,
        namespace: &str,
        name: &str,
        _query: &LogQuery,
    ) -> Result<String, ClusterError> {
        self.record(CallRecord::PodLogs {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        Ok(self.logs.lock().unwrap().clone())
    }

    async fn pod_exec(
        &self,
        namespace: &str,
        name: &str,
        query: &ExecQuery,
    ) -> Result<ExecOutput, ClusterError> {
        self.record(CallRecord::PodExec {
            namespace: namespace.to_string(),
            name: name.to_string(),
            command: query.command.clone(),
        });
        Ok(self.exec_output.lock().unwrap().clone())
    }

    async fn api_groups(&self) -> Result<Value, ClusterError> {
        self.record(CallRecord::ApiGroups);
        Ok(self.api_groups.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_patch_semantics() {
        let mut base = json!({"spec": {"runStrategy": "Always", "keep": 1}});
        merge_patch(&mut base, &json!({"spec": {"runStrategy": "Halted"}}));
        assert_eq!(base["spec"]["runStrategy"], json!("Halted"));
        assert_eq!(base["spec"]["keep"], json!(1));

        merge_patch(&mut base, &json!({"spec": {"keep": null}}));
        assert!(base["spec"].get("keep").is_none());
    }
}
