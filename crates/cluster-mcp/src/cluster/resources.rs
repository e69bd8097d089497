//! Generic resource client.
//!
//! Operates on any resource type addressed by group/version/plural
//! without compile-time knowledge of its shape. This is where the two
//! stateful patterns of the system live: the pagination loop that
//! accumulates a full listing from continuation-token pages, and the
//! get-then-create-or-update sequence behind `apply`.

use super::object;
use super::{ClusterBackend, ClusterError, ListQuery, ResourceTarget};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Options accepted by a full listing. Callers never deal with
/// continuation tokens; the client drains all pages itself.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Label selector expression.
    pub label_selector: Option<String>,
    /// Field selector expression.
    pub field_selector: Option<String>,
    /// Page size used for every page request.
    pub limit: Option<u32>,
}

/// Client for list/get/apply/delete against arbitrary resource types.
#[derive(Clone)]
pub struct ResourceClient {
    backend: Arc<dyn ClusterBackend>,
}

impl ResourceClient {
    /// Create a new generic resource client over a shared backend.
    pub fn new(backend: Arc<dyn ClusterBackend>) -> Self {
        Self { backend }
    }

    /// List all objects of a collection.
    ///
    /// Issues follow-up page requests with the same page size and the
    /// latest continuation token until the server stops returning one,
    /// and returns the accumulated items in server order.
    pub async fn list(
        &self,
        target: &ResourceTarget,
        options: &ListOptions,
    ) -> Result<Vec<Value>, ClusterError> {
        let mut items = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let query = ListQuery {
                label_selector: options.label_selector.clone(),
                field_selector: options.field_selector.clone(),
                limit: options.limit,
                continue_token: continue_token.clone(),
            };
            let page = self.backend.list_page(target, &query).await?;
            items.extend(page.items);

            match page.continue_token {
                Some(token) if !token.is_empty() => continue_token = Some(token),
                _ => break,
            }
        }

        debug!(resource = %target.plural, count = items.len(), "listed collection");
        Ok(items)
    }

    /// Fetch one object by name.
    pub async fn get(&self, target: &ResourceTarget, name: &str) -> Result<Value, ClusterError> {
        self.backend.get(target, name).await
    }

    /// Create or update an object.
    ///
    /// The object must carry `apiVersion`, `kind` and `metadata.name`.
    /// An existing object's `resourceVersion` is copied into the payload
    /// before the update so the API server's optimistic-concurrency
    /// check applies. The get/update pair is not atomic; a concurrent
    /// delete surfaces as the update's conflict or not-found error.
    pub async fn apply(
        &self,
        target: &ResourceTarget,
        mut object: Value,
    ) -> Result<Value, ClusterError> {
        if object::api_version(&object).is_none() {
            return Err(ClusterError::InvalidObject(
                "object must have apiVersion".to_string(),
            ));
        }
        if object::kind(&object).is_none() {
            return Err(ClusterError::InvalidObject(
                "object must have kind".to_string(),
            ));
        }
        let name = match object::name(&object) {
            Some(name) => name.to_string(),
            None => {
                return Err(ClusterError::InvalidObject(
                    "object must have metadata.name".to_string(),
                ))
            }
        };

        match self.backend.get(target, &name).await {
            Ok(existing) => {
                if let Some(version) = object::resource_version(&existing) {
                    object::set_resource_version(&mut object, version);
                }
                self.backend.update(target, &name, &object).await
            }
            Err(err) if err.is_not_found() => self.backend.create(target, &object).await,
            Err(err) => Err(err),
        }
    }

    /// Delete an object by name. Deleting a missing object returns a
    /// not-found error, never a silent success.
    pub async fn delete(&self, target: &ResourceTarget, name: &str) -> Result<(), ClusterError> {
        self.backend.delete(target, name).await
    }
}
