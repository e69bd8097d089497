//! Typed accessors for dynamically-typed cluster objects.
//!
//! Cluster objects without generated types (OpenShift and KubeVirt
//! kinds, anything reached through the generic resource tools) are
//! plain `serde_json::Value` trees. These helpers give typed access to
//! the well-known envelope fields and to nested values, so handlers do
//! not scatter ad hoc map traversal.

use serde_json::Value;

/// `metadata.name` of an object.
pub fn name(object: &Value) -> Option<&str> {
    object.pointer("/metadata/name").and_then(Value::as_str)
}

/// `metadata.namespace` of an object.
pub fn namespace(object: &Value) -> Option<&str> {
    object.pointer("/metadata/namespace").and_then(Value::as_str)
}

/// `metadata.resourceVersion` of an object.
pub fn resource_version(object: &Value) -> Option<&str> {
    object
        .pointer("/metadata/resourceVersion")
        .and_then(Value::as_str)
}

/// `apiVersion` of an object.
pub fn api_version(object: &Value) -> Option<&str> {
    object.get("apiVersion").and_then(Value::as_str)
}

/// `kind` of an object.
pub fn kind(object: &Value) -> Option<&str> {
    object.get("kind").and_then(Value::as_str)
}

/// Set `metadata.resourceVersion`, creating `metadata` if necessary.
pub fn set_resource_version(object: &mut Value, version: &str) {
    let metadata = object
        .as_object_mut()
        .map(|map| map.entry("metadata").or_insert_with(|| Value::Object(Default::default())));
    if let Some(Value::Object(metadata)) = metadata {
        metadata.insert(
            "resourceVersion".to_string(),
            Value::String(version.to_string()),
        );
    }
}

/// A nested string value addressed by field path.
pub fn nested_str<'a>(object: &'a Value, path: &[&str]) -> Option<&'a str> {
    nested(object, path).and_then(Value::as_str)
}

/// A nested integer value addressed by field path.
pub fn nested_i64(object: &Value, path: &[&str]) -> Option<i64> {
    nested(object, path).and_then(Value::as_i64)
}

/// A nested value addressed by field path.
pub fn nested<'a>(object: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = object;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Split an `apiVersion` string into `(group, version)`. The core API
/// group has no slash and yields an empty group.
pub fn split_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachine",
            "metadata": {
                "name": "vm-a",
                "namespace": "demo",
                "resourceVersion": "41"
            },
            "spec": {"runStrategy": "Always"},
            "status": {"latestVersion": 3}
        })
    }

    #[test]
    fn test_envelope_accessors() {
        let obj = sample();
        assert_eq!(name(&obj), Some("vm-a"));
        assert_eq!(namespace(&obj), Some("demo"));
        assert_eq!(resource_version(&obj), Some("41"));
        assert_eq!(api_version(&obj), Some("kubevirt.io/v1"));
        assert_eq!(kind(&obj), Some("VirtualMachine"));
    }

    #[test]
    fn test_nested_lookups() {
        let obj = sample();
        assert_eq!(nested_str(&obj, &["spec", "runStrategy"]), Some("Always"));
        assert_eq!(nested_i64(&obj, &["status", "latestVersion"]), Some(3));
        assert_eq!(nested_str(&obj, &["spec", "missing"]), None);
    }

    #[test]
    fn test_set_resource_version() {
        let mut obj = json!({"apiVersion": "v1", "kind": "ConfigMap"});
        set_resource_version(&mut obj, "9");
        assert_eq!(resource_version(&obj), Some("9"));

        let mut obj = sample();
        set_resource_version(&mut obj, "42");
        assert_eq!(resource_version(&obj), Some("42"));
    }

    #[test]
    fn test_split_api_version() {
        assert_eq!(split_api_version("v1"), (String::new(), "v1".to_string()));
        assert_eq!(
            split_api_version("image.openshift.io/v1"),
            ("image.openshift.io".to_string(), "v1".to_string())
        );
    }
}
