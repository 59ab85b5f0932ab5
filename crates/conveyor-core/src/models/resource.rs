//! Plan resources and their derived dependency records.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PropertyValue;

/// Property tree of a resource, keyed by property name.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Resources of one plan view, keyed by resource name.
pub type ResourceMap = BTreeMap<String, Resource>;

/// Dependency records of one plan view, keyed by resource name.
pub type DependencyMap = BTreeMap<String, ResourceDependency>;

/// Makes every resource's `name` equal to its key in `resources`.
///
/// The key is authoritative: pointers and dependency records address
/// resources by key.
pub fn align_names(resources: &mut ResourceMap) {
    for (key, resource) in resources.iter_mut() {
        if resource.name != *key {
            debug!("Renaming resource '{}' to its key '{key}'", resource.name);
            resource.name = key.clone();
        }
    }
}

/// One cloud object within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Name of the resource, unique within a plan view
    pub name: String,

    /// Orchestration type tag, e.g. `OS::Nova::Server`
    #[serde(rename = "type", alias = "resource_type")]
    pub resource_type: String,

    /// Provider-assigned identifier, empty for resources not created yet
    #[serde(default)]
    pub id: String,

    /// Properties handed to the template executor
    #[serde(default)]
    pub properties: Properties,

    /// Side-channel metadata that is never sent to the executor
    #[serde(default)]
    pub extra_properties: Map<String, Value>,

    /// Externally supplied inputs
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Resource {
    /// Creates a resource without properties.
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            id: String::new(),
            properties: Properties::new(),
            extra_properties: Map::new(),
            parameters: Map::new(),
        }
    }

    /// Sets the provider identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Human readable name: the `name` property when it is a string, else the
    /// resource name.
    pub fn display_name(&self) -> &str {
        self.properties
            .get("name")
            .and_then(PropertyValue::as_str)
            .unwrap_or(&self.name)
    }

    /// Rewrites every pointer to `old` inside this resource's properties.
    pub fn rename_references(&mut self, old: &str, new: &str) -> usize {
        self.properties
            .values_mut()
            .map(|value| value.rename_references(old, new))
            .sum()
    }
}

/// Cached dependency view of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDependency {
    /// Provider identifier of the resource
    #[serde(default)]
    pub id: String,

    /// Key of the resource in its plan view
    pub name_in_template: String,

    /// Human readable name
    #[serde(rename = "name")]
    pub display_name: String,

    /// Orchestration type tag
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Names of the resources this one depends on, first-seen order
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ResourceDependency {
    /// Creates the dependency record of `resource`, stored under `name`.
    pub fn for_resource(name: &str, resource: &Resource, dependencies: Vec<String>) -> Self {
        Self {
            id: resource.id.clone(),
            name_in_template: name.to_string(),
            display_name: resource.display_name().to_string(),
            resource_type: resource.resource_type.clone(),
            dependencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resource_document_shape() {
        let resource: Resource = serde_json::from_value(json!({
            "name": "server_0",
            "type": "OS::Nova::Server",
            "id": "9a4c",
            "properties": {
                "name": "web",
                "block_device_mapping_v2": [{"volume_id": {"get_resource": "volume_0"}}]
            },
            "extra_properties": {"sys_clone": false}
        }))
        .expect("Failed to decode resource");

        assert_eq!(resource.resource_type, "OS::Nova::Server");
        assert_eq!(resource.display_name(), "web");
        assert!(resource.parameters.is_empty());

        let encoded = serde_json::to_value(&resource).expect("Failed to encode resource");
        assert_eq!(
            encoded["properties"]["block_device_mapping_v2"][0]["volume_id"],
            json!({"get_resource": "volume_0"})
        );
    }

    #[test]
    fn test_align_names_uses_map_key() {
        let mut resources: ResourceMap = serde_json::from_value(json!({
            "volume_0": {"name": "data_volume", "type": "OS::Cinder::Volume"},
            "volume_1": {"name": "volume_1", "type": "OS::Cinder::Volume"}
        }))
        .expect("Failed to decode resources");

        align_names(&mut resources);

        assert_eq!(resources["volume_0"].name, "volume_0");
        assert_eq!(resources["volume_1"].name, "volume_1");
    }

    #[test]
    fn test_display_name_falls_back_to_resource_name() {
        let resource = Resource::new("volume_0", "OS::Cinder::Volume");
        assert_eq!(resource.display_name(), "volume_0");
    }
}
