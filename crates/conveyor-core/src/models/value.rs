//! Property values of plan resources.
//!
//! Resource properties are JSON-shaped trees in which two one-key maps carry
//! special meaning: `{"get_resource": "name"}` points at another resource of
//! the same plan and `{"get_attr": ["name", "attr", ...]}` points at one of its
//! attributes. [`PropertyValue`] decodes those pointers into dedicated
//! variants so consumers can pattern match instead of inspecting maps, and
//! encodes them back into the exact same JSON form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Key of the resource pointer map.
pub const RESOURCE_POINTER: &str = "get_resource";

/// Key of the attribute pointer map.
pub const ATTRIBUTE_POINTER: &str = "get_attr";

/// A node of a resource property tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Seq(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    /// `{"get_resource": resource}`
    ResourceRef(String),
    /// `{"get_attr": [resource, path...]}`
    AttrRef {
        resource: String,
        path: Vec<PropertyValue>,
    },
}

impl PropertyValue {
    /// Returns the string slice if this is a plain string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a sequence.
    pub fn as_seq(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a plain map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up `key` if this is a plain map.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.as_map().and_then(|entries| entries.get(key))
    }

    /// Name of the resource this value points at, if it is a pointer.
    pub fn referenced_resource(&self) -> Option<&str> {
        match self {
            PropertyValue::ResourceRef(name) => Some(name),
            PropertyValue::AttrRef { resource, .. } => Some(resource),
            _ => None,
        }
    }

    /// Rewrites every pointer to `old` so that it points at `new`.
    ///
    /// Returns the number of pointers rewritten.
    pub fn rename_references(&mut self, old: &str, new: &str) -> usize {
        match self {
            PropertyValue::ResourceRef(name) if *name == old => {
                *name = new.to_string();
                1
            }
            PropertyValue::AttrRef { resource, path } => {
                let mut count: usize = path
                    .iter_mut()
                    .map(|item| item.rename_references(old, new))
                    .sum();
                if *resource == old {
                    *resource = new.to_string();
                    count += 1;
                }
                count
            }
            PropertyValue::Seq(items) => items
                .iter_mut()
                .map(|item| item.rename_references(old, new))
                .sum(),
            PropertyValue::Map(entries) => entries
                .values_mut()
                .map(|item| item.rename_references(old, new))
                .sum(),
            PropertyValue::Null
            | PropertyValue::Bool(_)
            | PropertyValue::Number(_)
            | PropertyValue::String(_)
            | PropertyValue::ResourceRef(_) => 0,
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(b),
            Value::Number(n) => PropertyValue::Number(n),
            Value::String(s) => PropertyValue::String(s),
            Value::Array(items) => {
                PropertyValue::Seq(items.into_iter().map(PropertyValue::from).collect())
            }
            Value::Object(entries) => decode_map(entries),
        }
    }
}

fn decode_map(entries: Map<String, Value>) -> PropertyValue {
    if entries.len() == 1 {
        match entries.iter().next() {
            Some((key, Value::String(name))) if key == RESOURCE_POINTER => {
                return PropertyValue::ResourceRef(name.clone());
            }
            Some((key, Value::Array(items))) if key == ATTRIBUTE_POINTER => {
                if let Some((Value::String(resource), path)) = items.split_first() {
                    return PropertyValue::AttrRef {
                        resource: resource.clone(),
                        path: path.iter().cloned().map(PropertyValue::from).collect(),
                    };
                }
            }
            _ => {}
        }
    }

    PropertyValue::Map(
        entries
            .into_iter()
            .map(|(key, value)| (key, PropertyValue::from(value)))
            .collect(),
    )
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(b),
            PropertyValue::Number(n) => Value::Number(n),
            PropertyValue::String(s) => Value::String(s),
            PropertyValue::Seq(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            PropertyValue::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
            PropertyValue::ResourceRef(name) => {
                let mut map = Map::new();
                map.insert(RESOURCE_POINTER.to_string(), Value::String(name));
                Value::Object(map)
            }
            PropertyValue::AttrRef { resource, path } => {
                let mut items = vec![Value::String(resource)];
                items.extend(path.into_iter().map(Value::from));
                let mut map = Map::new();
                map.insert(ATTRIBUTE_POINTER.to_string(), Value::Array(items));
                Value::Object(map)
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}
