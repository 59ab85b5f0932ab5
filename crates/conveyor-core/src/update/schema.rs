//! Typed field schemas for update commands.
//!
//! Clients often send every field as a string (`"true"`, `"20"`,
//! `"[{\"subnet_id\": ...}]"`). Each resource type declares the kind of the
//! fields it understands and inputs are parsed against that kind with
//! `serde_json`; nothing is ever evaluated.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::{
    error::{ConveyorError, Result},
    models::{Properties, PropertyValue},
};

/// Expected shape of a command field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Integer,
    String,
    List,
    Map,
    /// Accepted as sent
    Any,
}

impl FieldKind {
    /// Parses `value` into this kind.
    pub fn coerce(self, value: &Value) -> std::result::Result<Value, String> {
        match (self, value) {
            (FieldKind::Any, _) => Ok(value.clone()),
            (FieldKind::Bool, Value::Bool(_)) => Ok(value.clone()),
            (FieldKind::Bool, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("expected a boolean, got '{s}'")),
            },
            (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            (FieldKind::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|_| format!("expected an integer, got '{s}'")),
            (FieldKind::String, Value::String(_)) => Ok(value.clone()),
            (FieldKind::List, Value::Array(_)) | (FieldKind::Map, Value::Object(_)) => {
                Ok(value.clone())
            }
            (FieldKind::List | FieldKind::Map, Value::String(s)) => {
                let parsed: Value = serde_json::from_str(s)
                    .map_err(|e| format!("expected {}, got unparsable text: {e}", self.describe()))?;
                match (self, &parsed) {
                    (FieldKind::List, Value::Array(_)) | (FieldKind::Map, Value::Object(_)) => {
                        Ok(parsed)
                    }
                    _ => Err(format!("expected {}, got '{s}'", self.describe())),
                }
            }
            (_, other) => Err(format!("expected {}, got {other}", self.describe())),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldKind::Bool => "a boolean",
            FieldKind::Integer => "an integer",
            FieldKind::String => "a string",
            FieldKind::List => "a list",
            FieldKind::Map => "a map",
            FieldKind::Any => "any value",
        }
    }
}

/// Field kinds understood for one resource type.
///
/// Fields without a declared kind are accepted as sent.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: BTreeMap<String, FieldKind>,
}

impl FieldSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the kind of `name`.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Kind of `name`, `Any` when undeclared.
    pub fn kind_of(&self, name: &str) -> FieldKind {
        self.fields.get(name).copied().unwrap_or(FieldKind::Any)
    }

    /// Parses every field of command `index` into property values.
    pub fn coerce_all(&self, index: usize, fields: &Map<String, Value>) -> Result<Properties> {
        fields
            .iter()
            .map(|(name, value)| {
                self.kind_of(name)
                    .coerce(value)
                    .map(|parsed| (name.clone(), PropertyValue::from(parsed)))
                    .map_err(|reason| {
                        ConveyorError::update_rejected(index, format!("field '{name}': {reason}"))
                    })
            })
            .collect()
    }
}
