//! Resource update commands and their payload parsing.

use serde_json::{Map, Value};

use crate::error::{ConveyorError, Result};

/// One change requested for the updated view of a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCommand {
    /// Add a new resource named `resource_id`
    Add {
        resource_id: String,
        resource_type: String,
        fields: Map<String, Value>,
    },
    /// Change fields of an existing resource
    Edit {
        resource_id: String,
        resource_type: Option<String>,
        fields: Map<String, Value>,
    },
    /// Remove a resource nothing depends on
    Delete { resource_id: String },
}

impl UpdateCommand {
    /// Name of the resource the command targets.
    pub fn resource_id(&self) -> &str {
        match self {
            UpdateCommand::Add { resource_id, .. }
            | UpdateCommand::Edit { resource_id, .. }
            | UpdateCommand::Delete { resource_id } => resource_id,
        }
    }

    /// Lowercase action keyword.
    pub fn action(&self) -> &'static str {
        match self {
            UpdateCommand::Add { .. } => "add",
            UpdateCommand::Edit { .. } => "edit",
            UpdateCommand::Delete { .. } => "delete",
        }
    }

    /// Parses one payload object of the form
    /// `{"action": "add"|"edit"|"delete", "resource_id": ..., ...}`.
    ///
    /// Keys other than `action`, `resource_id` and `resource_type` become the
    /// command's fields. `index` is the position in the batch and is reported
    /// in errors.
    pub fn from_payload(index: usize, payload: &Value) -> Result<Self> {
        let Some(object) = payload.as_object() else {
            return Err(ConveyorError::update_rejected(index, "command must be an object"));
        };

        let action = object
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| ConveyorError::update_rejected(index, "missing action"))?;
        let resource_id = match object.get("resource_id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(_) => {
                return Err(ConveyorError::update_rejected(
                    index,
                    "resource_id must be a non-empty string",
                ))
            }
            None => return Err(ConveyorError::update_rejected(index, "missing resource_id")),
        };
        let resource_type = match object.get("resource_type") {
            Some(Value::String(kind)) if !kind.is_empty() => Some(kind.clone()),
            Some(Value::Null) | None => None,
            Some(_) => {
                return Err(ConveyorError::update_rejected(
                    index,
                    "resource_type must be a non-empty string",
                ))
            }
        };
        let fields: Map<String, Value> = object
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "action" | "resource_id" | "resource_type"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        match action.to_lowercase().as_str() {
            "add" => {
                let resource_type = resource_type.ok_or_else(|| {
                    ConveyorError::update_rejected(index, "add requires resource_type")
                })?;
                Ok(UpdateCommand::Add {
                    resource_id,
                    resource_type,
                    fields,
                })
            }
            "edit" => Ok(UpdateCommand::Edit {
                resource_id,
                resource_type,
                fields,
            }),
            "delete" => Ok(UpdateCommand::Delete { resource_id }),
            other => Err(ConveyorError::update_rejected(
                index,
                format!("unknown action '{other}'"),
            )),
        }
    }

    /// Parses a JSON array of payload objects.
    pub fn parse_batch(payload: &Value) -> Result<Vec<Self>> {
        let Some(items) = payload.as_array() else {
            return Err(ConveyorError::invalid_input("resources")
                .with_reason("update payload must be a list of commands"));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::from_payload(index, item))
            .collect()
    }
}
