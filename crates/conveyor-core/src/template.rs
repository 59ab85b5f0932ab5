//! Conversion between Heat templates and plan resources.

use serde_json::{json, Map, Value};

use crate::{
    error::{ConveyorError, Result},
    models::{Properties, PropertyValue, Resource, ResourceMap},
};

/// Template format version emitted by [`resources_to_template`].
pub const TEMPLATE_VERSION: &str = "2013-05-23";

const PARAMETER_POINTER: &str = "get_param";

/// Builds plan resources from the `resources` section of a template.
///
/// A resource's `id` is taken from its own `id` key or from
/// `extra_properties.id`; its parameters are the template parameters its
/// properties read through `get_param`.
pub fn resources_from_template(template: &Value) -> Result<ResourceMap> {
    let definitions = template
        .get("resources")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ConveyorError::invalid_input("template").with_reason("missing 'resources' map")
        })?;
    let declared = template
        .get("parameters")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    definitions
        .iter()
        .map(|(name, definition)| {
            resource_from_definition(name, definition, &declared).map(|r| (name.clone(), r))
        })
        .collect()
}

fn resource_from_definition(
    name: &str,
    definition: &Value,
    declared: &Map<String, Value>,
) -> Result<Resource> {
    let invalid = |reason: &str| {
        ConveyorError::invalid_input(format!("resources.{name}")).with_reason(reason)
    };
    let definition = definition
        .as_object()
        .ok_or_else(|| invalid("resource definition must be a map"))?;
    let resource_type = definition
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing 'type'"))?;

    let raw_properties = match definition.get("properties") {
        Some(Value::Object(properties)) => properties.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(_) => return Err(invalid("'properties' must be a map")),
    };
    let extra_properties = match definition.get("extra_properties") {
        Some(Value::Object(extra)) => extra.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(_) => return Err(invalid("'extra_properties' must be a map")),
    };

    let mut referenced = Vec::new();
    for value in raw_properties.values() {
        collect_parameters(value, &mut referenced);
    }
    let parameters = referenced
        .into_iter()
        .filter_map(|param| declared.get(param).map(|spec| (param.to_string(), spec.clone())))
        .collect();

    let id = definition
        .get("id")
        .or_else(|| extra_properties.get("id"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(Resource {
        name: name.to_string(),
        resource_type: resource_type.to_string(),
        id,
        properties: raw_properties
            .into_iter()
            .map(|(key, value)| (key, PropertyValue::from(value)))
            .collect::<Properties>(),
        extra_properties,
        parameters,
    })
}

/// Names read through `{"get_param": name}` or `{"get_param": [name, ...]}`.
fn collect_parameters<'a>(value: &'a Value, found: &mut Vec<&'a str>) {
    match value {
        Value::Object(entries) => {
            if entries.len() == 1 {
                match entries.get(PARAMETER_POINTER) {
                    Some(Value::String(param)) => {
                        found.push(param);
                        return;
                    }
                    Some(Value::Array(items)) => {
                        if let Some(Value::String(param)) = items.first() {
                            found.push(param);
                            return;
                        }
                    }
                    _ => {}
                }
            }
            entries.values().for_each(|item| collect_parameters(item, found));
        }
        Value::Array(items) => items.iter().for_each(|item| collect_parameters(item, found)),
        _ => {}
    }
}

/// Renders plan resources as a template for the executor.
///
/// `extra_properties` stay behind; parameters of all resources are merged
/// into the template's `parameters` section.
pub fn resources_to_template(resources: &ResourceMap) -> Value {
    let mut parameters = Map::new();
    let mut definitions = Map::new();

    for (name, resource) in resources {
        parameters.extend(
            resource
                .parameters
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        let mut definition = Map::new();
        definition.insert("type".into(), Value::String(resource.resource_type.clone()));
        if !resource.properties.is_empty() {
            let properties: Map<String, Value> = resource
                .properties
                .iter()
                .map(|(key, value)| (key.clone(), Value::from(value.clone())))
                .collect();
            definition.insert("properties".into(), Value::Object(properties));
        }
        definitions.insert(name.clone(), Value::Object(definition));
    }

    json!({
        "heat_template_version": TEMPLATE_VERSION,
        "parameters": parameters,
        "resources": definitions,
    })
}
