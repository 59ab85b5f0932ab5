//! Flattening of nested stack templates.
//!
//! A stack template may use another template file as a resource type, either
//! directly (`type: server.yaml`) or through a group resource whose
//! `properties.resource.type` is the file. The deployed nested stack is
//! located through the parent's resource list, extracted recursively and
//! inlined as `content` next to the physical id, so the plan carries one
//! self-contained template.

mod source;

use log::debug;
use serde_json::{Map, Value};

pub use source::{InMemoryTemplateSource, StackResource, TemplateSource};

use crate::error::{ConveyorError, Result};

/// Resource types that wrap other stacks without being file references.
const STACK_WRAPPERS: [&str; 3] = [
    "OS::Heat::ResourceGroup",
    "OS::Heat::AutoScalingGroup",
    "OS::Heat::Stack",
];

/// Whether a type tag names a template file rather than a provider type.
pub fn is_file_reference(resource_type: &str) -> bool {
    [".yaml", ".yml", ".template"]
        .iter()
        .any(|ext| resource_type.ends_with(ext))
        || ["file://", "http://", "https://"]
            .iter()
            .any(|scheme| resource_type.starts_with(scheme))
}

/// Recursively inlines nested stacks into a stack template.
///
/// Siblings are extracted one after the other; a child is only visited
/// once its parent has named its handle. Any missing nested resource aborts
/// the whole extraction.
pub struct NestedTemplateExtractor<'a> {
    source: &'a dyn TemplateSource,
    max_depth: usize,
}

impl<'a> NestedTemplateExtractor<'a> {
    pub const DEFAULT_MAX_DEPTH: usize = 16;

    pub fn new(source: &'a dyn TemplateSource) -> Self {
        Self {
            source,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Limits how many stacks deep the extraction may descend.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the template of `stack_id` with every nested stack inlined.
    pub fn extract(&self, stack_id: &str) -> Result<Value> {
        self.extract_stack(stack_id, 0)
    }

    fn check_depth(&self, stack_id: &str, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(ConveyorError::invalid_input("stack_id").with_reason(format!(
                "stack {stack_id} is nested more than {} levels deep",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn extract_stack(&self, stack_id: &str, depth: usize) -> Result<Value> {
        self.check_depth(stack_id, depth)?;
        debug!("Extracting template of stack {stack_id} at depth {depth}");

        let mut template = self.source.get_template(stack_id)?;
        let Some(resources) = template.get_mut("resources").and_then(Value::as_object_mut) else {
            return Ok(template);
        };

        let mut members: Option<Vec<StackResource>> = None;
        for (name, resource) in resources.iter_mut() {
            let Some(resource) = resource.as_object_mut() else {
                continue;
            };

            if resource_type(resource).is_some_and(is_file_reference) {
                let physical_id = self.physical_id(stack_id, name, &mut members)?;
                let content = self.extract_stack(&physical_id, depth + 1)?;
                resource.insert("content".into(), content);
                resource.insert("id".into(), Value::String(physical_id));
            } else if let Some(inner_type) = indirect_file_type(resource) {
                let group_id = self.physical_id(stack_id, name, &mut members)?;
                let nested_id = self.find_by_type(&group_id, &inner_type, depth + 1)?;
                let content = self.extract_stack(&nested_id, depth + 1)?;
                if let Some(inner) = resource
                    .get_mut("properties")
                    .and_then(|properties| properties.get_mut("resource"))
                    .and_then(Value::as_object_mut)
                {
                    inner.insert("content".into(), content);
                }
                resource.insert("id".into(), Value::String(group_id));
            }
        }

        Ok(template)
    }

    /// Physical id of resource `name` of `stack_id`, listing the stack's
    /// resources on first use.
    fn physical_id(
        &self,
        stack_id: &str,
        name: &str,
        members: &mut Option<Vec<StackResource>>,
    ) -> Result<String> {
        if members.is_none() {
            *members = Some(self.source.list_resources(stack_id)?);
        }
        members
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|member| member.resource_name == name && !member.physical_resource_id.is_empty())
            .map(|member| member.physical_resource_id.clone())
            .ok_or_else(|| ConveyorError::ResourceNotFound {
                name: format!("{name} in stack {stack_id}"),
            })
    }

    /// Searches the resource tree below `stack_id` for a stack deployed from
    /// `inner_type`.
    fn find_by_type(&self, stack_id: &str, inner_type: &str, depth: usize) -> Result<String> {
        self.check_depth(stack_id, depth)?;
        let members = self.source.list_resources(stack_id)?;

        if let Some(member) = members.iter().find(|member| {
            member.resource_type == inner_type && !member.physical_resource_id.is_empty()
        }) {
            return Ok(member.physical_resource_id.clone());
        }

        for member in members.iter().filter(|member| {
            !member.physical_resource_id.is_empty()
                && (is_file_reference(&member.resource_type)
                    || STACK_WRAPPERS.contains(&member.resource_type.as_str()))
        }) {
            match self.find_by_type(&member.physical_resource_id, inner_type, depth + 1) {
                Ok(found) => return Ok(found),
                Err(ConveyorError::ResourceNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(ConveyorError::ResourceNotFound {
            name: format!("{inner_type} under stack {stack_id}"),
        })
    }
}

fn resource_type(resource: &Map<String, Value>) -> Option<&str> {
    resource.get("type").and_then(Value::as_str)
}

/// File type of a group's `properties.resource`, if it is one.
fn indirect_file_type(resource: &Map<String, Value>) -> Option<String> {
    resource
        .get("properties")
        .and_then(|properties| properties.get("resource"))
        .and_then(|inner| inner.get("type"))
        .and_then(Value::as_str)
        .filter(|inner_type| is_file_reference(inner_type))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn source() -> InMemoryTemplateSource {
        InMemoryTemplateSource::from_json(json!({
            "root": {
                "template": {
                    "heat_template_version": "2015-10-15",
                    "resources": {
                        "web": {"type": "web.yaml", "properties": {"flavor": "m1.small"}},
                        "workers": {"type": "OS::Heat::AutoScalingGroup",
                                    "properties": {"min_size": 1,
                                                   "resource": {"type": "worker.yaml"}}},
                        "volume": {"type": "OS::Cinder::Volume", "properties": {"size": 1}}
                    }
                },
                "resources": [
                    {"resource_name": "web", "resource_type": "web.yaml",
                     "physical_resource_id": "stack-web"},
                    {"resource_name": "workers", "resource_type": "OS::Heat::AutoScalingGroup",
                     "physical_resource_id": "stack-asg"},
                    {"resource_name": "volume", "resource_type": "OS::Cinder::Volume",
                     "physical_resource_id": "vol-1"}
                ]
            },
            "stack-web": {
                "template": {"resources": {"server": {"type": "OS::Nova::Server"}}},
                "resources": [{"resource_name": "server", "resource_type": "OS::Nova::Server",
                               "physical_resource_id": "srv-1"}]
            },
            "stack-asg": {
                "template": {"resources": {"abc123": {"type": "worker.yaml"}}},
                "resources": [{"resource_name": "abc123", "resource_type": "worker.yaml",
                               "physical_resource_id": "stack-worker"}]
            },
            "stack-worker": {
                "template": {"resources": {"server": {"type": "OS::Nova::Server"}}},
                "resources": []
            }
        }))
        .expect("Failed to load stacks")
    }

    #[test]
    fn test_inlines_direct_and_indirect_nesting() {
        let source = source();
        let flattened = NestedTemplateExtractor::new(&source)
            .extract("root")
            .expect("Failed to extract");

        let web = &flattened["resources"]["web"];
        assert_eq!(web["id"], json!("stack-web"));
        assert_eq!(web["content"]["resources"]["server"]["type"], json!("OS::Nova::Server"));

        let workers = &flattened["resources"]["workers"];
        assert_eq!(workers["id"], json!("stack-asg"));
        assert_eq!(
            workers["properties"]["resource"]["content"]["resources"]["server"]["type"],
            json!("OS::Nova::Server")
        );

        assert!(flattened["resources"]["volume"].get("content").is_none());
    }

    #[test]
    fn test_missing_nested_stack_aborts() {
        let source = InMemoryTemplateSource::from_json(json!({
            "root": {
                "template": {"resources": {"web": {"type": "web.yaml"}}},
                "resources": []
            }
        }))
        .expect("Failed to load stacks");

        let err = NestedTemplateExtractor::new(&source)
            .extract("root")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_depth_limit() {
        // A stack that names itself as its own nested stack
        let source = InMemoryTemplateSource::from_json(json!({
            "loop": {
                "template": {"resources": {"again": {"type": "loop.yaml"}}},
                "resources": [{"resource_name": "again", "resource_type": "loop.yaml",
                               "physical_resource_id": "loop"}]
            }
        }))
        .expect("Failed to load stacks");

        let err = NestedTemplateExtractor::new(&source)
            .with_max_depth(3)
            .extract("loop")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_file_reference_detection() {
        assert!(is_file_reference("server.yaml"));
        assert!(is_file_reference("file:///tmp/lb.template"));
        assert!(is_file_reference("https://example.com/tpl"));
        assert!(!is_file_reference("OS::Nova::Server"));
        assert!(!is_file_reference("parameters.json"));
    }
}
