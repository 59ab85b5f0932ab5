//! Template executor boundary used by the nested-template extractor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConveyorError, Result};

/// One entry of a stack's resource list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackResource {
    /// Logical name of the resource in the stack template
    pub resource_name: String,
    /// Type tag, a file reference for nested stacks
    pub resource_type: String,
    /// Provider handle, the stack id for nested stacks
    #[serde(default)]
    pub physical_resource_id: String,
}

/// Read access to deployed stacks.
pub trait TemplateSource: Send + Sync {
    /// Template the stack was deployed from.
    fn get_template(&self, stack_id: &str) -> Result<Value>;

    /// Resources of the stack as deployed.
    fn list_resources(&self, stack_id: &str) -> Result<Vec<StackResource>>;
}

#[derive(Debug, Clone, Deserialize)]
struct StoredStack {
    template: Value,
    #[serde(default)]
    resources: Vec<StackResource>,
}

/// Serves stacks from a JSON document of the form
/// `{"<stack id>": {"template": {...}, "resources": [...]}}`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateSource {
    stacks: HashMap<String, StoredStack>,
}

impl InMemoryTemplateSource {
    pub fn from_json(doc: Value) -> Result<Self> {
        let stacks = serde_json::from_value(doc)?;
        Ok(Self { stacks })
    }

    fn stack(&self, stack_id: &str) -> Result<&StoredStack> {
        self.stacks
            .get(stack_id)
            .ok_or_else(|| ConveyorError::ResourceNotFound {
                name: format!("stack {stack_id}"),
            })
    }
}

impl TemplateSource for InMemoryTemplateSource {
    fn get_template(&self, stack_id: &str) -> Result<Value> {
        Ok(self.stack(stack_id)?.template.clone())
    }

    fn list_resources(&self, stack_id: &str) -> Result<Vec<StackResource>> {
        Ok(self.stack(stack_id)?.resources.clone())
    }
}
