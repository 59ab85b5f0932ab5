//! Provider-client boundary used when a plan adopts an external resource.
//!
//! Editing a floating IP or network by `id`, or adopting an existing
//! security group, key pair or volume type, needs the properties of that
//! provider object. Conveyor does not talk to providers itself; it asks a
//! [`ResourceExtractor`] to turn a provider id into plan resources.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{ConveyorError, Result},
    models::{align_names, Resource, ResourceMap},
};

/// Plan resources extracted for one provider object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractedResource {
    /// Name of the resource standing for the requested object
    pub name: String,
    /// That resource plus anything it references (subnets of a network, ...)
    pub resources: ResourceMap,
}

impl ExtractedResource {
    /// Splits off the resource standing for the requested object.
    ///
    /// Returns it together with the remaining resources, each named after
    /// its key. Fails when the extraction does not contain `name`.
    pub fn into_primary(self) -> Result<(Resource, ResourceMap)> {
        let Self {
            name,
            mut resources,
        } = self;
        align_names(&mut resources);
        let primary = resources.remove(&name).ok_or_else(|| {
            ConveyorError::external(format!("extraction did not return resource '{name}'"))
        })?;
        Ok((primary, resources))
    }
}

/// Fetches provider objects as plan resources.
///
/// Implementations perform blocking calls; a failure aborts the update batch
/// that triggered it.
pub trait ResourceExtractor: Send + Sync {
    /// Extracts the object of `resource_type` with provider id `provider_id`.
    fn extract(&self, resource_type: &str, provider_id: &str) -> Result<ExtractedResource>;
}

#[derive(Deserialize)]
struct ExtractorEntry {
    resource_type: String,
    id: String,
    name: String,
    resources: ResourceMap,
}

/// Extractor answering from a fixed set of provider objects.
///
/// Backs offline use of the CLI and the test-suite.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExtractor {
    entries: HashMap<(String, String), ExtractedResource>,
}

impl InMemoryExtractor {
    /// Creates an extractor that knows no objects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the answer for one provider object.
    pub fn with(
        mut self,
        resource_type: impl Into<String>,
        provider_id: impl Into<String>,
        extracted: ExtractedResource,
    ) -> Self {
        self.entries
            .insert((resource_type.into(), provider_id.into()), extracted);
        self
    }

    /// Loads objects from a JSON list of
    /// `{"resource_type", "id", "name", "resources"}` entries.
    pub fn from_json(doc: Value) -> Result<Self> {
        let entries: Vec<ExtractorEntry> = serde_json::from_value(doc)?;
        Ok(entries.into_iter().fold(Self::new(), |extractor, entry| {
            extractor.with(
                entry.resource_type,
                entry.id,
                ExtractedResource {
                    name: entry.name,
                    resources: entry.resources,
                },
            )
        }))
    }
}

impl ResourceExtractor for InMemoryExtractor {
    fn extract(&self, resource_type: &str, provider_id: &str) -> Result<ExtractedResource> {
        self.entries
            .get(&(resource_type.to_string(), provider_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                ConveyorError::external(format!(
                    "provider has no {resource_type} with id {provider_id}"
                ))
            })
    }
}
