//! The two parallel resource views held by a plan.
//!
//! A plan keeps the resources as extracted from the source environment (the
//! *original* view, frozen at creation) next to a mutable copy that will be
//! replayed (the *updated* view). Each view caches its dependency map, and
//! [`PlanResources`] is the only way to change either: every mutation
//! recomputes the cache and swaps resources and dependencies together.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConveyorError, Result},
    graph::build_dependencies,
    models::{align_names, DependencyMap, ResourceMap},
};

/// Selects one of the two resource views of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Snapshot of the source environment
    Original,
    /// Mutable replay target
    #[default]
    Updated,
}

impl View {
    /// Maps an `is_original` flag onto a view.
    pub fn from_original(is_original: bool) -> Self {
        if is_original {
            View::Original
        } else {
            View::Updated
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Original => write!(f, "original"),
            View::Updated => write!(f, "updated"),
        }
    }
}

/// Resources and dependencies of one view.
#[derive(Debug, Clone, PartialEq, Default)]
struct ViewState {
    resources: ResourceMap,
    dependencies: DependencyMap,
}

impl ViewState {
    fn build(mut resources: ResourceMap) -> Self {
        align_names(&mut resources);
        let dependencies = build_dependencies(&resources);
        Self {
            resources,
            dependencies,
        }
    }
}

/// Resource store of a plan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "StoredResources", into = "StoredResources")]
pub struct PlanResources {
    original: ViewState,
    updated: ViewState,
}

impl PlanResources {
    /// Creates both views from the extracted resources.
    pub fn new(resources: ResourceMap) -> Self {
        let original = ViewState::build(resources);
        let updated = original.clone();
        Self { original, updated }
    }

    /// Reassembles a store from persisted maps without recomputing anything.
    pub(crate) fn from_parts(
        original_resources: ResourceMap,
        original_dependencies: DependencyMap,
        updated_resources: ResourceMap,
        updated_dependencies: DependencyMap,
    ) -> Self {
        Self {
            original: ViewState {
                resources: original_resources,
                dependencies: original_dependencies,
            },
            updated: ViewState {
                resources: updated_resources,
                dependencies: updated_dependencies,
            },
        }
    }

    fn state(&self, view: View) -> &ViewState {
        match view {
            View::Original => &self.original,
            View::Updated => &self.updated,
        }
    }

    /// Read-only access to one view.
    pub fn get_view(&self, view: View) -> (&ResourceMap, &DependencyMap) {
        let state = self.state(view);
        (&state.resources, &state.dependencies)
    }

    /// Resources of one view.
    pub fn resources(&self, view: View) -> &ResourceMap {
        &self.state(view).resources
    }

    /// Dependencies of one view.
    pub fn dependencies(&self, view: View) -> &DependencyMap {
        &self.state(view).dependencies
    }

    /// Replaces the resources of a view and recomputes its dependencies.
    ///
    /// The original view is frozen once the plan exists; replacing it is
    /// refused.
    pub fn replace_view(&mut self, view: View, resources: ResourceMap) -> Result<()> {
        if view == View::Original {
            return Err(ConveyorError::internal(
                "the original view of a plan cannot be replaced",
            ));
        }
        let state = ViewState::build(resources);
        debug!("Replacing {view} view with {} resources", state.resources.len());
        self.updated = state;
        Ok(())
    }

    /// Recomputes the dependencies of a view from its current resources.
    pub fn rebuild_dependencies(&mut self, view: View) {
        let state = match view {
            View::Original => &mut self.original,
            View::Updated => &mut self.updated,
        };
        state.dependencies = build_dependencies(&state.resources);
        debug!("Rebuilt dependencies of {view} view");
    }

    /// Verifies that both dependency caches match their resources.
    pub fn check_consistency(&self) -> Result<()> {
        for view in [View::Original, View::Updated] {
            let state = self.state(view);
            if build_dependencies(&state.resources) != state.dependencies {
                return Err(ConveyorError::internal(format!(
                    "{view} dependencies diverged from {view} resources"
                )));
            }
        }
        Ok(())
    }

    /// Splits the store into its persisted form.
    pub fn into_parts(self) -> StoredResources {
        self.into()
    }
}

/// Flat persisted form of [`PlanResources`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredResources {
    #[serde(default)]
    pub original_resources: ResourceMap,
    #[serde(default)]
    pub original_dependencies: DependencyMap,
    #[serde(default)]
    pub updated_resources: ResourceMap,
    #[serde(default)]
    pub updated_dependencies: DependencyMap,
}

impl From<StoredResources> for PlanResources {
    fn from(stored: StoredResources) -> Self {
        PlanResources::from_parts(
            stored.original_resources,
            stored.original_dependencies,
            stored.updated_resources,
            stored.updated_dependencies,
        )
    }
}

impl From<PlanResources> for StoredResources {
    fn from(resources: PlanResources) -> Self {
        StoredResources {
            original_resources: resources.original.resources,
            original_dependencies: resources.original.dependencies,
            updated_resources: resources.updated.resources,
            updated_dependencies: resources.updated.dependencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyValue, Resource};

    fn sample() -> ResourceMap {
        let mut resources = ResourceMap::new();
        resources.insert("volume_0".into(), Resource::new("volume_0", "OS::Cinder::Volume"));
        resources.insert(
            "server_0".into(),
            Resource::new("server_0", "OS::Nova::Server")
                .with_property("block_device", PropertyValue::ResourceRef("volume_0".into())),
        );
        resources
    }

    #[test]
    fn test_new_populates_both_views() {
        let store = PlanResources::new(sample());
        assert_eq!(store.get_view(View::Original), store.get_view(View::Updated));
        assert_eq!(
            store.dependencies(View::Updated)["server_0"].dependencies,
            vec!["volume_0"]
        );
        store.check_consistency().expect("fresh store must be consistent");
    }

    #[test]
    fn test_replace_updated_view_leaves_original() {
        let mut store = PlanResources::new(sample());
        let mut resources = sample();
        resources.remove("server_0");

        store
            .replace_view(View::Updated, resources)
            .expect("Failed to replace view");

        assert_eq!(store.resources(View::Updated).len(), 1);
        assert_eq!(store.dependencies(View::Updated).len(), 1);
        assert_eq!(store.resources(View::Original).len(), 2);
        store.check_consistency().expect("store must stay consistent");
    }

    #[test]
    fn test_original_view_is_frozen() {
        let mut store = PlanResources::new(sample());
        assert!(store.replace_view(View::Original, ResourceMap::new()).is_err());
        assert_eq!(store.resources(View::Original).len(), 2);
    }

    #[test]
    fn test_rebuild_refreshes_stale_cache() {
        let resources = sample();
        let mut store =
            PlanResources::from_parts(resources.clone(), DependencyMap::new(), resources, DependencyMap::new());
        assert!(store.check_consistency().is_err());

        store.rebuild_dependencies(View::Original);
        store.rebuild_dependencies(View::Updated);
        store.check_consistency().expect("rebuilt store must be consistent");
    }

    #[test]
    fn test_resource_names_follow_keys() {
        let mut resources = sample();
        resources.insert("volume_1".into(), Resource::new("data_volume", "OS::Cinder::Volume"));
        let mut store = PlanResources::new(resources.clone());
        assert_eq!(store.resources(View::Original)["volume_1"].name, "volume_1");
        assert_eq!(
            store.dependencies(View::Original)["volume_1"].name_in_template,
            "volume_1"
        );

        resources.insert("volume_2".into(), Resource::new("scratch", "OS::Cinder::Volume"));
        store
            .replace_view(View::Updated, resources)
            .expect("Failed to replace view");
        assert_eq!(store.resources(View::Updated)["volume_2"].name, "volume_2");
    }

    #[test]
    fn test_persisted_form() {
        let store = PlanResources::new(sample());
        let doc = serde_json::to_value(&store).expect("Failed to encode");
        assert!(doc.get("original_resources").is_some());
        assert!(doc.get("updated_dependencies").is_some());

        let decoded: PlanResources = serde_json::from_value(doc).expect("Failed to decode");
        assert_eq!(decoded, store);
    }
}
