//! Builds dependency maps from resource maps.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::debug;

use super::resolver::collect_references;
use crate::{
    error::{ConveyorError, Result},
    models::{DependencyMap, ResourceDependency, ResourceMap},
};

/// Computes the dependency record of every resource in `resources`.
///
/// Each record lists the resources its properties point at, deduplicated
/// while keeping the position of the first occurrence. Runs in time linear in
/// the total size of the property trees and is idempotent.
pub fn build_dependencies(resources: &ResourceMap) -> DependencyMap {
    let dependencies: DependencyMap = resources
        .iter()
        .map(|(name, resource)| {
            let mut found = Vec::new();
            for value in resource.properties.values() {
                collect_references(value, resources, &mut found);
            }
            let record = ResourceDependency::for_resource(name, resource, first_seen(found));
            (name.clone(), record)
        })
        .collect();

    debug!("Built dependencies for {} resources", dependencies.len());
    dependencies
}

fn first_seen(found: Vec<&str>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(found.len());
    found
        .into_iter()
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Names of the resources, other than `name` itself, that depend on `name`.
pub fn dependents_of(name: &str, dependencies: &DependencyMap) -> Vec<String> {
    dependencies
        .iter()
        .filter(|(other, record)| {
            other.as_str() != name && record.dependencies.iter().any(|dep| dep == name)
        })
        .map(|(other, _)| other.clone())
        .collect()
}

/// Orders the resources so every resource comes after its dependencies.
///
/// Ties are broken by name, so the order is stable for a given map. Fails
/// with an internal error when the map contains a cycle.
pub fn dependency_order(dependencies: &DependencyMap) -> Result<Vec<String>> {
    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, record) in dependencies {
        let mut count = 0;
        for dep in &record.dependencies {
            if dep != name && dependencies.contains_key(dep) {
                count += 1;
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }
        pending.insert(name.as_str(), count);
    }

    let mut ready: BTreeSet<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut order = Vec::with_capacity(dependencies.len());

    while let Some(name) = ready.pop_first() {
        order.push(name.to_string());
        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() != dependencies.len() {
        let stuck: Vec<&str> = pending
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(name, _)| *name)
            .collect();
        return Err(ConveyorError::internal(format!(
            "dependency cycle between: {}",
            stuck.join(", ")
        )));
    }

    Ok(order)
}
