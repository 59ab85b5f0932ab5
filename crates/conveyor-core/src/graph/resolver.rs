//! Finds resource pointers inside a property tree.

use crate::models::{PropertyValue, ResourceMap, ATTRIBUTE_POINTER, RESOURCE_POINTER};

/// Returns the names of the resources of `view` that `value` points at, in
/// traversal order. Duplicates are kept; pointers to resources missing from
/// `view` are skipped.
pub fn find_references(value: &PropertyValue, view: &ResourceMap) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(value, view, &mut found);
    found.into_iter().map(str::to_string).collect()
}

/// Appends the resource names `value` points at to `found`.
///
/// Lets callers accumulate the pointers of many trees into one buffer
/// without intermediate allocations.
pub fn collect_references<'a>(value: &'a PropertyValue, view: &ResourceMap, found: &mut Vec<&'a str>) {
    walk(value, &|name| view.contains_key(name), found);
}

/// Names of every resource `value` points at, whether or not it exists.
pub fn pointer_targets(value: &PropertyValue) -> Vec<&str> {
    let mut found = Vec::new();
    walk(value, &|_| true, &mut found);
    found
}

fn walk<'a>(value: &'a PropertyValue, accept: &dyn Fn(&str) -> bool, found: &mut Vec<&'a str>) {
    match value {
        PropertyValue::ResourceRef(name) | PropertyValue::AttrRef { resource: name, .. } => {
            if accept(name.as_str()) {
                found.push(name);
            }
        }
        PropertyValue::Map(entries) => {
            // A lone pointer key whose payload has the wrong shape is a broken
            // pointer, not a container
            if entries.len() == 1
                && entries
                    .keys()
                    .any(|key| key == RESOURCE_POINTER || key == ATTRIBUTE_POINTER)
            {
                return;
            }
            for entry in entries.values() {
                walk(entry, accept, found);
            }
        }
        PropertyValue::Seq(items) => {
            for item in items {
                walk(item, accept, found);
            }
        }
        PropertyValue::Null
        | PropertyValue::Bool(_)
        | PropertyValue::Number(_)
        | PropertyValue::String(_) => {}
    }
}
