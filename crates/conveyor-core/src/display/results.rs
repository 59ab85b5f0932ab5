//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use crate::models::Plan;

/// Outcome of a create operation: a confirmation line followed by the
/// created plan.
#[derive(Debug)]
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created plan with ID: {}", self.resource.plan_id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Outcome of an update operation, listing what changed.
///
/// # Examples
///
/// ```rust
/// use conveyor_core::{
///     display::UpdateResult,
///     models::{Plan, PlanType, ResourceMap},
/// };
///
/// let plan = Plan::new(PlanType::Clone, "project", "user", ResourceMap::new());
/// let changes = vec![
///     "added `qos-01`".to_string(),
///     "deleted `volume_3`".to_string(),
/// ];
///
/// let output = UpdateResult::with_changes(plan, changes).to_string();
/// assert!(output.contains("- deleted `volume_3`"));
/// ```
#[derive(Debug)]
pub struct UpdateResult<T> {
    pub resource: T,
    pub changes: Vec<String>,
}

impl<T> UpdateResult<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            changes: Vec::new(),
        }
    }

    /// Create an UpdateResult with a list of changes made.
    pub fn with_changes(resource: T, changes: Vec<String>) -> Self {
        Self { resource, changes }
    }
}

impl fmt::Display for UpdateResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated plan with ID: {}", self.resource.plan_id)?;

        if !self.changes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Changes made:")?;
            for change in &self.changes {
                writeln!(f, "- {change}")?;
            }
        }

        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Outcome of a delete operation, showing what was deleted.
#[derive(Debug)]
pub struct DeleteResult<T> {
    pub resource: T,
}

impl<T> DeleteResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for DeleteResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deleted plan with ID: {}", self.resource.plan_id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}
