//! Plan model definition and related functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{PlanStatus, PlanType, ResourceMap};
use crate::store::{PlanResources, View};

/// A portable description of a set of cloud resources and their dependency
/// graph, replayed to clone or migrate those resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Unique identifier for the plan
    pub plan_id: String,

    /// Kind of replay (clone or migrate)
    pub plan_type: PlanType,

    /// Project owning the plan
    pub project_id: String,

    /// User who requested the plan
    pub user_id: String,

    /// Lifecycle status
    #[serde(default)]
    pub plan_status: PlanStatus,

    /// Free-text progress marker
    #[serde(default)]
    pub task_status: String,

    /// Executor handle once replay has started
    #[serde(default)]
    pub stack_id: Option<String>,

    /// Timestamp when the plan was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the plan was last modified (UTC)
    pub updated_at: Timestamp,

    /// Timestamp of the soft delete, if any
    #[serde(default)]
    pub deleted_at: Option<Timestamp>,

    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,

    /// Original and updated resource views
    #[serde(flatten)]
    pub resources: PlanResources,
}

impl Plan {
    /// Creates a plan in `initiating` status from freshly extracted
    /// resources.
    pub fn new(
        plan_type: PlanType,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        resources: ResourceMap,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            plan_id: uuid::Uuid::new_v4().to_string(),
            plan_type,
            project_id: project_id.into(),
            user_id: user_id.into(),
            plan_status: PlanStatus::Initiating,
            task_status: String::new(),
            stack_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted: false,
            resources: PlanResources::new(resources),
        }
    }

    /// Resources of the updated view.
    pub fn updated_resources(&self) -> &ResourceMap {
        self.resources.resources(View::Updated)
    }

    /// Resources of the original view.
    pub fn original_resources(&self) -> &ResourceMap {
        self.resources.resources(View::Original)
    }

    /// Marks the plan as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
