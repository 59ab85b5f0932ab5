//! Parameter structures for Conveyor operations
//!
//! This module contains the parameter structures passed to the
//! [`Planner`](crate::Planner) by every front end. They carry no
//! framework-specific derives: the CLI wraps them in its own clap argument
//! structs and converts with `From`.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │
//! │  (clap derives) │───▶│ (minimal deps)  │
//! └─────────────────┘    └─────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{PlanStatus, PlanType, ResourceMap};

/// Generic parameters for operations requiring just a plan ID.
///
/// Used for get_plan and delete_plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    /// The ID of the plan to operate on
    pub id: String,
}

/// Parameters for creating a plan from extracted resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePlan {
    /// Kind of replay the plan is built for
    #[serde(default)]
    pub plan_type: PlanType,
    /// Project owning the plan
    pub project_id: String,
    /// User requesting the plan
    pub user_id: String,
    /// Resources extracted from the source environment
    #[serde(default)]
    pub resources: ResourceMap,
}

/// Parameters for creating a plan from a Heat template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePlanFromTemplate {
    #[serde(default)]
    pub plan_type: PlanType,
    pub project_id: String,
    pub user_id: String,
    /// Template whose `resources` section becomes the plan resources
    pub template: Value,
}

/// Parameters for listing plans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPlans {
    /// Only plans in this status
    pub status: Option<PlanStatus>,
    /// Only plans of this type
    pub plan_type: Option<PlanType>,
    /// Only plans of this project
    pub project_id: Option<String>,
    /// Whether soft-deleted plans are listed too
    #[serde(default)]
    pub include_deleted: bool,
}

/// Parameters for updating plan metadata.
///
/// Every field left `None` keeps its current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlan {
    /// Plan ID to update (required)
    pub id: String,
    /// New lifecycle status, e.g. 'available' or 'finished'
    pub status: Option<String>,
    /// New free-text progress marker
    pub task_status: Option<String>,
    /// Executor handle of the replay
    pub stack_id: Option<String>,
}

impl UpdatePlan {
    /// Validate update parameters and return the parsed status.
    ///
    /// # Errors
    ///
    /// * `ConveyorError::InvalidInput` - When the status string is invalid
    /// * `ConveyorError::InvalidInput` - When nothing would change
    ///
    /// # Examples
    ///
    /// ```rust
    /// use conveyor_core::{models::PlanStatus, params::UpdatePlan};
    ///
    /// let params = UpdatePlan {
    ///     id: "3f1c".to_string(),
    ///     status: Some("available".to_string()),
    ///     ..Default::default()
    /// };
    /// assert_eq!(params.validate()?, Some(PlanStatus::Available));
    ///
    /// let params = UpdatePlan {
    ///     id: "3f1c".to_string(),
    ///     ..Default::default()
    /// };
    /// assert!(params.validate().is_err());
    /// # conveyor_core::Result::<()>::Ok(())
    /// ```
    pub fn validate(&self) -> crate::Result<Option<PlanStatus>> {
        if self.status.is_none() && self.task_status.is_none() && self.stack_id.is_none() {
            return Err(crate::ConveyorError::invalid_input("plan")
                .with_reason("at least one of status, task_status or stack_id is required"));
        }

        self.status
            .as_deref()
            .map(|status| {
                status.parse::<PlanStatus>().map_err(|_| {
                    crate::ConveyorError::invalid_input("status").with_reason(format!(
                        "Invalid status: {status}. Must be one of {}",
                        PlanStatus::ALL
                            .iter()
                            .map(PlanStatus::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })
            })
            .transpose()
    }
}

/// Parameters for applying a batch of resource update commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlanResources {
    pub id: String,
    /// JSON list of `{"action", "resource_id", ...}` command objects
    pub commands: Value,
}

/// Parameters for replacing the updated view from a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlanTemplate {
    pub id: String,
    pub template: Value,
}

/// Parameters for recomputing a cached dependency map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebuildDependencies {
    pub id: String,
    /// Rebuild the original view instead of the updated one
    #[serde(default)]
    pub original: bool,
}

/// Parameters for expiring idle plans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpirePlans {
    /// Available plans untouched for longer than this many seconds expire.
    /// Falls back to the planner's configured time to live.
    pub ttl_secs: Option<u64>,
}

/// Parameters for flattening a deployed stack template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractStack {
    pub stack_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConveyorError;

    #[test]
    fn test_update_plan_validate_status() {
        let params = UpdatePlan {
            id: "p".into(),
            status: Some("Finished".into()),
            ..Default::default()
        };
        assert_eq!(params.validate().expect("valid"), Some(PlanStatus::Finished));
    }

    #[test]
    fn test_update_plan_validate_task_status_only() {
        let params = UpdatePlan {
            id: "p".into(),
            task_status: Some("extracting".into()),
            ..Default::default()
        };
        assert_eq!(params.validate().expect("valid"), None);
    }

    #[test]
    fn test_update_plan_validate_invalid_status() {
        let params = UpdatePlan {
            id: "p".into(),
            status: Some("paused".into()),
            ..Default::default()
        };
        match params.validate().unwrap_err() {
            ConveyorError::InvalidInput { field, reason } => {
                assert_eq!(field, "status");
                assert!(reason.contains("Invalid status: paused"));
                assert!(reason.contains("expired"));
            }
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }
    }
}
