//! Plan summary types and functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Plan, PlanStatus, PlanType};
use crate::store::View;

/// Summary information about a plan with resource statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Plan ID
    pub plan_id: String,
    /// Kind of replay
    pub plan_type: PlanType,
    /// Lifecycle status
    pub plan_status: PlanStatus,
    /// Owning project
    pub project_id: String,
    /// Free-text progress marker
    pub task_status: String,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Last update timestamp
    pub updated_at: Timestamp,
    /// Number of resources in the original view
    pub original_resources: usize,
    /// Number of resources in the updated view
    pub updated_resources: usize,
}

impl From<&Plan> for PlanSummary {
    fn from(plan: &Plan) -> Self {
        Self {
            plan_id: plan.plan_id.clone(),
            plan_type: plan.plan_type,
            plan_status: plan.plan_status,
            project_id: plan.project_id.clone(),
            task_status: plan.task_status.clone(),
            created_at: plan.created_at,
            updated_at: plan.updated_at,
            original_resources: plan.resources.resources(View::Original).len(),
            updated_resources: plan.resources.resources(View::Updated).len(),
        }
    }
}
