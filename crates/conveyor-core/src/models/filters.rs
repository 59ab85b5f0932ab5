//! Filter types for querying plans.

use jiff::Timestamp;

use super::{PlanStatus, PlanType};

/// Filter options for querying plans.
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Filter by lifecycle status
    pub status: Option<PlanStatus>,

    /// Filter by plan type
    pub plan_type: Option<PlanType>,

    /// Filter by owning project
    pub project_id: Option<String>,

    /// Only plans last modified before this instant
    pub updated_before: Option<Timestamp>,

    /// Include soft-deleted plans
    pub include_deleted: bool,
}

impl PlanFilter {
    /// Create a filter matching a single status.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use conveyor_core::models::{PlanFilter, PlanStatus};
    ///
    /// let filter = PlanFilter::with_status(PlanStatus::Available);
    /// assert_eq!(filter.status, Some(PlanStatus::Available));
    /// assert!(!filter.include_deleted);
    /// ```
    pub fn with_status(status: PlanStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl From<&crate::params::ListPlans> for PlanFilter {
    /// Convert ListPlans parameters to a PlanFilter for plan queries.
    fn from(params: &crate::params::ListPlans) -> Self {
        Self {
            status: params.status,
            plan_type: params.plan_type,
            project_id: params.project_id.clone(),
            updated_before: None,
            include_deleted: params.include_deleted,
        }
    }
}
