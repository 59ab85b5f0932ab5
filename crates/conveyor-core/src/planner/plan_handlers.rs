//! Plan handler operations that return formatted wrapper types for the Planner.

use super::Planner;
use crate::{
    display::{CreateResult, DeleteResult, OperationStatus, PlanSummaries},
    error::Result,
    models::{Plan, PlanFilter, PlanSummary},
    params::{CreatePlan, CreatePlanFromTemplate, ExpirePlans, Id, ListPlans},
};

impl Planner {
    /// Handle listing plans as summaries.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use conveyor_core::{models::PlanStatus, params::ListPlans, PlannerBuilder};
    /// # async {
    /// let planner = PlannerBuilder::new().build().await?;
    /// let params = ListPlans {
    ///     status: Some(PlanStatus::Available),
    ///     ..Default::default()
    /// };
    /// let summaries = planner.list_plans_summary(&params).await?;
    /// # Result::<(), conveyor_core::ConveyorError>::Ok(())
    /// # };
    /// ```
    pub async fn list_plans_summary(&self, params: &ListPlans) -> Result<PlanSummaries> {
        let plans = self.list_plans(Some(PlanFilter::from(params))).await?;
        let summaries: Vec<PlanSummary> = plans.iter().map(Into::into).collect();
        Ok(PlanSummaries(summaries))
    }

    /// Handle creating a plan from extracted resources.
    pub async fn create_plan_result(&self, params: &CreatePlan) -> Result<CreateResult<Plan>> {
        self.create_plan(params).await.map(CreateResult::new)
    }

    /// Handle creating a plan from a template.
    pub async fn create_plan_from_template_result(
        &self,
        params: &CreatePlanFromTemplate,
    ) -> Result<CreateResult<Plan>> {
        self.create_plan_from_template(params)
            .await
            .map(CreateResult::new)
    }

    /// Handle deleting a plan, returning the deleted plan for confirmation or
    /// `None` when it does not exist.
    pub async fn delete_plan_result(
        &self,
        params: &Id,
    ) -> Result<Option<DeleteResult<Plan>>> {
        Ok(self.delete_plan(params).await?.map(DeleteResult::new))
    }

    /// Handle expiring idle plans.
    pub async fn expire_plans_result(&self, params: &ExpirePlans) -> Result<OperationStatus> {
        let expired = self.expire_plans(params).await?;
        let message = if expired.is_empty() {
            "No plans expired".to_string()
        } else {
            format!("Expired {} plans: {}", expired.len(), expired.join(", "))
        };
        Ok(OperationStatus::success(message))
    }
}
