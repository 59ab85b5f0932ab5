//! Plan operations for the Planner.

use jiff::Timestamp;
use log::info;
use serde_json::Value;
use tokio::task;

use super::Planner;
use crate::{
    db::Database,
    display::UpdateResult,
    error::{join_error, ConveyorError, Result},
    extract::NestedTemplateExtractor,
    models::{Plan, PlanFilter, PlanStatus},
    params::{
        CreatePlan, CreatePlanFromTemplate, ExpirePlans, ExtractStack, Id, RebuildDependencies,
        UpdatePlan, UpdatePlanResources, UpdatePlanTemplate,
    },
    store::View,
    template::resources_from_template,
    update::{apply_updates, UpdateCommand, UpdateContext},
};

/// Loads plan `id` or fails with `PlanNotFound`.
fn load_plan(db: &Database, id: &str) -> Result<Plan> {
    db.get_plan(id)?
        .ok_or_else(|| ConveyorError::PlanNotFound { id: id.to_string() })
}

fn ensure_updatable(plan: &Plan) -> Result<()> {
    if plan.plan_status.is_updatable() {
        Ok(())
    } else {
        Err(ConveyorError::PlanNotUpdatable {
            id: plan.plan_id.clone(),
            status: plan.plan_status,
        })
    }
}

impl Planner {
    /// Runs `op` on a fresh connection off the async runtime.
    async fn with_database<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            op(&mut db)
        })
        .await
        .map_err(join_error)?
    }

    /// Loads plan `id` under its lock and runs `modify` on it. `modify` is
    /// responsible for writing its changes back.
    ///
    /// Loading and writing share one write transaction, which also
    /// serializes planners of other processes using the same database.
    async fn modify_plan<T, M>(&self, id: &str, modify: M) -> Result<T>
    where
        T: Send + 'static,
        M: FnOnce(&mut Database, Plan) -> Result<T> + Send + 'static,
    {
        let _guard = self.locks.acquire(id).await;
        let id = id.to_string();
        self.with_database(move |db| {
            db.write_transaction(|db| {
                let plan = load_plan(db, &id)?;
                modify(db, plan)
            })
        })
        .await
    }

    /// Creates a plan in `initiating` status from extracted resources.
    pub async fn create_plan(&self, params: &CreatePlan) -> Result<Plan> {
        let plan = Plan::new(
            params.plan_type,
            params.project_id.clone(),
            params.user_id.clone(),
            params.resources.clone(),
        );

        let plan = self
            .with_database(move |db| {
                db.create_plan(&plan)?;
                Ok(plan)
            })
            .await?;
        info!(
            "Created {} plan {} with {} resources",
            plan.plan_type.as_str(),
            plan.plan_id,
            plan.updated_resources().len()
        );
        Ok(plan)
    }

    /// Creates a plan whose resources come from a Heat template.
    pub async fn create_plan_from_template(&self, params: &CreatePlanFromTemplate) -> Result<Plan> {
        let resources = resources_from_template(&params.template)?;
        self.create_plan(&CreatePlan {
            plan_type: params.plan_type,
            project_id: params.project_id.clone(),
            user_id: params.user_id.clone(),
            resources,
        })
        .await
    }

    /// Retrieves a plan by its ID.
    pub async fn get_plan(&self, params: &Id) -> Result<Option<Plan>> {
        let id = params.id.clone();
        self.with_database(move |db| db.get_plan(&id)).await
    }

    /// Lists all plans with optional filtering.
    pub async fn list_plans(&self, filter: Option<PlanFilter>) -> Result<Vec<Plan>> {
        self.with_database(move |db| db.list_plans(filter.as_ref()))
            .await
    }

    /// Changes status, task status or stack id of a plan.
    ///
    /// Status changes must follow the plan lifecycle.
    pub async fn update_plan(&self, params: &UpdatePlan) -> Result<UpdateResult<Plan>> {
        let status = params.validate()?;
        let task_status = params.task_status.clone();
        let stack_id = params.stack_id.clone();

        self.modify_plan(&params.id, move |db, mut plan| {
            let mut changes = Vec::new();

            if let Some(status) = status {
                if !plan.plan_status.can_transition_to(status) {
                    return Err(ConveyorError::InvalidStatusTransition {
                        id: plan.plan_id,
                        from: plan.plan_status,
                        to: status,
                    });
                }
                if status != plan.plan_status {
                    changes.push(format!(
                        "Changed status from {} to {}",
                        plan.plan_status.as_str(),
                        status.as_str()
                    ));
                    plan.plan_status = status;
                }
            }
            if let Some(task_status) = task_status {
                changes.push(format!("Set task status to '{task_status}'"));
                plan.task_status = task_status;
            }
            if let Some(stack_id) = stack_id {
                changes.push(format!("Set stack id to {stack_id}"));
                plan.stack_id = Some(stack_id);
            }

            plan.touch();
            db.update_plan_fields(&plan)?;
            info!("Updated plan {}", plan.plan_id);
            Ok(UpdateResult::with_changes(plan, changes))
        })
        .await
    }

    /// Applies a batch of update commands to the updated view, all or
    /// nothing.
    ///
    /// The plan status is checked before the batch is parsed.
    pub async fn update_plan_resources(
        &self,
        params: &UpdatePlanResources,
    ) -> Result<UpdateResult<Plan>> {
        let payload = params.commands.clone();
        let registry = self.registry.clone();
        let extractor = self.extractor.clone();

        self.modify_plan(&params.id, move |db, mut plan| {
            ensure_updatable(&plan)?;
            let commands = UpdateCommand::parse_batch(&payload)?;

            let mut context = UpdateContext::new(&registry);
            if let Some(extractor) = extractor.as_deref() {
                context = context.with_extractor(extractor);
            }
            let changes = apply_updates(&mut plan, &commands, &context)?;

            db.save_plan_resources(&plan)?;
            Ok(UpdateResult::with_changes(plan, changes))
        })
        .await
    }

    /// Replaces the updated view with the resources of a template.
    pub async fn update_plan_from_template(
        &self,
        params: &UpdatePlanTemplate,
    ) -> Result<UpdateResult<Plan>> {
        let template = params.template.clone();

        self.modify_plan(&params.id, move |db, mut plan| {
            ensure_updatable(&plan)?;
            let resources = resources_from_template(&template)?;
            let count = resources.len();

            plan.resources.replace_view(View::Updated, resources)?;
            plan.touch();
            db.save_plan_resources(&plan)?;
            info!("Replaced updated view of plan {} from template", plan.plan_id);
            Ok(UpdateResult::with_changes(
                plan,
                vec![format!("Replaced updated resources with {count} resources from template")],
            ))
        })
        .await
    }

    /// Recomputes the cached dependencies of one view.
    pub async fn rebuild_plan_dependencies(
        &self,
        params: &RebuildDependencies,
    ) -> Result<UpdateResult<Plan>> {
        let view = View::from_original(params.original);

        self.modify_plan(&params.id, move |db, mut plan| {
            plan.resources.rebuild_dependencies(view);
            plan.touch();
            db.save_plan_resources(&plan)?;
            Ok(UpdateResult::with_changes(
                plan,
                vec![format!("Rebuilt dependencies of the {view} view")],
            ))
        })
        .await
    }

    /// Soft-deletes a plan. Returns `None` when the plan does not exist.
    pub async fn delete_plan(&self, params: &Id) -> Result<Option<Plan>> {
        let id = params.id.clone();
        let _guard = self.locks.acquire(&id).await;

        self.with_database(move |db| {
            db.write_transaction(|db| {
                let Some(mut plan) = db.get_plan(&id)? else {
                    return Ok(None);
                };
                if !plan.plan_status.is_deletable() {
                    return Err(ConveyorError::PlanNotDeletable {
                        id: plan.plan_id,
                        status: plan.plan_status,
                    });
                }

                let now = Timestamp::now();
                db.soft_delete_plan(&plan.plan_id, now)?;
                plan.deleted = true;
                plan.deleted_at = Some(now);
                plan.updated_at = now;
                info!("Deleted plan {}", plan.plan_id);
                Ok(Some(plan))
            })
        })
        .await
    }

    /// Moves available plans that stayed untouched longer than the time to
    /// live to `expired`. Returns the ids of the expired plans.
    pub async fn expire_plans(&self, params: &ExpirePlans) -> Result<Vec<String>> {
        let ttl = params
            .ttl_secs
            .map(std::time::Duration::from_secs)
            .unwrap_or(self.plan_ttl);
        let cutoff = Timestamp::now().checked_sub(ttl).map_err(|e| {
            ConveyorError::invalid_input("ttl_secs").with_reason(e.to_string())
        })?;

        let candidates = self
            .list_plans(Some(PlanFilter {
                status: Some(PlanStatus::Available),
                updated_before: Some(cutoff),
                ..Default::default()
            }))
            .await?;

        let mut expired = Vec::new();
        for candidate in candidates {
            let changed = self
                .modify_plan(&candidate.plan_id, move |db, mut plan| {
                    // Re-check under the lock, the plan may have moved on
                    if plan.plan_status != PlanStatus::Available || plan.updated_at >= cutoff {
                        return Ok(false);
                    }
                    plan.plan_status = PlanStatus::Expired;
                    plan.touch();
                    db.update_plan_fields(&plan)?;
                    Ok(true)
                })
                .await;

            match changed {
                Ok(true) => expired.push(candidate.plan_id),
                Ok(false) | Err(ConveyorError::PlanNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if !expired.is_empty() {
            info!("Expired {} plans", expired.len());
        }
        Ok(expired)
    }

    /// Flattens the template of a deployed stack, inlining nested stacks.
    pub async fn extract_stack(&self, params: &ExtractStack) -> Result<Value> {
        let source = self
            .template_source
            .clone()
            .ok_or_else(|| ConveyorError::Configuration {
                message: "no template source configured".to_string(),
            })?;
        let stack_id = params.stack_id.clone();
        let max_depth = self.max_nesting_depth;

        task::spawn_blocking(move || {
            NestedTemplateExtractor::new(source.as_ref())
                .with_max_depth(max_depth)
                .extract(&stack_id)
        })
        .await
        .map_err(join_error)?
    }
}
