//! Plan CRUD operations and queries.

use jiff::Timestamp;
use rusqlite::{params, types::Type, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use crate::{
    error::{ConveyorError, DatabaseResultExt, Result},
    models::{Plan, PlanFilter, PlanStatus, PlanType},
    store::{PlanResources, StoredResources},
};

const PLAN_COLUMNS: &str = "plan_id, plan_type, project_id, user_id, plan_status, task_status, \
     stack_id, original_resources, original_dependencies, updated_resources, \
     updated_dependencies, created_at, updated_at, deleted_at, deleted";

const INSERT_PLAN_SQL: &str = "INSERT INTO plans (plan_id, plan_type, project_id, user_id, \
     plan_status, task_status, stack_id, original_resources, original_dependencies, \
     updated_resources, updated_dependencies, created_at, updated_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";
const UPDATE_PLAN_FIELDS_SQL: &str = "UPDATE plans SET plan_status = ?1, task_status = ?2, \
     stack_id = ?3, updated_at = ?4 WHERE plan_id = ?5 AND deleted = 0";
const UPDATE_PLAN_RESOURCES_SQL: &str = "UPDATE plans SET original_dependencies = ?1, \
     updated_resources = ?2, updated_dependencies = ?3, updated_at = ?4 \
     WHERE plan_id = ?5 AND deleted = 0";
const SOFT_DELETE_PLAN_SQL: &str =
    "UPDATE plans SET deleted = 1, deleted_at = ?1, updated_at = ?1 WHERE plan_id = ?2 AND deleted = 0";

fn conversion_error(
    index: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
}

fn invalid_data(index: usize, message: String) -> rusqlite::Error {
    conversion_error(
        index,
        std::io::Error::new(std::io::ErrorKind::InvalidData, message),
    )
}

/// Fixed nanosecond precision keeps stored timestamps ordered as text.
fn stored_timestamp(ts: &Timestamp) -> String {
    format!("{ts:.9}")
}

fn timestamp(row: &Row<'_>, index: usize) -> rusqlite::Result<Timestamp> {
    row.get::<_, String>(index)?
        .parse::<Timestamp>()
        .map_err(|e| conversion_error(index, e))
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
    let text: String = row.get(index)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(index, e))
}

fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<Plan> {
    let plan_type: String = row.get(1)?;
    let plan_type = plan_type.parse::<PlanType>().map_err(|e| invalid_data(1, e))?;
    let plan_status: String = row.get(4)?;
    let plan_status = plan_status
        .parse::<PlanStatus>()
        .map_err(|e| invalid_data(4, e))?;
    let deleted_at = row
        .get::<_, Option<String>>(13)?
        .map(|text| text.parse::<Timestamp>().map_err(|e| conversion_error(13, e)))
        .transpose()?;

    let stored = StoredResources {
        original_resources: json_column(row, 7)?,
        original_dependencies: json_column(row, 8)?,
        updated_resources: json_column(row, 9)?,
        updated_dependencies: json_column(row, 10)?,
    };

    Ok(Plan {
        plan_id: row.get(0)?,
        plan_type,
        project_id: row.get(2)?,
        user_id: row.get(3)?,
        plan_status,
        task_status: row.get(5)?,
        stack_id: row.get(6)?,
        created_at: timestamp(row, 11)?,
        updated_at: timestamp(row, 12)?,
        deleted_at,
        deleted: row.get(14)?,
        resources: PlanResources::from(stored),
    })
}

impl super::Database {
    /// Stores a new plan together with both resource views.
    pub fn create_plan(&mut self, plan: &Plan) -> Result<()> {
        let stored = plan.resources.clone().into_parts();
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(
            INSERT_PLAN_SQL,
            params![
                &plan.plan_id,
                plan.plan_type.as_str(),
                &plan.project_id,
                &plan.user_id,
                plan.plan_status.as_str(),
                &plan.task_status,
                plan.stack_id.as_deref(),
                serde_json::to_string(&stored.original_resources)?,
                serde_json::to_string(&stored.original_dependencies)?,
                serde_json::to_string(&stored.updated_resources)?,
                serde_json::to_string(&stored.updated_dependencies)?,
                stored_timestamp(&plan.created_at),
                stored_timestamp(&plan.updated_at),
            ],
        )
        .db_context("Failed to insert plan")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Retrieves a plan by its ID. Soft-deleted plans are not returned.
    pub fn get_plan(&self, id: &str) -> Result<Option<Plan>> {
        let query = format!("SELECT {PLAN_COLUMNS} FROM plans WHERE plan_id = ?1 AND deleted = 0");
        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        stmt.query_row(params![id], plan_from_row)
            .optional()
            .db_context("Failed to fetch plan")
    }

    /// Lists plans with optional filtering, newest first.
    pub fn list_plans(&self, filter: Option<&PlanFilter>) -> Result<Vec<Plan>> {
        let mut query = format!("SELECT {PLAN_COLUMNS} FROM plans");

        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if !filter.is_some_and(|f| f.include_deleted) {
            conditions.push("deleted = 0");
        }

        if let Some(f) = filter {
            if let Some(status) = f.status {
                conditions.push("plan_status = ?");
                params_vec.push(Box::new(status.as_str().to_string()));
            }

            if let Some(plan_type) = f.plan_type {
                conditions.push("plan_type = ?");
                params_vec.push(Box::new(plan_type.as_str().to_string()));
            }

            if let Some(ref project_id) = f.project_id {
                conditions.push("project_id = ?");
                params_vec.push(Box::new(project_id.clone()));
            }

            if let Some(ref before) = f.updated_before {
                conditions.push("updated_at < ?");
                params_vec.push(Box::new(stored_timestamp(before)));
            }
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(" ORDER BY created_at DESC, plan_id");

        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| &**b).collect();

        let plans = stmt
            .query_map(&params_refs[..], plan_from_row)
            .db_context("Failed to query plans")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch plans")?;

        Ok(plans)
    }

    /// Writes the status, task status and stack id of a plan.
    pub fn update_plan_fields(&mut self, plan: &Plan) -> Result<()> {
        let rows = self
            .connection
            .execute(
                UPDATE_PLAN_FIELDS_SQL,
                params![
                    plan.plan_status.as_str(),
                    &plan.task_status,
                    plan.stack_id.as_deref(),
                    stored_timestamp(&plan.updated_at),
                    &plan.plan_id,
                ],
            )
            .db_context("Failed to update plan")?;

        if rows == 0 {
            return Err(ConveyorError::PlanNotFound {
                id: plan.plan_id.clone(),
            });
        }
        Ok(())
    }

    /// Writes the updated view of a plan.
    ///
    /// Original resources are never rewritten; only their dependency cache
    /// is, so a rebuilt original view persists. The store must be
    /// consistent: a dependency cache that diverged from its resources is
    /// refused.
    pub fn save_plan_resources(&mut self, plan: &Plan) -> Result<()> {
        plan.resources.check_consistency()?;
        let stored = plan.resources.clone().into_parts();

        let rows = self
            .connection
            .execute(
                UPDATE_PLAN_RESOURCES_SQL,
                params![
                    serde_json::to_string(&stored.original_dependencies)?,
                    serde_json::to_string(&stored.updated_resources)?,
                    serde_json::to_string(&stored.updated_dependencies)?,
                    stored_timestamp(&plan.updated_at),
                    &plan.plan_id,
                ],
            )
            .db_context("Failed to update plan resources")?;

        if rows == 0 {
            return Err(ConveyorError::PlanNotFound {
                id: plan.plan_id.clone(),
            });
        }
        Ok(())
    }

    /// Marks a plan deleted. The row is kept.
    pub fn soft_delete_plan(&mut self, id: &str, at: Timestamp) -> Result<()> {
        let rows = self
            .connection
            .execute(SOFT_DELETE_PLAN_SQL, params![stored_timestamp(&at), id])
            .db_context("Failed to delete plan")?;

        if rows == 0 {
            return Err(ConveyorError::PlanNotFound { id: id.to_string() });
        }
        Ok(())
    }
}
