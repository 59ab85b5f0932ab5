//! Display implementations for domain models.
//!
//! Kept apart from the model definitions so data and presentation evolve
//! separately. All output is markdown.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    graph::dependency_order,
    models::{Plan, PlanStatus, PlanSummary, PlanType},
    store::View,
};

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A plan rendered with the resources of one of its views.
///
/// `Display` for [`Plan`] shows the updated view. Resources are listed so
/// that each comes after the resources it depends on.
pub struct PlanView<'a> {
    pub plan: &'a Plan,
    pub view: View,
}

impl<'a> PlanView<'a> {
    pub fn new(plan: &'a Plan, view: View) -> Self {
        Self { plan, view }
    }

    fn fmt_metadata(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        writeln!(f, "# Plan {}", plan.plan_id)?;
        writeln!(f)?;
        writeln!(f, "- Type: {}", plan.plan_type)?;
        writeln!(f, "- Status: {}", plan.plan_status)?;
        writeln!(f, "- Project: {}", plan.project_id)?;
        writeln!(f, "- User: {}", plan.user_id)?;
        if !plan.task_status.is_empty() {
            writeln!(f, "- Task status: {}", plan.task_status)?;
        }
        if let Some(stack_id) = &plan.stack_id {
            writeln!(f, "- Stack: {stack_id}")?;
        }
        writeln!(f, "- Created: {}", LocalDateTime(&plan.created_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&plan.updated_at))?;
        if let Some(deleted_at) = &plan.deleted_at {
            writeln!(f, "- Deleted: {}", LocalDateTime(deleted_at))?;
        }
        Ok(())
    }

    fn fmt_resources(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (resources, dependencies) = self.plan.resources.get_view(self.view);
        if resources.is_empty() {
            return writeln!(f, "\nNo resources in the {} view.", self.view);
        }

        writeln!(f, "\n## Resources ({} view)", self.view)?;
        writeln!(f)?;
        writeln!(f, "| Name | Type | ID | Depends on |")?;
        writeln!(f, "|------|------|----|------------|")?;
        // Replay order, or name order when the cache is stale or cyclic
        let names = dependency_order(dependencies)
            .ok()
            .filter(|order| order.len() == resources.len())
            .unwrap_or_else(|| resources.keys().cloned().collect());
        for name in &names {
            let Some(resource) = resources.get(name) else {
                continue;
            };
            let depends_on = dependencies
                .get(name)
                .map(|record| record.dependencies.join(", "))
                .unwrap_or_default();
            let id = if resource.id.is_empty() { "-" } else { resource.id.as_str() };
            writeln!(
                f,
                "| {name} | {} | {id} | {} |",
                resource.resource_type,
                if depends_on.is_empty() { "-" } else { depends_on.as_str() }
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_metadata(f)?;
        self.fmt_resources(f)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&PlanView::new(self, View::Updated), f)
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "- **{}** ({}, {}) project {}: {} resources ({} originally), updated {}",
            self.plan_id,
            self.plan_type,
            self.plan_status,
            self.project_id,
            self.updated_resources,
            self.original_resources,
            LocalDateTime(&self.updated_at)
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::ResourceMap;

    fn plan() -> Plan {
        let resources: ResourceMap = serde_json::from_value(json!({
            "volume_0": {"name": "volume_0", "type": "OS::Cinder::Volume", "id": "v-1"},
            "server_0": {"name": "server_0", "type": "OS::Nova::Server",
                         "properties": {"block_device": {"get_resource": "volume_0"}}}
        }))
        .expect("Failed to decode resources");
        Plan::new(PlanType::Clone, "project", "user", resources)
    }

    #[test]
    fn test_plan_display() {
        let plan = plan();
        let output = plan.to_string();

        assert!(output.starts_with(&format!("# Plan {}", plan.plan_id)));
        assert!(output.contains("- Status: initiating"));
        assert!(output.contains("## Resources (updated view)"));
        assert!(output.contains("| server_0 | OS::Nova::Server | - | volume_0 |"));
        assert!(output.contains("| volume_0 | OS::Cinder::Volume | v-1 | - |"));
    }

    #[test]
    fn test_resources_listed_in_replay_order() {
        let output = plan().to_string();
        let volume = output.find("| volume_0 |").expect("volume row missing");
        let server = output.find("| server_0 |").expect("server row missing");
        assert!(volume < server);
    }

    #[test]
    fn test_empty_view() {
        let plan = Plan::new(PlanType::Migrate, "project", "user", ResourceMap::new());
        let output = PlanView::new(&plan, View::Original).to_string();
        assert!(output.contains("No resources in the original view."));
    }

    #[test]
    fn test_summary_display() {
        let plan = plan();
        let output = PlanSummary::from(&plan).to_string();
        assert!(output.contains("(clone, initiating)"));
        assert!(output.contains("2 resources (2 originally)"));
    }
}
