//! Core library for the Conveyor clone and migration planner.
//!
//! A *plan* describes a set of cloud resources (servers, volumes, networks,
//! ports, floating IPs, ...) together with the dependency graph between
//! them, so that an orchestration engine can replay them elsewhere. This
//! crate owns everything between resource extraction and replay:
//!
//! - **Resource graph** ([`graph`]): finds `get_resource` / `get_attr`
//!   pointers inside property trees and derives per-resource dependency
//!   lists
//! - **Resource store** ([`store`]): the original and updated views of a
//!   plan, each with its cached dependencies
//! - **Update merging** ([`update`]): validates and applies batches of
//!   add/edit/delete commands, all or nothing
//! - **Nested templates** ([`extract`]): flattens stacks that embed other
//!   stacks into one self-contained template
//! - **Persistence** ([`db`]) and the async [`Planner`] facade on top of it
//!
//! # Display Architecture
//!
//! Domain models implement [`std::fmt::Display`] as markdown, and the
//! wrappers in [`display`] add context (creation results, change lists,
//! summaries). The CLI renders that markdown in the terminal.
//!
//! # Quick Start
//!
//! ```rust
//! use conveyor_core::{
//!     models::{PlanType, Resource, ResourceMap},
//!     params::{CreatePlan, ListPlans, UpdatePlanResources},
//!     PlannerBuilder,
//! };
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let planner = PlannerBuilder::new()
//!     .with_database_path(Some("test.db"))
//!     .build()
//!     .await?;
//!
//! let mut resources = ResourceMap::new();
//! resources.insert(
//!     "volume_0".to_string(),
//!     Resource::new("volume_0", "OS::Cinder::Volume").with_id("5e1c"),
//! );
//!
//! let plan = planner
//!     .create_plan(&CreatePlan {
//!         plan_type: PlanType::Clone,
//!         project_id: "demo".to_string(),
//!         user_id: "alice".to_string(),
//!         resources,
//!     })
//!     .await?;
//!
//! let result = planner
//!     .update_plan_resources(&UpdatePlanResources {
//!         id: plan.plan_id.clone(),
//!         commands: json!([{"action": "edit", "resource_id": "volume_0", "size": "20"}]),
//!     })
//!     .await?;
//! println!("{result}");
//!
//! for summary in &planner.list_plans_summary(&ListPlans::default()).await? {
//!     println!("Plan: {}", summary.plan_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod display;
pub mod error;
pub mod extract;
pub mod graph;
pub mod models;
pub mod params;
pub mod planner;
pub mod provider;
pub mod store;
pub mod template;
pub mod update;

// Re-export commonly used types
pub use db::Database;
pub use display::{
    CreateResult, DeleteResult, LocalDateTime, OperationStatus, PlanSummaries, PlanView,
    UpdateResult,
};
pub use error::{ConveyorError, ErrorKind, Result};
pub use extract::{InMemoryTemplateSource, NestedTemplateExtractor, TemplateSource};
pub use models::{
    Plan, PlanFilter, PlanStatus, PlanSummary, PlanType, PropertyValue, Resource,
    ResourceDependency,
};
pub use params::{
    CreatePlan, CreatePlanFromTemplate, ExpirePlans, ExtractStack, Id, ListPlans,
    RebuildDependencies, UpdatePlan, UpdatePlanResources, UpdatePlanTemplate,
};
pub use planner::{Planner, PlannerBuilder};
pub use provider::{ExtractedResource, InMemoryExtractor, ResourceExtractor};
pub use store::{PlanResources, View};
pub use update::{UpdateCommand, ValidatorRegistry};
