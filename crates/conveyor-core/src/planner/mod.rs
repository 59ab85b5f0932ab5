//! High-level planner API for managing plans.
//!
//! The [`Planner`] is the single entry point front ends use. It owns the
//! database location, the collaborators consulted while updating plans and a
//! lock per plan id.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │    Handlers     │    │   Operations    │    │    Database     │
//! │ (plan_handlers) │───▶│   (plan_ops)    │───▶│   (via db/)     │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//!   Display wrappers     Locking, validation     Data Persistence
//! ```
//!
//! Every operation opens its own connection inside
//! [`tokio::task::spawn_blocking`]. Operations that modify a plan first take
//! that plan's lock, then load, change and store it.
//!
//! # Usage
//!
//! ```rust
//! use conveyor_core::{
//!     models::{PlanType, Resource, ResourceMap},
//!     params::{CreatePlan, UpdatePlanResources},
//!     PlannerBuilder,
//! };
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let planner = PlannerBuilder::new()
//!     .with_database_path(Some("/tmp/conveyor.db"))
//!     .build()
//!     .await?;
//!
//! let mut resources = ResourceMap::new();
//! resources.insert(
//!     "volume_0".to_string(),
//!     Resource::new("volume_0", "OS::Cinder::Volume"),
//! );
//! let plan = planner
//!     .create_plan(&CreatePlan {
//!         plan_type: PlanType::Clone,
//!         project_id: "demo".to_string(),
//!         user_id: "admin".to_string(),
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
//! # Ok(())
//! # }
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

pub mod builder;
mod locks;
pub mod plan_handlers;
pub mod plan_ops;


pub use builder::PlannerBuilder;
use locks::PlanLocks;

use crate::{extract::TemplateSource, provider::ResourceExtractor, update::ValidatorRegistry};

/// Main planner interface for managing plans.
#[derive(Clone)]
pub struct Planner {
    pub(crate) db_path: PathBuf,
    pub(crate) registry: Arc<ValidatorRegistry>,
    pub(crate) extractor: Option<Arc<dyn ResourceExtractor>>,
    pub(crate) template_source: Option<Arc<dyn TemplateSource>>,
    pub(crate) max_nesting_depth: usize,
    pub(crate) plan_ttl: Duration,
    pub(crate) locks: PlanLocks,
}

impl Planner {
    /// Location of the plan database.
    pub fn database_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// How long an available plan may stay untouched before it expires.
    pub fn plan_ttl(&self) -> Duration {
        self.plan_ttl
    }
}
