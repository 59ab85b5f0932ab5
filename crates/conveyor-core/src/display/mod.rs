//! Display formatting for plans and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! the wrappers in this module add the context an operation needs, such as
//! "which view" or "what changed". Everything renders as markdown so the CLI
//! can pass it through its terminal renderer unchanged.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Format Functions│    │   Formatted     │
//! │ (Plan, Summary) │───▶│ & Result Types  │───▶│    Output       │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`collections`]: [`PlanSummaries`]
//! - [`results`]: [`CreateResult`], [`UpdateResult`], [`DeleteResult`]
//! - [`status`]: [`OperationStatus`]
//! - [`datetime`]: [`LocalDateTime`]
//! - [`models`]: model implementations and [`PlanView`]
//!
//! ```rust
//! use conveyor_core::{
//!     display::{CreateResult, UpdateResult},
//!     models::{Plan, PlanType, ResourceMap},
//! };
//!
//! let plan = Plan::new(PlanType::Clone, "project", "user", ResourceMap::new());
//!
//! let output = CreateResult::new(plan.clone()).to_string();
//! assert!(output.contains(&plan.plan_id));
//!
//! let changes = vec!["added `qos-01`".to_string()];
//! let output = UpdateResult::with_changes(plan, changes).to_string();
//! assert!(output.contains("Changes made:"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::PlanSummaries;
pub use datetime::LocalDateTime;
pub use models::PlanView;
pub use results::{CreateResult, DeleteResult, UpdateResult};
pub use status::OperationStatus;
