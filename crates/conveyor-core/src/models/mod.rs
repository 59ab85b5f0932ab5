//! Data models for plans and their resources.
//!
//! This module contains the core domain models of the Conveyor plan system.
//! Display implementations for these models are located in
//! [`crate::display::models`] to keep data structures and presentation apart.
//!
//! # Examples
//!
//! ```rust
//! use conveyor_core::models::{Plan, PlanStatus, PlanType, Resource, ResourceMap};
//!
//! let mut resources = ResourceMap::new();
//! resources.insert(
//!     "volume_0".to_string(),
//!     Resource::new("volume_0", "OS::Cinder::Volume").with_id("5b1d"),
//! );
//!
//! let plan = Plan::new(PlanType::Clone, "project", "user", resources);
//! assert_eq!(plan.plan_status, PlanStatus::Initiating);
//! assert_eq!(plan.updated_resources().len(), 1);
//! println!("{}", plan); // Markdown with metadata and a resource list
//! ```

pub mod filters;
pub mod plan;
pub mod resource;
pub mod status;
pub mod summary;
pub mod value;

pub use filters::PlanFilter;
pub use plan::Plan;
pub use resource::{align_names, DependencyMap, Properties, Resource, ResourceDependency, ResourceMap};
pub use status::{PlanStatus, PlanType};
pub use summary::PlanSummary;
pub use value::{PropertyValue, ATTRIBUTE_POINTER, RESOURCE_POINTER};
