//! Resource reference resolution and dependency graph construction.
//!
//! Resources of a plan view point at each other through
//! [`PropertyValue::ResourceRef`](crate::models::PropertyValue::ResourceRef)
//! and [`PropertyValue::AttrRef`](crate::models::PropertyValue::AttrRef)
//! values nested anywhere in their properties. [`resolver`] finds those
//! pointers in one property tree, [`builder`] turns a whole view into its
//! dependency map.
//!
//! Both halves are pure and never fail: pointers to names missing from the
//! view are ignored, because extraction routinely works on partial resource
//! sets.

pub mod builder;
pub mod resolver;

pub use builder::{build_dependencies, dependency_order, dependents_of};
pub use resolver::{collect_references, find_references, pointer_targets};
