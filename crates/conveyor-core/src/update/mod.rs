//! Validation and merging of resource update batches.
//!
//! Clients change the updated view of a plan by sending a batch of
//! [`UpdateCommand`]s. [`apply_updates`] checks the plan status, validates
//! every command against a working copy using the per-type rules of a
//! [`ValidatorRegistry`], and commits the result in one step.

pub mod command;
pub mod merger;
pub mod schema;
pub mod validators;

pub use command::UpdateCommand;
pub use merger::{apply_updates, UpdateContext, WorkingSet};
pub use schema::{FieldKind, FieldSchema};
pub use validators::{
    GenericValidator, PortValidator, ReplacingValidator, ResourceValidator,
    SecurityGroupValidator, ValidatorRegistry,
};
