//! Error types for the conveyor library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::PlanStatus;

/// Coarse classification of a [`ConveyorError`].
///
/// Front ends translate these kinds into their own status codes (for an HTTP
/// layer: 404 / 400 / 409 / 502 / 500).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plan, resource or dependency missing
    NotFound,
    /// Malformed command, type mismatch, cardinality mismatch
    Validation,
    /// Plan status disallows the mutation, or a delete is blocked
    Conflict,
    /// A provider or template executor call failed
    ExternalFailure,
    /// Invariant violation or infrastructure failure
    Internal,
}

/// Comprehensive error type for all conveyor operations.
#[derive(Error, Debug)]
pub enum ConveyorError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Plan not found for the given ID
    #[error("Plan with ID {id} not found")]
    PlanNotFound { id: String },
    /// Resource not found in a plan view or a stack
    #[error("Resource '{name}' not found")]
    ResourceNotFound { name: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// A command of a resource update batch was rejected
    #[error("Plan resources update error in command {index}: {reason}")]
    PlanResourcesUpdateError { index: usize, reason: String },
    /// The plan's status does not allow resource updates
    #[error("Plan {id} cannot be updated while in status '{status}'")]
    PlanNotUpdatable { id: String, status: PlanStatus },
    /// The plan's status does not allow deletion
    #[error("Plan {id} cannot be deleted while in status '{status}'")]
    PlanNotDeletable { id: String, status: PlanStatus },
    /// Requested status change is not part of the plan lifecycle
    #[error("Plan {id} cannot move from '{from}' to '{to}'")]
    InvalidStatusTransition {
        id: String,
        from: PlanStatus,
        to: PlanStatus,
    },
    /// Deleting a resource that other resources still depend on
    #[error("Resource '{name}' is referenced by: {}", dependents.join(", "))]
    ResourceHasDependents {
        name: String,
        dependents: Vec<String>,
    },
    /// A provider client or template executor call failed
    #[error("External call failed: {message}")]
    External { message: String },
    /// Invariant violation, indicates a bug
    #[error("Internal error: {message}")]
    Internal { message: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> ConveyorError {
        ConveyorError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> ConveyorError {
        ConveyorError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl ConveyorError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Rejects command `index` of an update batch.
    pub fn update_rejected(index: usize, reason: impl Into<String>) -> Self {
        Self::PlanResourcesUpdateError {
            index,
            reason: reason.into(),
        }
    }

    /// Wraps a failed provider or executor call.
    pub fn external(message: impl fmt::Display) -> Self {
        Self::External {
            message: message.to_string(),
        }
    }

    /// Reports a broken invariant.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classifies the error for front ends.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlanNotFound { .. } | Self::ResourceNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. }
            | Self::PlanResourcesUpdateError { .. }
            | Self::Serialization { .. } => ErrorKind::Validation,
            Self::PlanNotUpdatable { .. }
            | Self::PlanNotDeletable { .. }
            | Self::InvalidStatusTransition { .. }
            | Self::ResourceHasDependents { .. } => ErrorKind::Conflict,
            Self::External { .. } => ErrorKind::ExternalFailure,
            Self::Internal { .. }
            | Self::Database { .. }
            | Self::FileSystem { .. }
            | Self::XdgDirectory(_)
            | Self::Configuration { .. } => ErrorKind::Internal,
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| ConveyorError::database(message).with_source(e))
    }
}

/// Maps a failed `spawn_blocking` join into a configuration error.
pub(crate) fn join_error(e: tokio::task::JoinError) -> ConveyorError {
    ConveyorError::Configuration {
        message: format!("Task join error: {e}"),
    }
}

/// Result type alias for conveyor operations
pub type Result<T> = std::result::Result<T, ConveyorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ConveyorError::PlanNotFound { id: "p".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ConveyorError::update_rejected(0, "bad").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ConveyorError::ResourceHasDependents {
                name: "volume_0".into(),
                dependents: vec!["server_0".into()],
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ConveyorError::external("timeout").kind(),
            ErrorKind::ExternalFailure
        );
        assert_eq!(ConveyorError::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_dependents_message() {
        let err = ConveyorError::ResourceHasDependents {
            name: "volume_0".into(),
            dependents: vec!["server_0".into(), "server_1".into()],
        };
        assert_eq!(
            err.to_string(),
            "Resource 'volume_0' is referenced by: server_0, server_1"
        );
    }
}
