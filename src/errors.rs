//! Error types for lifecycle operations
//!
//! The taxonomy distinguishes four families the caller treats differently:
//! not-found (never retried), authorization failures, business-rule
//! conflicts (retryable only after user action), and storage failures
//! (whole-operation retry is safe since nothing was committed). Deadline
//! expiry is its own terminal kind: it signals "will never succeed", not
//! "retry later".

use thiserror::Error;

/// Errors that can occur in lifecycle operations
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Entity not found
    ///
    /// Also returned when visibility is denied, so that the existence of a
    /// resource the actor cannot view is never leaked.
    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound {
        /// Type of entity that wasn't found
        entity_type: String,
        /// ID that was searched for
        id: String,
    },

    /// Actor lacks a required capability
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        /// What the actor was not allowed to do
        reason: String,
    },

    /// Status change not reachable from the current state
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// The relevant deadline has passed; the action will never succeed
    #[error("Deadline expired for {restriction}")]
    DeadlineExpired {
        /// The restriction kind whose deadline has passed
        restriction: String,
    },

    /// The project roster has reached its team size
    #[error("Team is full for project {project_id}")]
    TeamFull {
        /// The project whose capacity is exhausted
        project_id: String,
    },

    /// The actor is already a member of a project within the assignment
    #[error("Already assigned to a project in assignment {assignment_id}")]
    AlreadyAssigned {
        /// The assignment within which membership is unique
        assignment_id: String,
    },

    /// The application has not been approved
    #[error("Application {application_id} is not approved")]
    NotApproved {
        /// The application that was expected to be approved
        application_id: String,
    },

    /// The actor is not the product owner of the project
    #[error("Not the product owner of project {project_id}")]
    NotOwnerOfProject {
        /// The project whose ownership was required
        project_id: String,
    },

    /// Applications are only accepted against published projects
    #[error("Project {project_id} is not published")]
    ProjectNotPublished {
        /// The project that is not published
        project_id: String,
    },

    /// The applicant already applied to this project
    #[error("Duplicate application for project {project_id}")]
    DuplicateApplication {
        /// The project already applied to
        project_id: String,
    },

    /// Optimistic version check failed
    #[error("Concurrency conflict: expected version {expected}, but found {actual}")]
    ConcurrencyConflict {
        /// Expected version
        expected: u64,
        /// Actual version
        actual: u64,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage failure; the transaction was aborted with no partial writes
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for lifecycle operations
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Build an [`DomainError::EntityNotFound`] for a typed entity
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        DomainError::EntityNotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Build an [`DomainError::Unauthorized`] with a reason
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        DomainError::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::EntityNotFound { .. })
    }

    /// Check if this is a business-rule conflict
    ///
    /// Conflicts are client errors that may succeed after user action, but
    /// must not be retried automatically with the same input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::TeamFull { .. }
                | DomainError::AlreadyAssigned { .. }
                | DomainError::NotApproved { .. }
                | DomainError::DuplicateApplication { .. }
        )
    }

    /// Check if this failure is terminal (retry will never succeed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, DomainError::DeadlineExpired { .. })
    }

    /// Check if the whole operation is safe to retry as-is
    ///
    /// True only for storage and version-check failures, where nothing was
    /// committed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::Storage(_) | DomainError::ConcurrencyConflict { .. }
        )
    }
}
