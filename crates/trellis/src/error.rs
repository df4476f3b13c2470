//! Error types for trellis operations.

use crate::domain::{DependencyType, IssueId, IssueStatus, Transition};
use crate::id_generation::IdGenerationError;
use std::io;
use thiserror::Error;

/// The error type for trellis operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced issue does not exist.
    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    /// No edge of the requested kind exists between the two issues.
    #[error("Dependency not found: {from} -> {to}")]
    DependencyNotFound {
        /// Edge source
        from: IssueId,
        /// Edge target
        to: IssueId,
    },

    /// Adding the edge would close a cycle.
    #[error("Adding {dep_type} edge {from} -> {to} would create a cycle")]
    CycleRejected {
        /// Edge source
        from: IssueId,
        /// Edge target
        to: IssueId,
        /// Edge type whose subgraph would become cyclic
        dep_type: DependencyType,
    },

    /// The parent/child pair breaks the hierarchy rules.
    #[error("Hierarchy violation ({child} under {parent}): {detail}")]
    HierarchyViolation {
        /// Would-be parent
        parent: IssueId,
        /// Would-be child
        child: IssueId,
        /// What rule was broken
        detail: String,
    },

    /// Field-level validation failed.
    #[error("Validation failed: {}", errors.join("; "))]
    ValidationFailed {
        /// Every problem found
        errors: Vec<String>,
    },

    /// The status transition is not allowed from the current status.
    #[error("Cannot {transition} issue {issue_id} while it is {status}")]
    PreconditionFailed {
        /// Issue being transitioned
        issue_id: IssueId,
        /// Its current status
        status: IssueStatus,
        /// Requested transition
        transition: Transition,
    },

    /// The issue still has children.
    #[error("Cannot delete {issue_id}: it has {count} child issue(s)")]
    HasChildren {
        /// Issue being deleted
        issue_id: IssueId,
        /// Number of children
        count: usize,
    },

    /// Other issues depend on the issue.
    #[error("Cannot delete {issue_id}: depended on by {}", dependents.iter().map(IssueId::as_str).collect::<Vec<_>>().join(", "))]
    HasDependents {
        /// Issue being deleted
        issue_id: IssueId,
        /// Issues with `blocks` or `related` edges into it
        dependents: Vec<IssueId>,
    },

    /// Priority outside `0..=4`.
    #[error("Invalid priority {0}: must be between 0 and 4")]
    InvalidPriority(u8),

    /// Malformed input that is not tied to a single field (bad document, bad argument).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No unique id could be generated.
    #[error("ID generation failed: {0}")]
    IdGeneration(#[from] IdGenerationError),
}

/// Coarse classification of [`Error`], stable across variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown issue or edge
    NotFound,
    /// Edge would close a cycle
    CycleRejected,
    /// Hierarchy rules broken
    HierarchyViolation,
    /// Field-level validation failed
    ValidationFailed,
    /// Transition not allowed from the current status
    PreconditionFailed,
    /// Operation refused because of existing relationships
    Conflict,
    /// Malformed input or configuration
    Invalid,
    /// Backend or IO failure
    Storage,
}

impl Error {
    /// Classification used by callers that branch on the failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IssueNotFound(_) | Error::DependencyNotFound { .. } => ErrorKind::NotFound,
            Error::CycleRejected { .. } => ErrorKind::CycleRejected,
            Error::HierarchyViolation { .. } => ErrorKind::HierarchyViolation,
            Error::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Error::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            Error::HasChildren { .. } | Error::HasDependents { .. } => ErrorKind::Conflict,
            Error::InvalidPriority(_) | Error::InvalidInput(_) | Error::Config(_) => {
                ErrorKind::Invalid
            }
            Error::Storage(_) | Error::Io(_) | Error::Json(_) | Error::IdGeneration(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// Single-message validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Error::ValidationFailed {
            errors: vec![message.into()],
        }
    }
}

/// A specialized Result type for trellis operations.
pub type Result<T> = std::result::Result<T, Error>;
