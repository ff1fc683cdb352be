//! Error types for the domain layer.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use super::CycleId;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,

    // Cycle guard errors
    CycleAlreadyActive,
    CycleClosed,

    // Completion errors
    DeadlineExceeded,
    CycleAbandoned,

    // State errors
    InvalidStateTransition,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::CycleAlreadyActive => "CYCLE_ALREADY_ACTIVE",
            ErrorCode::CycleClosed => "CYCLE_CLOSED",
            ErrorCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ErrorCode::CycleAbandoned => "CYCLE_ABANDONED",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
        };
        write!(f, "{}", s)
    }
}

/// Errors surfaced by the cleanup coordinator to its callers.
///
/// Subscriber failures never appear here; they are folded into the
/// cycle's [`FailureMask`](crate::domain::cleanup::FailureMask).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanupError {
    /// A cycle is already in flight. Requests are never queued.
    #[error("Cleanup cycle {cycle_id} is already running")]
    AlreadyActive { cycle_id: CycleId },

    /// The cycle finished before the operation could be applied.
    #[error("Cleanup cycle {cycle_id} is already closed")]
    CycleClosed { cycle_id: CycleId },

    /// The caller's deadline elapsed. The cycle itself keeps running.
    #[error("Cleanup cycle {cycle_id} did not finish within {deadline:?} ({outstanding} units outstanding)")]
    DeadlineExceeded {
        cycle_id: CycleId,
        deadline: Duration,
        outstanding: usize,
    },

    /// The completion callback was dropped without being invoked.
    #[error("Cleanup cycle {cycle_id} was abandoned before completion")]
    CycleAbandoned { cycle_id: CycleId },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CleanupError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CleanupError::AlreadyActive { .. } => ErrorCode::CycleAlreadyActive,
            CleanupError::CycleClosed { .. } => ErrorCode::CycleClosed,
            CleanupError::DeadlineExceeded { .. } => ErrorCode::DeadlineExceeded,
            CleanupError::CycleAbandoned { .. } => ErrorCode::CycleAbandoned,
            CleanupError::Validation(ValidationError::InvalidFormat { field, .. })
                if field == "state_transition" =>
            {
                ErrorCode::InvalidStateTransition
            }
            CleanupError::Validation(_) => ErrorCode::ValidationFailed,
        }
    }

    /// Returns true if this is the overlap error returned by the cycle guard.
    pub fn is_already_active(&self) -> bool {
        matches!(self, CleanupError::AlreadyActive { .. })
    }
}
