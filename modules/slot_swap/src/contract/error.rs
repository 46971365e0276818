use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotSwapError {
    #[error("Not found: {id}")]
    NotFound { id: Uuid },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Precondition failed: {message}")]
    PreconditionFailed { message: String },

    /// Lost a race against a concurrent operation; the caller may retry.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}

impl SlotSwapError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<crate::domain::error::DomainError> for SlotSwapError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            SlotNotFound { id } | RequestNotFound { id } => Self::not_found(id),
            e @ Forbidden { .. } => Self::forbidden(e.to_string()),
            InvalidOperation { message } => Self::invalid_operation(message),
            e @ PreconditionFailed { .. } => Self::precondition_failed(e.to_string()),
            Conflict { message } => Self::conflict(message),
            Validation { field, message } => Self::validation(format!("{}: {}", field, message)),
            InvariantViolation { .. } | Database { .. } => Self::internal(),
        }
    }
}
