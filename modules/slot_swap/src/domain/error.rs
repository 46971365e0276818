use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::SlotStatus;
use crate::domain::repo::StoreError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Slot not found: {id}")]
    SlotNotFound { id: Uuid },

    #[error("Swap request not found: {id}")]
    RequestNotFound { id: Uuid },

    #[error("User {actor} may not act on swap request {request_id}")]
    Forbidden { actor: Uuid, request_id: Uuid },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Slot {slot_id} is {status}, which does not allow this operation")]
    PreconditionFailed { slot_id: Uuid, status: SlotStatus },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn slot_not_found(id: Uuid) -> Self {
        Self::SlotNotFound { id }
    }

    pub fn request_not_found(id: Uuid) -> Self {
        Self::RequestNotFound { id }
    }

    pub fn forbidden(actor: Uuid, request_id: Uuid) -> Self {
        Self::Forbidden { actor, request_id }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn precondition_failed(slot_id: Uuid, status: SlotStatus) -> Self {
        Self::PreconditionFailed { slot_id, status }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Internal inconsistency. Logged at `error!` on construction.
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "invariant violation");
        Self::InvariantViolation { message }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<StoreError> for DomainError {
    /// Default mapping for owner-initiated writes: a stale read means someone
    /// else wrote first.
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id } => Self::slot_not_found(id),
            StoreError::StaleStatus { .. }
            | StoreError::OwnerChanged { .. }
            | StoreError::StaleVersion { .. }
            | StoreError::RequestResolved { .. } => Self::conflict(e.to_string()),
            StoreError::CompensationFailed { .. } => Self::invariant_violation(e.to_string()),
            StoreError::Backend(e) => Self::database(e.to_string()),
        }
    }
}
