use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.example.com/{}", code))
        .with_code(code)
        .with_instance(instance);

    // Attach the current span id so the response can be matched to logs
    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::SlotNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "SLOT_NOT_FOUND",
            "Slot not found",
            format!("Slot with id {} was not found", id),
            instance,
        ),
        DomainError::RequestNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "SWAP_REQUEST_NOT_FOUND",
            "Swap request not found",
            format!("Swap request with id {} was not found", id),
            instance,
        ),
        DomainError::Forbidden { .. } => from_parts(
            StatusCode::FORBIDDEN,
            "SWAP_FORBIDDEN",
            "Forbidden",
            "Only the receiver of a swap request may respond to it",
            instance,
        ),
        DomainError::InvalidOperation { message } => from_parts(
            StatusCode::BAD_REQUEST,
            "SWAP_INVALID_OPERATION",
            "Invalid operation",
            message.clone(),
            instance,
        ),
        DomainError::Validation { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "SLOT_VALIDATION",
            "Validation error",
            format!("{}", e),
            instance,
        ),
        DomainError::PreconditionFailed { .. } => from_parts(
            StatusCode::CONFLICT,
            "SLOT_PRECONDITION_FAILED",
            "Slot not available",
            format!("{}", e),
            instance,
        ),
        DomainError::Conflict { .. } => from_parts(
            StatusCode::CONFLICT,
            "SLOT_CONFLICT",
            "Concurrent modification",
            "The slot was modified concurrently; reload and retry",
            instance,
        ),
        DomainError::InvariantViolation { .. } => {
            tracing::error!(error = ?e, "Invariant violation reached the API");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_INVARIANT",
                "Internal error",
                "An internal consistency error occurred",
                instance,
            )
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}
