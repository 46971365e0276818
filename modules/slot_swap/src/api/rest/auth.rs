//! Caller identity.
//!
//! Authentication happens upstream; the authenticated user id arrives in the
//! `x-user-id` header and is trusted as-is.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

use crate::api::rest::problem::{Problem, ProblemResponse};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Id of the user on whose behalf the request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized(parts.uri.path(), "Missing user identity"))?;
        Uuid::parse_str(raw.trim())
            .map(AuthUser)
            .map_err(|_| unauthorized(parts.uri.path(), "Malformed user identity"))
    }
}

fn unauthorized(instance: &str, detail: &str) -> ProblemResponse {
    Problem::new(StatusCode::UNAUTHORIZED, "Unauthorized", detail)
        .with_code("UNAUTHORIZED")
        .with_instance(instance)
        .into()
}
