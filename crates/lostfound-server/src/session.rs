//! Session keys for saved screen criteria
//!
//! Callers identify themselves with the `x-session-id` header. A request
//! without one gets a fresh UUID, which is echoed back so the caller can
//! keep using it.

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use lostfound_core::SessionId;

use crate::error::ApiError;

pub const SESSION_HEADER: &str = "x-session-id";

/// Make sure every request carries a session id and every response echoes it
pub async fn ensure_session(mut request: Request, next: Next) -> Response {
    let existing = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string);

    let session = match existing {
        Some(id) => id,
        None => {
            let minted = Uuid::new_v4().to_string();
            tracing::debug!(session = %minted, "minted session id");
            minted
        }
    };

    let value = HeaderValue::from_str(&session).ok();
    if let Some(value) = &value {
        request.headers_mut().insert(SESSION_HEADER, value.clone());
    }

    let mut response = next.run(request).await;
    if let Some(value) = value {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// Extractor for the caller's session id
#[derive(Debug, Clone)]
pub struct Session(pub SessionId);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(|v| Session(SessionId::new(v)))
            .ok_or_else(|| ApiError::BadRequest(format!("missing {} header", SESSION_HEADER)))
    }
}
