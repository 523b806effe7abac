//! Mapping of core errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use lostfound_core::error::{AllocatorError, FieldError};
use lostfound_core::{LostFoundError, NotFoundError, ValidationError};

/// Error returned by every handler
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] LostFoundError),

    /// Path or header the router could not make sense of
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Core(err.into())
    }
}

impl From<NotFoundError> for ApiError {
    fn from(err: NotFoundError) -> Self {
        ApiError::Core(err.into())
    }
}

/// JSON body of an error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Core(err) => match err {
                LostFoundError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
                LostFoundError::InvalidTransition(_) => {
                    (StatusCode::CONFLICT, "invalid_transition")
                }
                LostFoundError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                LostFoundError::DuplicateIdentifier(_) => {
                    (StatusCode::CONFLICT, "duplicate_identifier")
                }
                LostFoundError::Allocator(AllocatorError::SequenceExhausted { .. }) => {
                    (StatusCode::CONFLICT, "sequence_exhausted")
                }
                LostFoundError::Allocator(AllocatorError::InvalidYear(_)) => {
                    (StatusCode::BAD_REQUEST, "invalid_year")
                }
                LostFoundError::Persistence(_) | LostFoundError::Config(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let fields = match &self {
            ApiError::Core(LostFoundError::Validation(v)) => v.errors.clone(),
            _ => Vec::new(),
        };
        let body = ErrorBody {
            error: kind,
            message: self.to_string(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}
