//! Unified error handling for Teamjoin Core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Error payload as reported to the caller.
///
/// Some failures carry a single message (`"Participant not found"`), others a
/// list of field-level complaints (`["Status is not included in the list"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    Message(String),
    List(Vec<String>),
}

impl ErrorPayload {
    pub fn message(msg: impl Into<String>) -> Self {
        ErrorPayload::Message(msg.into())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        ErrorPayload::List(items.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPayload::Message(msg) => f.write_str(msg),
            ErrorPayload::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Field-level validation failures
    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// A precondition entity could not be resolved
    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    /// The store refused to save or destroy a record
    #[error("Persistence rejected: {0}")]
    PersistenceRejected(ErrorPayload),

    #[error("Invalid role hierarchy: {0}")]
    InvalidRoleHierarchy(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a single-message validation failure
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(vec![msg.into()])
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: ErrorPayload,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorPayload::Message(msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorPayload::Message(msg)),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorPayload::Message(msg)),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorPayload::Message(msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorPayload::Message(msg)),
            AppError::Validation(items) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorPayload::List(items))
            }
            AppError::DependencyMissing(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorPayload::Message(msg))
            }
            AppError::PersistenceRejected(payload) => (StatusCode::UNPROCESSABLE_ENTITY, payload),
            AppError::InvalidRoleHierarchy(msg) => {
                tracing::error!("Invalid role hierarchy: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorPayload::message("Role hierarchy is misconfigured"),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorPayload::message("A database error occurred"),
                )
            }
            AppError::Jwt(e) => {
                tracing::error!("JWT error: {:?}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorPayload::message("Invalid or expired token"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorPayload::message("An internal error occurred"),
                )
            }
        };

        (status, Json(ErrorResponse { errors })).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}
