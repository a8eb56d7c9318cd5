//! Bearer JWT authentication and caller resolution
//!
//! `AuthUser` is an axum extractor: it verifies the access token, loads the
//! user named by `sub`, and resolves the user's role through the hierarchy.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};

use crate::domain::UserId;
use crate::error::{AppError, ErrorPayload, ErrorResponse};
use crate::policy::UNAUTHORIZED_MESSAGE;
use crate::state::HasServices;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: UserId,
    /// Role name, always present in the hierarchy
    pub role: String,
}

#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Invalid Authorization header format
    InvalidHeader(String),
    /// Token validation failed, or its subject is unknown
    InvalidToken(String),
    TokenExpired,
    /// The user's role is not part of the hierarchy
    UnknownRole,
    /// User lookup failed
    Lookup(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidHeader(_) => {
                (StatusCode::UNAUTHORIZED, "Invalid authorization header")
            }
            AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired"),
            AuthError::UnknownRole => (StatusCode::FORBIDDEN, UNAUTHORIZED_MESSAGE),
            AuthError::Lookup(detail) => {
                tracing::error!("Caller lookup failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred",
                )
            }
        };

        let body = ErrorResponse {
            errors: ErrorPayload::message(message),
        };
        (status, Json(body)).into_response()
    }
}

fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AuthError::InvalidHeader("Authorization header must use Bearer scheme".to_string())
        })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasServices + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let claims = state
            .jwt_manager()
            .verify_access_token(token)
            .map_err(|e| match e {
                AppError::Jwt(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                    AuthError::TokenExpired
                }
                other => AuthError::InvalidToken(other.to_string()),
            })?;
        let user_id = claims
            .user_id()
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user = match state.user_service().get(user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AuthError::InvalidToken(format!("Unknown user {}", user_id)))
            }
            Err(e) => return Err(AuthError::Lookup(e.to_string())),
        };

        let role = state
            .user_service()
            .role_name(&user)
            .ok_or(AuthError::UnknownRole)?;

        Ok(AuthUser { user_id, role })
    }
}
