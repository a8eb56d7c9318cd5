//! REST API handlers

pub mod health;
pub mod join_team_request;
pub mod metrics;

use crate::error::{AppError, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Json};
use serde::{Deserialize, Serialize};

/// Plain confirmation body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Unwrap a JSON body, reporting malformed payloads in the common error shape
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Unwrap a path parameter, reporting malformed ids in the common error shape
pub(crate) fn path_param<T>(param: std::result::Result<Path<T>, PathRejection>) -> Result<T> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}
