//! User domain model

use super::role::RoleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub type UserId = i64;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    /// Login handle
    pub name: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_digest: String,
    pub role_id: RoleId,
    /// Most recently used submission directory
    pub mru_directory_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub password_digest: String,
    pub role_id: RoleId,
    pub mru_directory_path: Option<String>,
}
