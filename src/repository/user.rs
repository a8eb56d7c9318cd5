//! User repository

use crate::domain::{CreateUserInput, RoleId, User, UserId};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, input: &CreateUserInput) -> Result<User>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_role(&self, id: UserId, role_id: RoleId) -> Result<User>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, full_name, email, password_digest, role_id, mru_directory_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(&input.name)
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.password_digest)
        .bind(input.role_id)
        .bind(&input.mru_directory_path)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as UserId;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, full_name, email, password_digest, role_id, mru_directory_path, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, full_name, email, password_digest, role_id, mru_directory_path, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_role(&self, id: UserId, role_id: RoleId) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET role_id = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(role_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}
