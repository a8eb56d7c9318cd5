//! Role repository

use crate::domain::{Role, RoleId};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create(&self, name: &str, parent_id: Option<RoleId>) -> Result<Role>;
    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>>;
    /// All roles, in insertion order
    async fn list(&self) -> Result<Vec<Role>>;
}

pub struct RoleRepositoryImpl {
    pool: MySqlPool,
}

impl RoleRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for RoleRepositoryImpl {
    async fn create(&self, name: &str, parent_id: Option<RoleId>) -> Result<Role> {
        let result = sqlx::query(
            r#"
            INSERT INTO roles (name, parent_id, created_at, updated_at)
            VALUES (?, ?, NOW(), NOW())
            "#,
        )
        .bind(name)
        .bind(parent_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as RoleId;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create role")))
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, parent_id, created_at, updated_at
            FROM roles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, parent_id, created_at, updated_at
            FROM roles
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn list(&self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, parent_id, created_at, updated_at
            FROM roles
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }
}
