//! User business logic

use crate::domain::{CreateUserInput, RoleHierarchy, User, UserId};
use crate::error::{AppError, Result};
use crate::repository::UserRepository;
use std::sync::Arc;
use validator::Validate;

pub struct UserService<R: UserRepository> {
    repo: Arc<R>,
    hierarchy: Arc<RoleHierarchy>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: Arc<R>, hierarchy: Arc<RoleHierarchy>) -> Self {
        Self { repo, hierarchy }
    }

    pub async fn create(&self, input: CreateUserInput) -> Result<User> {
        input.validate()?;

        if self.hierarchy.name_of(input.role_id).is_none() {
            return Err(AppError::validation("Role must exist"));
        }

        if self.repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "User with email '{}' already exists",
                input.email
            )));
        }

        self.repo.create(&input).await
    }

    pub async fn get(&self, id: UserId) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Name of the user's role, or None if the role is not in the hierarchy
    pub fn role_name(&self, user: &User) -> Option<String> {
        self.hierarchy.name_of(user.role_id).map(str::to_string)
    }

    pub async fn assign_role(&self, id: UserId, role_name: &str) -> Result<User> {
        let role_id = self
            .hierarchy
            .id_of(role_name)
            .ok_or_else(|| AppError::NotFound(format!("Role '{}' not found", role_name)))?;
        self.get(id).await?;
        self.repo.update_role(id, role_id).await
    }
}
