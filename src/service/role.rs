//! Role seeding and hierarchy loading

use crate::domain::{Role, RoleHierarchy, CANONICAL_ROLES};
use crate::error::{AppError, Result};
use crate::repository::RoleRepository;
use std::sync::Arc;
use tracing::info;

pub struct RoleService<R: RoleRepository> {
    repo: Arc<R>,
}

impl<R: RoleRepository> RoleService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Find-or-create a role by name under `parent`
    pub async fn ensure_role(&self, name: &str, parent: Option<&str>) -> Result<Role> {
        if let Some(existing) = self.repo.find_by_name(name).await? {
            return Ok(existing);
        }

        let parent_id = match parent {
            Some(parent_name) => Some(
                self.repo
                    .find_by_name(parent_name)
                    .await?
                    .ok_or_else(|| {
                        AppError::InvalidRoleHierarchy(format!(
                            "Parent role '{}' of '{}' does not exist",
                            parent_name, name
                        ))
                    })?
                    .id,
            ),
            None => None,
        };

        let role = self.repo.create(name, parent_id).await?;
        info!(role = %role.name, role_id = role.id, "Created role");
        Ok(role)
    }

    /// Seed the canonical chain and return the resulting hierarchy.
    ///
    /// Safe to call on every startup; existing roles are left untouched.
    pub async fn seed_hierarchy(&self) -> Result<RoleHierarchy> {
        for (name, parent) in CANONICAL_ROLES {
            self.ensure_role(name, parent).await?;
        }
        self.load_hierarchy().await
    }

    /// Build the hierarchy from whatever roles are stored
    pub async fn load_hierarchy(&self) -> Result<RoleHierarchy> {
        let roles = self.repo.list().await?;
        RoleHierarchy::from_roles(&roles)
    }
}
