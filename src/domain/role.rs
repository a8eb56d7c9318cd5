//! Role hierarchy domain model
//!
//! Roles form a single-rooted tree. Each role holds every privilege of the
//! roles below it, so "at least instructor" is answered by walking parent
//! links from the candidate role up to the root.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

pub type RoleId = i64;

pub const SUPER_ADMINISTRATOR: &str = "super_administrator";
pub const ADMINISTRATOR: &str = "administrator";
pub const INSTRUCTOR: &str = "instructor";
pub const TEACHING_ASSISTANT: &str = "ta";
pub const STUDENT: &str = "student";

/// The canonical chain, root first. Each entry names its parent.
pub const CANONICAL_ROLES: [(&str, Option<&str>); 5] = [
    (SUPER_ADMINISTRATOR, None),
    (ADMINISTRATOR, Some(SUPER_ADMINISTRATOR)),
    (INSTRUCTOR, Some(ADMINISTRATOR)),
    (TEACHING_ASSISTANT, Some(INSTRUCTOR)),
    (STUDENT, Some(TEACHING_ASSISTANT)),
];

/// Role entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Parent role (None only for the root)
    pub parent_id: Option<RoleId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct RoleNode {
    id: RoleId,
    name: String,
    parent: Option<usize>,
}

/// Arena of roles indexed by name and id, with parent links by index.
#[derive(Debug, Clone, Default)]
pub struct RoleHierarchy {
    nodes: Vec<RoleNode>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<RoleId, usize>,
}

impl RoleHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// super_administrator → administrator → instructor → ta → student
    pub fn canonical() -> Self {
        let mut hierarchy = Self::new();
        for (name, parent) in CANONICAL_ROLES {
            // The chain is declared root first, so every parent already exists.
            if let Err(e) = hierarchy.upsert(name, parent) {
                unreachable!("canonical role chain is well formed: {e}");
            }
        }
        hierarchy
    }

    /// Find-or-create a role by name.
    ///
    /// An existing name returns its id and leaves the hierarchy untouched.
    /// A new role must name an existing parent, and only one role may be
    /// parentless.
    pub fn upsert(&mut self, name: &str, parent: Option<&str>) -> Result<RoleId> {
        if let Some(&idx) = self.by_name.get(name) {
            return Ok(self.nodes[idx].id);
        }

        let parent_idx = match parent {
            Some(parent_name) => Some(*self.by_name.get(parent_name).ok_or_else(|| {
                AppError::InvalidRoleHierarchy(format!(
                    "Parent role '{}' of '{}' does not exist",
                    parent_name, name
                ))
            })?),
            None => {
                if let Some(root) = self.root() {
                    return Err(AppError::InvalidRoleHierarchy(format!(
                        "Role '{}' has no parent but '{}' is already the root",
                        name, root
                    )));
                }
                None
            }
        };

        let id = self.next_id();
        self.insert_node(id, name, parent_idx);
        Ok(id)
    }

    /// Rebuild a hierarchy from persisted role rows.
    pub fn from_roles(roles: &[Role]) -> Result<Self> {
        let mut hierarchy = Self::new();
        for role in roles {
            if hierarchy.by_name.contains_key(&role.name) {
                return Err(AppError::InvalidRoleHierarchy(format!(
                    "Duplicate role name '{}'",
                    role.name
                )));
            }
            hierarchy.insert_node(role.id, &role.name, None);
        }

        for role in roles {
            let Some(parent_id) = role.parent_id else {
                continue;
            };
            let parent_idx = *hierarchy.by_id.get(&parent_id).ok_or_else(|| {
                AppError::InvalidRoleHierarchy(format!(
                    "Parent role {} of '{}' does not exist",
                    parent_id, role.name
                ))
            })?;
            let idx = hierarchy.by_id[&role.id];
            hierarchy.nodes[idx].parent = Some(parent_idx);
        }

        let roots = hierarchy
            .nodes
            .iter()
            .filter(|node| node.parent.is_none())
            .count();
        if roots != 1 {
            return Err(AppError::InvalidRoleHierarchy(format!(
                "Expected exactly one root role, found {}",
                roots
            )));
        }

        // With a single root, every role must reach it within `len` steps.
        for idx in 0..hierarchy.nodes.len() {
            let mut current = Some(idx);
            let mut steps = 0;
            while let Some(i) = current {
                if steps > hierarchy.nodes.len() {
                    return Err(AppError::InvalidRoleHierarchy(format!(
                        "Role '{}' is part of a cycle",
                        hierarchy.nodes[idx].name
                    )));
                }
                current = hierarchy.nodes[i].parent;
                steps += 1;
            }
        }

        Ok(hierarchy)
    }

    /// True iff `required` is `candidate` or one of its ancestors.
    /// Unknown role names never satisfy a check.
    pub fn is_at_least(&self, candidate: &str, required: &str) -> bool {
        let (Some(&candidate_idx), Some(&required_idx)) =
            (self.by_name.get(candidate), self.by_name.get(required))
        else {
            return false;
        };

        let mut current = Some(candidate_idx);
        while let Some(idx) = current {
            if idx == required_idx {
                return true;
            }
            current = self.nodes[idx].parent;
        }
        false
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn id_of(&self, name: &str) -> Option<RoleId> {
        self.by_name.get(name).map(|&idx| self.nodes[idx].id)
    }

    pub fn name_of(&self, id: RoleId) -> Option<&str> {
        self.by_id.get(&id).map(|&idx| self.nodes[idx].name.as_str())
    }

    pub fn root(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|node| node.parent.is_none())
            .map(|node| node.name.as_str())
    }

    /// Distance from the root (root = 0)
    pub fn depth(&self, name: &str) -> Option<usize> {
        self.ancestors(name).map(|ancestors| ancestors.len())
    }

    /// Ancestors of `name`, nearest first
    pub fn ancestors(&self, name: &str) -> Option<Vec<&str>> {
        let &idx = self.by_name.get(name)?;
        let mut names = Vec::new();
        let mut current = self.nodes[idx].parent;
        while let Some(i) = current {
            names.push(self.nodes[i].name.as_str());
            current = self.nodes[i].parent;
        }
        Some(names)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn next_id(&self) -> RoleId {
        self.nodes.iter().map(|node| node.id).max().unwrap_or(0) + 1
    }

    fn insert_node(&mut self, id: RoleId, name: &str, parent: Option<usize>) {
        let idx = self.nodes.len();
        self.nodes.push(RoleNode {
            id,
            name: name.to_string(),
            parent,
        });
        self.by_name.insert(name.to_string(), idx);
        self.by_id.insert(id, idx);
    }
}
