//! Centralized authorization policy for join team requests.
//!
//! Two checks run before any store mutation:
//! 1. the role gate: the caller's role must be at least the action's minimum
//!    role in the [`RoleHierarchy`];
//! 2. the ownership gate: once the target request is loaded, the caller must
//!    stand in the right relation to it (requester, team member, or an
//!    administrator-or-above).

use crate::domain::role::{ADMINISTRATOR, STUDENT};
use crate::domain::RoleHierarchy;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;

pub type PolicyResult<T> = std::result::Result<T, AppError>;

/// Message used when the role gate denies an action
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyAction {
    ListJoinRequests,
    ViewJoinRequest,
    CreateJoinRequest,
    UpdateJoinRequest,
    DeclineJoinRequest,
    AcceptJoinRequest,
    DeleteJoinRequest,
}

impl PolicyAction {
    /// Lowest role allowed to attempt the action
    pub fn minimum_role(&self) -> &'static str {
        match self {
            PolicyAction::ListJoinRequests => ADMINISTRATOR,
            PolicyAction::ViewJoinRequest
            | PolicyAction::CreateJoinRequest
            | PolicyAction::UpdateJoinRequest
            | PolicyAction::DeclineJoinRequest
            | PolicyAction::AcceptJoinRequest
            | PolicyAction::DeleteJoinRequest => STUDENT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyAction::ListJoinRequests => "list",
            PolicyAction::ViewJoinRequest => "show",
            PolicyAction::CreateJoinRequest => "create",
            PolicyAction::UpdateJoinRequest => "update",
            PolicyAction::DeclineJoinRequest => "decline",
            PolicyAction::AcceptJoinRequest => "accept",
            PolicyAction::DeleteJoinRequest => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// How the caller relates to a loaded join request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestRelation {
    /// Caller is the user behind the requesting participant
    pub is_requester: bool,
    /// Caller already belongs to the target team
    pub is_team_member: bool,
}

/// Role gate
pub fn authorize(hierarchy: &RoleHierarchy, caller_role: &str, action: PolicyAction) -> Decision {
    if hierarchy.is_at_least(caller_role, action.minimum_role()) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

pub fn enforce(hierarchy: &RoleHierarchy, auth: &AuthUser, action: PolicyAction) -> PolicyResult<()> {
    match authorize(hierarchy, &auth.role, action) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::debug!(
                user_id = auth.user_id,
                role = %auth.role,
                action = action.as_str(),
                "Role gate denied join team request action"
            );
            Err(AppError::Forbidden(UNAUTHORIZED_MESSAGE.to_string()))
        }
    }
}

/// Ownership gate, applied after the target request has been loaded
pub fn enforce_ownership(
    hierarchy: &RoleHierarchy,
    auth: &AuthUser,
    action: PolicyAction,
    relation: RequestRelation,
) -> PolicyResult<()> {
    if action == PolicyAction::AcceptJoinRequest && relation.is_requester {
        return Err(AppError::Forbidden(
            "You cannot accept your own join team request".to_string(),
        ));
    }

    if hierarchy.is_at_least(&auth.role, ADMINISTRATOR) {
        return Ok(());
    }

    let allowed = match action {
        PolicyAction::ListJoinRequests => false,
        PolicyAction::CreateJoinRequest => true,
        PolicyAction::ViewJoinRequest | PolicyAction::DeclineJoinRequest => {
            relation.is_requester || relation.is_team_member
        }
        PolicyAction::UpdateJoinRequest | PolicyAction::DeleteJoinRequest => relation.is_requester,
        PolicyAction::AcceptJoinRequest => relation.is_team_member,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You are not allowed to {} this join team request",
            action.as_str()
        )))
    }
}
