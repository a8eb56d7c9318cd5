//! Course structure: assignments, participants and teams

use super::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub type AssignmentId = i64;
pub type ParticipantId = i64;
pub type TeamId = i64;

/// Assignment owned by an instructor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: AssignmentId,
    pub name: String,
    /// Storage path for submissions
    pub directory_path: String,
    pub instructor_id: UserId,
    /// Upper bound on team members (None = unbounded)
    pub max_team_size: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssignmentInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub directory_path: String,
    pub instructor_id: UserId,
    #[validate(range(min = 1))]
    pub max_team_size: Option<i32>,
}

/// A user's enrollment in one assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: ParticipantId,
    pub user_id: UserId,
    pub assignment_id: AssignmentId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A grouping of participants within an assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: TeamId,
    pub assignment_id: AssignmentId,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeamInput {
    pub assignment_id: AssignmentId,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Team membership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub id: i64,
    pub team_id: TeamId,
    pub participant_id: ParticipantId,
    pub created_at: DateTime<Utc>,
}
