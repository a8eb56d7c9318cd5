//! Join team request domain model

use super::course::{AssignmentId, Participant, ParticipantId, Team, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub type JoinTeamRequestId = i64;

pub const INVALID_STATUS_MESSAGE: &str = "Status is not included in the list";
pub const TEAM_FULL_MESSAGE: &str = "This team is full";
pub const ONLY_PENDING_MESSAGE: &str = "Only pending requests can be accepted";
pub const ALREADY_MEMBER_MESSAGE: &str = "You already belong to the team";
pub const STATUS_LOCKED_MESSAGE: &str = "Only pending requests can change status";
pub const ACCEPT_BY_UPDATE_MESSAGE: &str = "Join team requests can only be accepted through accept";

/// Lifecycle of a join request: PENDING → ACCEPTED | DECLINED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinTeamRequestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl JoinTeamRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinTeamRequestStatus::Pending => "PENDING",
            JoinTeamRequestStatus::Accepted => "ACCEPTED",
            JoinTeamRequestStatus::Declined => "DECLINED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JoinTeamRequestStatus::Pending)
    }
}

impl std::str::FromStr for JoinTeamRequestStatus {
    type Err = String;

    // Status strings are case-sensitive; "pending" is not a valid status.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JoinTeamRequestStatus::Pending),
            "ACCEPTED" => Ok(JoinTeamRequestStatus::Accepted),
            "DECLINED" => Ok(JoinTeamRequestStatus::Declined),
            _ => Err(format!("Unknown join team request status: {}", s)),
        }
    }
}

impl std::fmt::Display for JoinTeamRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for JoinTeamRequestStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for JoinTeamRequestStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

/// JoinTeamRequest entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct JoinTeamRequest {
    pub id: JoinTeamRequestId,
    pub participant_id: ParticipantId,
    pub team_id: TeamId,
    pub comments: Option<String>,
    pub status: JoinTeamRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A join request together with the team and participant it links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinTeamRequestDetail {
    #[serde(flatten)]
    pub request: JoinTeamRequest,
    pub team: Team,
    pub participant: Participant,
}

fn validate_status(status: &str) -> Result<(), validator::ValidationError> {
    status
        .parse::<JoinTeamRequestStatus>()
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("inclusion"))
}

/// Create payload. Accepts both snake_case and camelCase keys.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateJoinTeamRequestInput {
    #[validate(length(max = 1000, message = "Comments is too long (maximum is 1000 characters)"))]
    pub comments: Option<String>,
    #[serde(alias = "teamId")]
    pub team_id: Option<TeamId>,
    #[serde(alias = "assignmentId")]
    pub assignment_id: Option<AssignmentId>,
}

/// Update payload (PUT and PATCH behave the same)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateJoinTeamRequestInput {
    #[validate(length(max = 1000, message = "Comments is too long (maximum is 1000 characters)"))]
    pub comments: Option<String>,
    #[validate(custom(function = "validate_status", message = "Status is not included in the list"))]
    pub status: Option<String>,
}

impl UpdateJoinTeamRequestInput {
    /// Parsed status. Only meaningful after `validate()` succeeded.
    pub fn parsed_status(&self) -> Option<JoinTeamRequestStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Fields written by a single update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinTeamRequestChanges {
    pub comments: Option<String>,
    pub status: Option<JoinTeamRequestStatus>,
}

impl JoinTeamRequestChanges {
    pub fn is_empty(&self) -> bool {
        self.comments.is_none() && self.status.is_none()
    }
}

impl From<&UpdateJoinTeamRequestInput> for JoinTeamRequestChanges {
    fn from(input: &UpdateJoinTeamRequestInput) -> Self {
        Self {
            comments: input.comments.clone(),
            status: input.parsed_status(),
        }
    }
}
