//! Course repository: assignments, participants, teams and team membership

use crate::domain::{
    Assignment, AssignmentId, CreateAssignmentInput, CreateTeamInput, Participant, ParticipantId,
    Team, TeamId, TeamMember, UserId,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create_assignment(&self, input: &CreateAssignmentInput) -> Result<Assignment>;
    async fn find_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>>;

    /// Enroll a user in an assignment
    async fn create_participant(
        &self,
        user_id: UserId,
        assignment_id: AssignmentId,
    ) -> Result<Participant>;
    async fn find_participant(&self, id: ParticipantId) -> Result<Option<Participant>>;
    /// Participant record for (user, assignment)
    async fn find_participant_by_user(
        &self,
        user_id: UserId,
        assignment_id: AssignmentId,
    ) -> Result<Option<Participant>>;

    async fn create_team(&self, input: &CreateTeamInput) -> Result<Team>;
    async fn find_team(&self, id: TeamId) -> Result<Option<Team>>;
    async fn list_team_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>>;
    async fn count_team_members(&self, team_id: TeamId) -> Result<i64>;
    /// Whether any of the user's participant records sits on the team
    async fn is_user_on_team(&self, team_id: TeamId, user_id: UserId) -> Result<bool>;
}

pub struct CourseRepositoryImpl {
    pool: MySqlPool,
}

impl CourseRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for CourseRepositoryImpl {
    async fn create_assignment(&self, input: &CreateAssignmentInput) -> Result<Assignment> {
        let result = sqlx::query(
            r#"
            INSERT INTO assignments (name, directory_path, instructor_id, max_team_size, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(&input.name)
        .bind(&input.directory_path)
        .bind(input.instructor_id)
        .bind(input.max_team_size)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as AssignmentId;
        self.find_assignment(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create assignment")))
    }

    async fn find_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, name, directory_path, instructor_id, max_team_size, created_at, updated_at
            FROM assignments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }

    async fn create_participant(
        &self,
        user_id: UserId,
        assignment_id: AssignmentId,
    ) -> Result<Participant> {
        let result = sqlx::query(
            r#"
            INSERT INTO participants (user_id, assignment_id, created_at, updated_at)
            VALUES (?, ?, NOW(), NOW())
            "#,
        )
        .bind(user_id)
        .bind(assignment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_conflict_if_duplicate(e, user_id, assignment_id))?;

        let id = result.last_insert_id() as ParticipantId;
        self.find_participant(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create participant")))
    }

    async fn find_participant(&self, id: ParticipantId) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, user_id, assignment_id, created_at, updated_at
            FROM participants
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    async fn find_participant_by_user(
        &self,
        user_id: UserId,
        assignment_id: AssignmentId,
    ) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, user_id, assignment_id, created_at, updated_at
            FROM participants
            WHERE user_id = ? AND assignment_id = ?
            "#,
        )
        .bind(user_id)
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    async fn create_team(&self, input: &CreateTeamInput) -> Result<Team> {
        let result = sqlx::query(
            r#"
            INSERT INTO teams (assignment_id, name, created_at, updated_at)
            VALUES (?, ?, NOW(), NOW())
            "#,
        )
        .bind(input.assignment_id)
        .bind(&input.name)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as TeamId;
        self.find_team(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create team")))
    }

    async fn find_team(&self, id: TeamId) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, assignment_id, name, created_at, updated_at
            FROM teams
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn list_team_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>> {
        let members = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT id, team_id, participant_id, created_at
            FROM team_members
            WHERE team_id = ?
            ORDER BY id
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn count_team_members(&self, team_id: TeamId) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM team_members WHERE team_id = ?")
            .bind(team_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }

    async fn is_user_on_team(&self, team_id: TeamId, user_id: UserId) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM team_members tm
            INNER JOIN participants p ON p.id = tm.participant_id
            WHERE tm.team_id = ? AND p.user_id = ?
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 > 0)
    }
}

/// A concurrent enrollment that loses the race trips the UNIQUE
/// (user_id, assignment_id) key.
fn map_conflict_if_duplicate(
    error: sqlx::Error,
    user_id: UserId,
    assignment_id: AssignmentId,
) -> AppError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() || db_err.code().as_deref() == Some("1062") {
            return AppError::Conflict(format!(
                "User {} is already a participant of assignment {}",
                user_id, assignment_id
            ));
        }
    }
    AppError::Database(error)
}
