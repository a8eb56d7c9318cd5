//! Join team request repository

use crate::domain::{
    JoinTeamRequest, JoinTeamRequestChanges, JoinTeamRequestId, JoinTeamRequestStatus,
    ParticipantId, TeamId, ALREADY_MEMBER_MESSAGE, ONLY_PENDING_MESSAGE, TEAM_FULL_MESSAGE,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JoinTeamRequestRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<JoinTeamRequest>>;

    async fn find_by_id(&self, id: JoinTeamRequestId) -> Result<Option<JoinTeamRequest>>;

    /// Insert a new PENDING request.
    ///
    /// Runs under the team's row lock: fails with a validation error when the
    /// participant's user is already on the team or the team already holds
    /// `max_team_size` members.
    async fn create(
        &self,
        participant_id: ParticipantId,
        team_id: TeamId,
        comments: Option<String>,
        max_team_size: Option<i32>,
    ) -> Result<JoinTeamRequest>;

    /// Apply comments and/or status in one write
    async fn update(
        &self,
        id: JoinTeamRequestId,
        changes: &JoinTeamRequestChanges,
    ) -> Result<JoinTeamRequest>;

    /// Mark ACCEPTED and add the requester to the team, atomically.
    ///
    /// Fails with a validation error when the team already holds
    /// `max_team_size` members.
    async fn accept(
        &self,
        id: JoinTeamRequestId,
        max_team_size: Option<i32>,
    ) -> Result<JoinTeamRequest>;

    /// Mark DECLINED. An ACCEPTED request's membership is removed in the
    /// same transaction.
    async fn decline(&self, id: JoinTeamRequestId) -> Result<JoinTeamRequest>;

    async fn delete(&self, id: JoinTeamRequestId) -> Result<()>;
}

pub struct JoinTeamRequestRepositoryImpl {
    pool: MySqlPool,
}

impl JoinTeamRequestRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JoinTeamRequestRepository for JoinTeamRequestRepositoryImpl {
    async fn list(&self) -> Result<Vec<JoinTeamRequest>> {
        let requests = sqlx::query_as::<_, JoinTeamRequest>(
            r#"
            SELECT id, participant_id, team_id, comments, status, created_at, updated_at
            FROM join_team_requests
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn find_by_id(&self, id: JoinTeamRequestId) -> Result<Option<JoinTeamRequest>> {
        let request = sqlx::query_as::<_, JoinTeamRequest>(
            r#"
            SELECT id, participant_id, team_id, comments, status, created_at, updated_at
            FROM join_team_requests
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn create(
        &self,
        participant_id: ParticipantId,
        team_id: TeamId,
        comments: Option<String>,
        max_team_size: Option<i32>,
    ) -> Result<JoinTeamRequest> {
        let mut tx = self.pool.begin().await?;

        // Same lock accept takes, so a concurrent accept cannot fill the team
        // between the checks and the insert
        sqlx::query("SELECT id FROM teams WHERE id = ? FOR UPDATE")
            .bind(team_id)
            .execute(&mut *tx)
            .await?;

        let (already_member,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM team_members tm
            JOIN participants member ON member.id = tm.participant_id
            JOIN participants requester ON requester.user_id = member.user_id
            WHERE tm.team_id = ? AND requester.id = ?
            "#,
        )
        .bind(team_id)
        .bind(participant_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_member > 0 {
            tx.rollback().await?;
            return Err(AppError::validation(ALREADY_MEMBER_MESSAGE));
        }

        if let Some(max) = max_team_size {
            let (members,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM team_members WHERE team_id = ?")
                    .bind(team_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if members >= i64::from(max) {
                tx.rollback().await?;
                return Err(AppError::validation(TEAM_FULL_MESSAGE));
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO join_team_requests (participant_id, team_id, comments, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(participant_id)
        .bind(team_id)
        .bind(comments)
        .bind(JoinTeamRequestStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let id = result.last_insert_id() as JoinTeamRequestId;
        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Failed to create join team request"))
        })
    }

    async fn update(
        &self,
        id: JoinTeamRequestId,
        changes: &JoinTeamRequestChanges,
    ) -> Result<JoinTeamRequest> {
        sqlx::query(
            r#"
            UPDATE join_team_requests
            SET comments = COALESCE(?, comments),
                status = COALESCE(?, status),
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&changes.comments)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        // rows_affected is 0 for a no-op write, so existence is checked by re-reading
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))
    }

    async fn accept(
        &self,
        id: JoinTeamRequestId,
        max_team_size: Option<i32>,
    ) -> Result<JoinTeamRequest> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, JoinTeamRequest>(
            r#"
            SELECT id, participant_id, team_id, comments, status, created_at, updated_at
            FROM join_team_requests
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))?;

        if request.status.is_terminal() {
            tx.rollback().await?;
            return Err(AppError::validation(ONLY_PENDING_MESSAGE));
        }

        // Serialize concurrent accepts into the same team
        sqlx::query("SELECT id FROM teams WHERE id = ? FOR UPDATE")
            .bind(request.team_id)
            .execute(&mut *tx)
            .await?;

        let (already_member,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM team_members WHERE team_id = ? AND participant_id = ?",
        )
        .bind(request.team_id)
        .bind(request.participant_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_member == 0 {
            let (members,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM team_members WHERE team_id = ?")
                    .bind(request.team_id)
                    .fetch_one(&mut *tx)
                    .await?;

            if let Some(max) = max_team_size {
                if members >= i64::from(max) {
                    tx.rollback().await?;
                    return Err(AppError::validation(TEAM_FULL_MESSAGE));
                }
            }

            sqlx::query(
                r#"
                INSERT INTO team_members (team_id, participant_id, created_at)
                VALUES (?, ?, NOW())
                "#,
            )
            .bind(request.team_id)
            .bind(request.participant_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE join_team_requests
            SET status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(JoinTeamRequestStatus::Accepted.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))
    }

    async fn decline(&self, id: JoinTeamRequestId) -> Result<JoinTeamRequest> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, JoinTeamRequest>(
            r#"
            SELECT id, participant_id, team_id, comments, status, created_at, updated_at
            FROM join_team_requests
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))?;

        if request.status == JoinTeamRequestStatus::Accepted {
            sqlx::query("DELETE FROM team_members WHERE team_id = ? AND participant_id = ?")
                .bind(request.team_id)
                .bind(request.participant_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            UPDATE join_team_requests
            SET status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(JoinTeamRequestStatus::Declined.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))
    }

    async fn delete(&self, id: JoinTeamRequestId) -> Result<()> {
        let result = sqlx::query("DELETE FROM join_team_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "JoinTeamRequest {} not found",
                id
            )));
        }

        Ok(())
    }
}
