//! Fault-injecting decorator for the join team request store
//!
//! Wraps any [`JoinTeamRequestRepository`] and, once armed, makes saves
//! (`update`, `accept`, `decline`) or destroys (`delete`) fail with
//! [`AppError::PersistenceRejected`] carrying the configured payload. Reads and
//! creates always pass through.

use super::join_team_request::JoinTeamRequestRepository;
use crate::domain::{
    JoinTeamRequest, JoinTeamRequestChanges, JoinTeamRequestId, ParticipantId, TeamId,
};
use crate::error::{AppError, ErrorPayload, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone)]
struct Faults {
    save: Option<ErrorPayload>,
    destroy: Option<ErrorPayload>,
}

pub struct FaultInjectingJoinTeamRequestRepository<R: JoinTeamRequestRepository> {
    inner: Arc<R>,
    faults: RwLock<Faults>,
}

impl<R: JoinTeamRequestRepository> FaultInjectingJoinTeamRequestRepository<R> {
    pub fn new(inner: Arc<R>) -> Self {
        Self {
            inner,
            faults: RwLock::new(Faults::default()),
        }
    }

    pub fn inner(&self) -> &Arc<R> {
        &self.inner
    }

    /// Make every subsequent save fail with `payload`
    pub async fn fail_saves_with(&self, payload: ErrorPayload) {
        self.faults.write().await.save = Some(payload);
    }

    /// Make every subsequent destroy fail with `payload`
    pub async fn fail_destroys_with(&self, payload: ErrorPayload) {
        self.faults.write().await.destroy = Some(payload);
    }

    pub async fn reset(&self) {
        *self.faults.write().await = Faults::default();
    }

    async fn check_save(&self) -> Result<()> {
        match &self.faults.read().await.save {
            Some(payload) => Err(AppError::PersistenceRejected(payload.clone())),
            None => Ok(()),
        }
    }

    async fn check_destroy(&self) -> Result<()> {
        match &self.faults.read().await.destroy {
            Some(payload) => Err(AppError::PersistenceRejected(payload.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<R: JoinTeamRequestRepository> JoinTeamRequestRepository
    for FaultInjectingJoinTeamRequestRepository<R>
{
    async fn list(&self) -> Result<Vec<JoinTeamRequest>> {
        self.inner.list().await
    }

    async fn find_by_id(&self, id: JoinTeamRequestId) -> Result<Option<JoinTeamRequest>> {
        self.inner.find_by_id(id).await
    }

    async fn create(
        &self,
        participant_id: ParticipantId,
        team_id: TeamId,
        comments: Option<String>,
        max_team_size: Option<i32>,
    ) -> Result<JoinTeamRequest> {
        self.inner
            .create(participant_id, team_id, comments, max_team_size)
            .await
    }

    async fn update(
        &self,
        id: JoinTeamRequestId,
        changes: &JoinTeamRequestChanges,
    ) -> Result<JoinTeamRequest> {
        self.check_save().await?;
        self.inner.update(id, changes).await
    }

    async fn accept(
        &self,
        id: JoinTeamRequestId,
        max_team_size: Option<i32>,
    ) -> Result<JoinTeamRequest> {
        self.check_save().await?;
        self.inner.accept(id, max_team_size).await
    }

    async fn decline(&self, id: JoinTeamRequestId) -> Result<JoinTeamRequest> {
        self.check_save().await?;
        self.inner.decline(id).await
    }

    async fn delete(&self, id: JoinTeamRequestId) -> Result<()> {
        self.check_destroy().await?;
        self.inner.delete(id).await
    }
}
