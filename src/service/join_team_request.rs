//! Join team request lifecycle
//!
//! Every operation runs the role gate before touching the store. Operations on
//! an existing request then load it, run the ownership gate, validate, and
//! only then write.

use crate::domain::{
    CreateJoinTeamRequestInput, JoinTeamRequest, JoinTeamRequestChanges, JoinTeamRequestDetail,
    JoinTeamRequestId, JoinTeamRequestStatus, RoleHierarchy, UpdateJoinTeamRequestInput,
    ACCEPT_BY_UPDATE_MESSAGE, ONLY_PENDING_MESSAGE, STATUS_LOCKED_MESSAGE,
};
use crate::error::{AppError, ErrorPayload, Result};
use crate::middleware::auth::AuthUser;
use crate::policy::{self, PolicyAction, RequestRelation};
use crate::repository::{CourseRepository, JoinTeamRequestRepository};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use validator::Validate;

pub const PARTICIPANT_NOT_FOUND_MESSAGE: &str = "Participant not found";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete JoinTeamRequest";
pub const UPDATED_MESSAGE: &str = "JoinTeamRequest was successfully updated";
pub const DELETED_MESSAGE: &str = "JoinTeamRequest was successfully deleted";

pub struct JoinTeamRequestService<J: JoinTeamRequestRepository, C: CourseRepository> {
    repo: Arc<J>,
    course_repo: Arc<C>,
    hierarchy: Arc<RoleHierarchy>,
}

impl<J: JoinTeamRequestRepository, C: CourseRepository> JoinTeamRequestService<J, C> {
    pub fn new(repo: Arc<J>, course_repo: Arc<C>, hierarchy: Arc<RoleHierarchy>) -> Self {
        Self {
            repo,
            course_repo,
            hierarchy,
        }
    }

    /// All requests with their team and participant (administrator-or-above)
    pub async fn list(&self, auth: &AuthUser) -> Result<Vec<JoinTeamRequestDetail>> {
        let start = Instant::now();
        let result = self.list_inner(auth).await;
        record_operation(PolicyAction::ListJoinRequests, &result, start);
        result
    }

    async fn list_inner(&self, auth: &AuthUser) -> Result<Vec<JoinTeamRequestDetail>> {
        policy::enforce(&self.hierarchy, auth, PolicyAction::ListJoinRequests)?;

        let requests = self.repo.list().await?;
        let mut details = Vec::with_capacity(requests.len());
        for request in requests {
            details.push(self.detail(request).await?);
        }
        Ok(details)
    }

    /// Open a PENDING request on behalf of the caller's participant record
    pub async fn create(
        &self,
        auth: &AuthUser,
        input: CreateJoinTeamRequestInput,
    ) -> Result<JoinTeamRequest> {
        let start = Instant::now();
        let result = self.create_inner(auth, input).await;
        record_operation(PolicyAction::CreateJoinRequest, &result, start);
        result
    }

    async fn create_inner(
        &self,
        auth: &AuthUser,
        input: CreateJoinTeamRequestInput,
    ) -> Result<JoinTeamRequest> {
        policy::enforce(&self.hierarchy, auth, PolicyAction::CreateJoinRequest)?;

        // A missing assignment id short-circuits before any other check.
        let assignment_id = input
            .assignment_id
            .ok_or_else(|| AppError::DependencyMissing(PARTICIPANT_NOT_FOUND_MESSAGE.to_string()))?;
        let participant = self
            .course_repo
            .find_participant_by_user(auth.user_id, assignment_id)
            .await?
            .ok_or_else(|| AppError::DependencyMissing(PARTICIPANT_NOT_FOUND_MESSAGE.to_string()))?;

        input.validate()?;

        let team = match input.team_id {
            Some(team_id) => self.course_repo.find_team(team_id).await?,
            None => None,
        }
        .ok_or_else(|| AppError::validation("Team must exist"))?;

        if team.assignment_id != assignment_id {
            return Err(AppError::validation(
                "Team must belong to the same assignment",
            ));
        }

        let max_team_size = self
            .course_repo
            .find_assignment(assignment_id)
            .await?
            .and_then(|a| a.max_team_size);

        // Membership and capacity are checked by the store under the team lock
        let request = self
            .repo
            .create(participant.id, team.id, input.comments, max_team_size)
            .await?;
        info!(
            join_team_request_id = request.id,
            participant_id = participant.id,
            team_id = team.id,
            "Created join team request"
        );
        Ok(request)
    }

    pub async fn show(&self, auth: &AuthUser, id: JoinTeamRequestId) -> Result<JoinTeamRequestDetail> {
        let start = Instant::now();
        let result = self.show_inner(auth, id).await;
        record_operation(PolicyAction::ViewJoinRequest, &result, start);
        result
    }

    async fn show_inner(&self, auth: &AuthUser, id: JoinTeamRequestId) -> Result<JoinTeamRequestDetail> {
        let request = self
            .load_authorized(auth, id, PolicyAction::ViewJoinRequest)
            .await?;
        self.detail(request).await
    }

    /// Apply comments and/or status. The whole payload is validated before
    /// anything is written.
    ///
    /// Status may only move away from PENDING, and never to ACCEPTED: that
    /// transition belongs to [`Self::accept`], which also adds the membership.
    pub async fn update(
        &self,
        auth: &AuthUser,
        id: JoinTeamRequestId,
        input: UpdateJoinTeamRequestInput,
    ) -> Result<JoinTeamRequest> {
        let start = Instant::now();
        let result = self.update_inner(auth, id, input).await;
        record_operation(PolicyAction::UpdateJoinRequest, &result, start);
        result
    }

    async fn update_inner(
        &self,
        auth: &AuthUser,
        id: JoinTeamRequestId,
        input: UpdateJoinTeamRequestInput,
    ) -> Result<JoinTeamRequest> {
        let request = self
            .load_authorized(auth, id, PolicyAction::UpdateJoinRequest)
            .await?;

        input.validate()?;

        let changes = JoinTeamRequestChanges::from(&input);
        if let Some(next) = changes.status.filter(|next| *next != request.status) {
            if next == JoinTeamRequestStatus::Accepted {
                warn!(join_team_request_id = id, user_id = auth.user_id, "Rejected accept through update");
                return Err(AppError::Forbidden(ACCEPT_BY_UPDATE_MESSAGE.to_string()));
            }
            if request.status.is_terminal() {
                return Err(AppError::validation(STATUS_LOCKED_MESSAGE));
            }
        }
        if changes.is_empty() {
            return Ok(request);
        }
        self.repo.update(id, &changes).await
    }

    /// Move the request to DECLINED. Declining an ACCEPTED request also takes
    /// the requester off the team. Store rejections are reported verbatim.
    pub async fn decline(&self, auth: &AuthUser, id: JoinTeamRequestId) -> Result<JoinTeamRequest> {
        let start = Instant::now();
        let result = self.decline_inner(auth, id).await;
        record_operation(PolicyAction::DeclineJoinRequest, &result, start);
        result
    }

    async fn decline_inner(&self, auth: &AuthUser, id: JoinTeamRequestId) -> Result<JoinTeamRequest> {
        self.load_authorized(auth, id, PolicyAction::DeclineJoinRequest)
            .await?;

        let declined = self.repo.decline(id).await?;
        info!(join_team_request_id = id, user_id = auth.user_id, "Declined join team request");
        Ok(declined)
    }

    /// Move a PENDING request to ACCEPTED and add the requester to the team
    pub async fn accept(&self, auth: &AuthUser, id: JoinTeamRequestId) -> Result<JoinTeamRequest> {
        let start = Instant::now();
        let result = self.accept_inner(auth, id).await;
        record_operation(PolicyAction::AcceptJoinRequest, &result, start);
        result
    }

    async fn accept_inner(&self, auth: &AuthUser, id: JoinTeamRequestId) -> Result<JoinTeamRequest> {
        let request = self
            .load_authorized(auth, id, PolicyAction::AcceptJoinRequest)
            .await?;

        if request.status.is_terminal() {
            return Err(AppError::validation(ONLY_PENDING_MESSAGE));
        }

        let team = self
            .course_repo
            .find_team(request.team_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", request.team_id)))?;
        let max_team_size = self
            .course_repo
            .find_assignment(team.assignment_id)
            .await?
            .and_then(|a| a.max_team_size);

        let accepted = self.repo.accept(id, max_team_size).await?;
        info!(
            join_team_request_id = id,
            team_id = team.id,
            participant_id = accepted.participant_id,
            "Accepted join team request"
        );
        Ok(accepted)
    }

    /// Remove the request. Any store rejection becomes a fixed message.
    pub async fn delete(&self, auth: &AuthUser, id: JoinTeamRequestId) -> Result<()> {
        let start = Instant::now();
        let result = self.delete_inner(auth, id).await;
        record_operation(PolicyAction::DeleteJoinRequest, &result, start);
        result
    }

    async fn delete_inner(&self, auth: &AuthUser, id: JoinTeamRequestId) -> Result<()> {
        self.load_authorized(auth, id, PolicyAction::DeleteJoinRequest)
            .await?;

        match self.repo.delete(id).await {
            Ok(()) => {
                info!(join_team_request_id = id, user_id = auth.user_id, "Deleted join team request");
                Ok(())
            }
            Err(e @ (AppError::PersistenceRejected(_) | AppError::Database(_))) => {
                warn!(join_team_request_id = id, error = %e, "Store rejected join team request delete");
                Err(AppError::PersistenceRejected(ErrorPayload::message(
                    DELETE_FAILED_MESSAGE,
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Role gate, load, ownership gate
    async fn load_authorized(
        &self,
        auth: &AuthUser,
        id: JoinTeamRequestId,
        action: PolicyAction,
    ) -> Result<JoinTeamRequest> {
        policy::enforce(&self.hierarchy, auth, action)?;

        let request = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))?;

        let relation = self.relation(auth, &request).await?;
        policy::enforce_ownership(&self.hierarchy, auth, action, relation)?;
        Ok(request)
    }

    async fn relation(&self, auth: &AuthUser, request: &JoinTeamRequest) -> Result<RequestRelation> {
        let is_requester = self
            .course_repo
            .find_participant(request.participant_id)
            .await?
            .is_some_and(|p| p.user_id == auth.user_id);
        let is_team_member = self
            .course_repo
            .is_user_on_team(request.team_id, auth.user_id)
            .await?;

        Ok(RequestRelation {
            is_requester,
            is_team_member,
        })
    }

    async fn detail(&self, request: JoinTeamRequest) -> Result<JoinTeamRequestDetail> {
        let team = self
            .course_repo
            .find_team(request.team_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", request.team_id)))?;
        let participant = self
            .course_repo
            .find_participant(request.participant_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Participant {} not found", request.participant_id))
            })?;

        Ok(JoinTeamRequestDetail {
            request,
            team,
            participant,
        })
    }
}

fn record_operation<T>(action: PolicyAction, result: &Result<T>, start: Instant) {
    let status = match result {
        Ok(_) => "success",
        Err(AppError::Forbidden(_)) => "denied",
        Err(_) => "error",
    };
    counter!(
        "teamjoin_join_team_request_operations_total",
        "operation" => action.as_str(),
        "result" => status
    )
    .increment(1);
    histogram!(
        "teamjoin_join_team_request_operation_duration_seconds",
        "operation" => action.as_str()
    )
    .record(start.elapsed().as_secs_f64());
}
