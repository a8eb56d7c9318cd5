//! API integration tests infrastructure
//!
//! In-memory repositories standing in for MySQL, so the production router
//! and services can be exercised without external dependencies.

pub mod role_seed_test;

use async_trait::async_trait;
use chrono::Utc;
use teamjoin_core::config::JwtConfig;
use teamjoin_core::domain::{
    Assignment, AssignmentId, CreateAssignmentInput, CreateTeamInput, CreateUserInput,
    JoinTeamRequest, JoinTeamRequestChanges, JoinTeamRequestId, JoinTeamRequestStatus,
    Participant, ParticipantId, Role, RoleId, Team, TeamId, TeamMember, User, UserId,
    ALREADY_MEMBER_MESSAGE, ONLY_PENDING_MESSAGE, TEAM_FULL_MESSAGE,
};
use teamjoin_core::error::{AppError, Result};
use teamjoin_core::jwt::JwtManager;
use teamjoin_core::repository::{
    CourseRepository, JoinTeamRequestRepository, RoleRepository, UserRepository,
};
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// Test Configuration
// ============================================================================

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-for-api-testing-purposes".to_string(),
        issuer: "teamjoin-test".to_string(),
        access_token_ttl_secs: 3600,
    }
}

pub fn create_test_jwt_manager() -> JwtManager {
    JwtManager::new(test_jwt_config())
}

/// Bearer token for `user_id`
pub fn token_for(user_id: UserId) -> String {
    create_test_jwt_manager()
        .create_access_token(user_id)
        .expect("Failed to create test access token")
}

// ============================================================================
// Test Fixtures
// ============================================================================

pub fn create_test_user(id: UserId, role_id: RoleId) -> User {
    User {
        id,
        name: format!("user{}", id),
        full_name: format!("User {}", id),
        email: format!("user{}@example.com", id),
        password_digest: String::new(),
        role_id,
        mru_directory_path: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn create_test_assignment(
    id: AssignmentId,
    instructor_id: UserId,
    max_team_size: Option<i32>,
) -> Assignment {
    Assignment {
        id,
        name: format!("Assignment {}", id),
        directory_path: format!("assignment_{}", id),
        instructor_id,
        max_team_size,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn create_test_participant(
    id: ParticipantId,
    user_id: UserId,
    assignment_id: AssignmentId,
) -> Participant {
    Participant {
        id,
        user_id,
        assignment_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn create_test_team(id: TeamId, assignment_id: AssignmentId) -> Team {
    Team {
        id,
        assignment_id,
        name: Some(format!("Team {}", id)),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn create_test_request(
    id: JoinTeamRequestId,
    participant_id: ParticipantId,
    team_id: TeamId,
) -> JoinTeamRequest {
    JoinTeamRequest {
        id,
        participant_id,
        team_id,
        comments: Some("Please let me in".to_string()),
        status: JoinTeamRequestStatus::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

// ============================================================================
// Test Repository Implementations
// ============================================================================

pub struct TestRoleRepository {
    roles: RwLock<Vec<Role>>,
}

impl TestRoleRepository {
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(vec![]),
        }
    }

    pub async fn count(&self) -> usize {
        self.roles.read().await.len()
    }
}

impl Default for TestRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleRepository for TestRoleRepository {
    async fn create(&self, name: &str, parent_id: Option<RoleId>) -> Result<Role> {
        let mut roles = self.roles.write().await;
        if roles.iter().any(|r| r.name == name) {
            return Err(AppError::Conflict(format!("Role '{}' already exists", name)));
        }
        let role = Role {
            id: next_id(roles.iter().map(|r| r.id)),
            name: name.to_string(),
            parent_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        roles.push(role.clone());
        Ok(role)
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>> {
        Ok(self.roles.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Role>> {
        Ok(self.roles.read().await.clone())
    }
}

pub struct TestUserRepository {
    users: RwLock<Vec<User>>,
}

impl TestUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(vec![]),
        }
    }

    pub async fn add_user(&self, user: User) {
        self.users.write().await.push(user);
    }
}

impl Default for TestUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for TestUserRepository {
    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        let mut users = self.users.write().await;
        let user = User {
            id: next_id(users.iter().map(|u| u.id)),
            name: input.name.clone(),
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            password_digest: input.password_digest.clone(),
            role_id: input.role_id,
            mru_directory_path: input.mru_directory_path.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_role(&self, id: UserId, role_id: RoleId) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.role_id = role_id;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

pub struct TestCourseRepository {
    assignments: RwLock<Vec<Assignment>>,
    participants: RwLock<Vec<Participant>>,
    teams: RwLock<Vec<Team>>,
    members: RwLock<Vec<TeamMember>>,
}

impl TestCourseRepository {
    pub fn new() -> Self {
        Self {
            assignments: RwLock::new(vec![]),
            participants: RwLock::new(vec![]),
            teams: RwLock::new(vec![]),
            members: RwLock::new(vec![]),
        }
    }

    pub async fn add_assignment(&self, assignment: Assignment) {
        self.assignments.write().await.push(assignment);
    }

    pub async fn add_participant(&self, participant: Participant) {
        self.participants.write().await.push(participant);
    }

    pub async fn add_team(&self, team: Team) {
        self.teams.write().await.push(team);
    }

    /// Put a participant on a team; repeated calls are no-ops
    pub async fn add_member(&self, team_id: TeamId, participant_id: ParticipantId) {
        let mut members = self.members.write().await;
        if members
            .iter()
            .any(|m| m.team_id == team_id && m.participant_id == participant_id)
        {
            return;
        }
        let id = next_id(members.iter().map(|m| m.id));
        members.push(TeamMember {
            id,
            team_id,
            participant_id,
            created_at: Utc::now(),
        });
    }

    pub async fn remove_member(&self, team_id: TeamId, participant_id: ParticipantId) {
        self.members
            .write()
            .await
            .retain(|m| !(m.team_id == team_id && m.participant_id == participant_id));
    }
}

impl Default for TestCourseRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CourseRepository for TestCourseRepository {
    async fn create_assignment(&self, input: &CreateAssignmentInput) -> Result<Assignment> {
        let mut assignments = self.assignments.write().await;
        let mut assignment = create_test_assignment(
            next_id(assignments.iter().map(|a| a.id)),
            input.instructor_id,
            input.max_team_size,
        );
        assignment.name = input.name.clone();
        assignment.directory_path = input.directory_path.clone();
        assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn find_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn create_participant(
        &self,
        user_id: UserId,
        assignment_id: AssignmentId,
    ) -> Result<Participant> {
        let mut participants = self.participants.write().await;
        // Mirrors the UNIQUE (user_id, assignment_id) key
        if participants
            .iter()
            .any(|p| p.user_id == user_id && p.assignment_id == assignment_id)
        {
            return Err(AppError::Conflict(format!(
                "User {} is already a participant of assignment {}",
                user_id, assignment_id
            )));
        }
        let participant = create_test_participant(
            next_id(participants.iter().map(|p| p.id)),
            user_id,
            assignment_id,
        );
        participants.push(participant.clone());
        Ok(participant)
    }

    async fn find_participant(&self, id: ParticipantId) -> Result<Option<Participant>> {
        Ok(self
            .participants
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_participant_by_user(
        &self,
        user_id: UserId,
        assignment_id: AssignmentId,
    ) -> Result<Option<Participant>> {
        Ok(self
            .participants
            .read()
            .await
            .iter()
            .find(|p| p.user_id == user_id && p.assignment_id == assignment_id)
            .cloned())
    }

    async fn create_team(&self, input: &CreateTeamInput) -> Result<Team> {
        let mut teams = self.teams.write().await;
        let mut team = create_test_team(next_id(teams.iter().map(|t| t.id)), input.assignment_id);
        team.name = input.name.clone();
        teams.push(team.clone());
        Ok(team)
    }

    async fn find_team(&self, id: TeamId) -> Result<Option<Team>> {
        Ok(self.teams.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn list_team_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>> {
        Ok(self
            .members
            .read()
            .await
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn count_team_members(&self, team_id: TeamId) -> Result<i64> {
        Ok(self.list_team_members(team_id).await?.len() as i64)
    }

    async fn is_user_on_team(&self, team_id: TeamId, user_id: UserId) -> Result<bool> {
        let participants = self.participants.read().await;
        Ok(self.members.read().await.iter().any(|m| {
            m.team_id == team_id
                && participants
                    .iter()
                    .any(|p| p.id == m.participant_id && p.user_id == user_id)
        }))
    }
}

/// Join request store; `accept` writes membership into the shared course store
pub struct TestJoinTeamRequestRepository {
    requests: RwLock<Vec<JoinTeamRequest>>,
    course_repo: Arc<TestCourseRepository>,
}

impl TestJoinTeamRequestRepository {
    pub fn new(course_repo: Arc<TestCourseRepository>) -> Self {
        Self {
            requests: RwLock::new(vec![]),
            course_repo,
        }
    }

    pub async fn add_request(&self, request: JoinTeamRequest) {
        self.requests.write().await.push(request);
    }
}

#[async_trait]
impl JoinTeamRequestRepository for TestJoinTeamRequestRepository {
    async fn list(&self) -> Result<Vec<JoinTeamRequest>> {
        Ok(self.requests.read().await.clone())
    }

    async fn find_by_id(&self, id: JoinTeamRequestId) -> Result<Option<JoinTeamRequest>> {
        Ok(self
            .requests
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn create(
        &self,
        participant_id: ParticipantId,
        team_id: TeamId,
        comments: Option<String>,
        max_team_size: Option<i32>,
    ) -> Result<JoinTeamRequest> {
        // Held across the checks and the insert, like the team row lock
        let mut requests = self.requests.write().await;

        let requester = self
            .course_repo
            .find_participant(participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Participant {} not found", participant_id)))?;
        if self
            .course_repo
            .is_user_on_team(team_id, requester.user_id)
            .await?
        {
            return Err(AppError::validation(ALREADY_MEMBER_MESSAGE));
        }
        if let Some(max) = max_team_size {
            if self.course_repo.count_team_members(team_id).await? >= i64::from(max) {
                return Err(AppError::validation(TEAM_FULL_MESSAGE));
            }
        }

        let mut request =
            create_test_request(next_id(requests.iter().map(|r| r.id)), participant_id, team_id);
        request.comments = comments;
        requests.push(request.clone());
        Ok(request)
    }

    async fn update(
        &self,
        id: JoinTeamRequestId,
        changes: &JoinTeamRequestChanges,
    ) -> Result<JoinTeamRequest> {
        let mut requests = self.requests.write().await;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))?;
        if let Some(comments) = &changes.comments {
            request.comments = Some(comments.clone());
        }
        if let Some(status) = changes.status {
            request.status = status;
        }
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn accept(
        &self,
        id: JoinTeamRequestId,
        max_team_size: Option<i32>,
    ) -> Result<JoinTeamRequest> {
        let mut requests = self.requests.write().await;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))?;
        if request.status != JoinTeamRequestStatus::Pending {
            return Err(AppError::validation(ONLY_PENDING_MESSAGE));
        }

        let members = self.course_repo.list_team_members(request.team_id).await?;
        let already_member = members
            .iter()
            .any(|m| m.participant_id == request.participant_id);
        if !already_member {
            if let Some(max) = max_team_size {
                if members.len() as i64 >= i64::from(max) {
                    return Err(AppError::validation(TEAM_FULL_MESSAGE));
                }
            }
            self.course_repo
                .add_member(request.team_id, request.participant_id)
                .await;
        }

        request.status = JoinTeamRequestStatus::Accepted;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn decline(&self, id: JoinTeamRequestId) -> Result<JoinTeamRequest> {
        let mut requests = self.requests.write().await;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("JoinTeamRequest {} not found", id)))?;
        if request.status == JoinTeamRequestStatus::Accepted {
            self.course_repo
                .remove_member(request.team_id, request.participant_id)
                .await;
        }

        request.status = JoinTeamRequestStatus::Declined;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn delete(&self, id: JoinTeamRequestId) -> Result<()> {
        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|r| r.id != id);
        if requests.len() == before {
            return Err(AppError::NotFound(format!("JoinTeamRequest {} not found", id)));
        }
        Ok(())
    }
}
