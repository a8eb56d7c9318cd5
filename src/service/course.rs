//! Assignment, enrollment and team management

use crate::domain::role::INSTRUCTOR;
use crate::domain::{
    Assignment, AssignmentId, CreateAssignmentInput, CreateTeamInput, Participant, RoleHierarchy,
    Team, TeamId, TeamMember, UserId,
};
use crate::error::{AppError, Result};
use crate::repository::{CourseRepository, UserRepository};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct CourseService<C: CourseRepository, U: UserRepository> {
    repo: Arc<C>,
    user_repo: Arc<U>,
    hierarchy: Arc<RoleHierarchy>,
}

impl<C: CourseRepository, U: UserRepository> CourseService<C, U> {
    pub fn new(repo: Arc<C>, user_repo: Arc<U>, hierarchy: Arc<RoleHierarchy>) -> Self {
        Self {
            repo,
            user_repo,
            hierarchy,
        }
    }

    /// Create an assignment owned by an instructor-or-above
    pub async fn create_assignment(&self, input: CreateAssignmentInput) -> Result<Assignment> {
        input.validate()?;

        let instructor = self
            .user_repo
            .find_by_id(input.instructor_id)
            .await?
            .ok_or_else(|| AppError::validation("Instructor must exist"))?;

        let qualifies = self
            .hierarchy
            .name_of(instructor.role_id)
            .is_some_and(|role| self.hierarchy.is_at_least(role, INSTRUCTOR));
        if !qualifies {
            return Err(AppError::validation(
                "Instructor must be an instructor or above",
            ));
        }

        let assignment = self.repo.create_assignment(&input).await?;
        info!(assignment_id = assignment.id, instructor_id = instructor.id, "Created assignment");
        Ok(assignment)
    }

    pub async fn get_assignment(&self, id: AssignmentId) -> Result<Assignment> {
        self.repo
            .find_assignment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
    }

    /// Enroll a user; each (user, assignment) pair may exist once
    pub async fn enroll(&self, user_id: UserId, assignment_id: AssignmentId) -> Result<Participant> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        self.get_assignment(assignment_id).await?;

        if self
            .repo
            .find_participant_by_user(user_id, assignment_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "User {} is already a participant of assignment {}",
                user_id, assignment_id
            )));
        }

        self.repo.create_participant(user_id, assignment_id).await
    }

    pub async fn create_team(&self, input: CreateTeamInput) -> Result<Team> {
        input.validate()?;
        self.get_assignment(input.assignment_id).await?;
        self.repo.create_team(&input).await
    }

    pub async fn team_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>> {
        self.repo
            .find_team(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", team_id)))?;
        self.repo.list_team_members(team_id).await
    }
}
