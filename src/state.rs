//! Application state trait for dependency injection
//!
//! Handlers are generic over `HasServices`, so the same router serves the
//! production `AppState` and the in-memory state used by the HTTP tests.

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::repository::{CourseRepository, JoinTeamRequestRepository, UserRepository};
use crate::service::{CourseService, JoinTeamRequestService, UserService};

pub trait HasServices: Clone + Send + Sync + 'static {
    type UserRepo: UserRepository;
    type CourseRepo: CourseRepository;
    type JoinTeamRequestRepo: JoinTeamRequestRepository;

    fn config(&self) -> &Config;

    fn user_service(&self) -> &UserService<Self::UserRepo>;

    fn course_service(&self) -> &CourseService<Self::CourseRepo, Self::UserRepo>;

    fn join_team_request_service(
        &self,
    ) -> &JoinTeamRequestService<Self::JoinTeamRequestRepo, Self::CourseRepo>;

    fn jwt_manager(&self) -> &JwtManager;

    /// Whether the backing store answers
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
