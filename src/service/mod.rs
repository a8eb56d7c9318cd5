//! Business logic layer

pub mod course;
pub mod join_team_request;
pub mod role;
pub mod user;

pub use course::CourseService;
pub use join_team_request::JoinTeamRequestService;
pub use role::RoleService;
pub use user::UserService;
