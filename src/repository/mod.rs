//! Data access layer (Repository pattern)

pub mod course;
pub mod fault;
pub mod join_team_request;
pub mod role;
pub mod user;

pub use course::CourseRepository;
pub use fault::FaultInjectingJoinTeamRequestRepository;
pub use join_team_request::JoinTeamRequestRepository;
pub use role::RoleRepository;
pub use user::UserRepository;
