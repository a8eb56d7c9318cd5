//! Domain models for Teamjoin Core

pub mod course;
pub mod join_team_request;
pub mod role;
pub mod user;

pub use course::*;
pub use join_team_request::*;
pub use role::*;
pub use user::*;
