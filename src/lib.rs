//! Teamjoin Core - join team request service
//!
//! Role hierarchy, authorization gate, and the REST resource through which
//! course participants ask to join, and are accepted into, assignment teams.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
