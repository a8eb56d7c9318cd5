//! HTTP middleware for Teamjoin Core
//!
//! - `AuthUser` extractor (bearer JWT → user → role)
//! - sanitized request spans for `TraceLayer`
//! - request id propagation and HTTP metrics

pub mod auth;
pub mod metrics;
pub mod trace;

pub use auth::{AuthError, AuthUser};
pub use self::metrics::ObservabilityLayer;
pub use trace::SanitizedMakeSpan;
