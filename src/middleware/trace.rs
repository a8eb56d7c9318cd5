//! Request spans with sensitive query values redacted.

use axum::http::{Request, Uri};
use tower_http::trace::MakeSpan;
use tracing::Span;

/// Query parameter names whose values never reach the logs.
const SENSITIVE_PARAMS: &[&str] = &["access_token", "token", "jwt", "password", "api_key"];

#[derive(Clone, Debug, Default)]
pub struct SanitizedMakeSpan;

impl<B> MakeSpan<B> for SanitizedMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %sanitize_uri(request.uri()),
            version = ?request.version(),
        )
    }
}

fn redact_pair(pair: &str) -> String {
    match pair.split_once('=') {
        Some((key, _)) if SENSITIVE_PARAMS.contains(&key.to_ascii_lowercase().as_str()) => {
            format!("{key}=[REDACTED]")
        }
        _ => pair.to_string(),
    }
}

fn sanitize_uri(uri: &Uri) -> String {
    match uri.query() {
        None => uri.path().to_string(),
        Some(query) => {
            let pairs: Vec<String> = query.split('&').map(redact_pair).collect();
            format!("{}?{}", uri.path(), pairs.join("&"))
        }
    }
}
