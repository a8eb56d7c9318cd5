//! Scrape endpoint for the join team request counters and the pool gauges
//!
//! The router always mounts `/metrics`; whether it renders anything depends on
//! `METRICS_ENABLED` at startup. With metrics off there is no recorder handle
//! and the route answers 404, so a scraper pointed at a disabled instance
//! fails loudly instead of reading an empty page.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Handle installed by `telemetry::init`, absent when metrics are disabled
pub type MetricsState = Arc<Option<PrometheusHandle>>;

pub const METRICS_DISABLED_MESSAGE: &str = "Metrics not enabled";

pub async fn metrics_handler(State(recorder): State<MetricsState>) -> impl IntoResponse {
    let Some(recorder) = recorder.as_ref() else {
        return (StatusCode::NOT_FOUND, METRICS_DISABLED_MESSAGE.to_string());
    };
    (StatusCode::OK, recorder.render())
}
