//! Prometheus recorder and metric descriptions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::MySqlPool;
use std::time::Duration;

/// Latency buckets in seconds
const BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .set_buckets(BUCKETS)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register HELP/TYPE lines and zero values so every series is visible from startup.
pub fn describe_metrics() {
    describe_counter!("teamjoin_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "teamjoin_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "teamjoin_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    describe_counter!(
        "teamjoin_join_team_request_operations_total",
        "Join team request operations by operation and result"
    );
    describe_histogram!(
        "teamjoin_join_team_request_operation_duration_seconds",
        "Join team request operation duration in seconds"
    );

    describe_gauge!(
        "teamjoin_db_pool_connections_active",
        "Number of active database connections"
    );
    describe_gauge!(
        "teamjoin_db_pool_connections_idle",
        "Number of idle database connections"
    );

    for operation in ["list", "create", "show", "update", "decline", "accept", "delete"] {
        counter!(
            "teamjoin_join_team_request_operations_total",
            "operation" => operation,
            "result" => "success"
        )
        .absolute(0);
    }
}

/// Sample pool gauges every `interval` until the pool is closed
pub fn spawn_pool_metrics(pool: MySqlPool, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        while !pool.is_closed() {
            ticker.tick().await;
            let idle = pool.num_idle() as f64;
            let size = f64::from(pool.size());
            gauge!("teamjoin_db_pool_connections_idle").set(idle);
            gauge!("teamjoin_db_pool_connections_active").set((size - idle).max(0.0));
        }
    })
}
