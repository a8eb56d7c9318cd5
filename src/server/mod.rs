//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::middleware::{ObservabilityLayer, SanitizedMakeSpan};
use crate::migration;
use crate::repository::{
    course::CourseRepositoryImpl, join_team_request::JoinTeamRequestRepositoryImpl,
    role::RoleRepositoryImpl, user::UserRepositoryImpl,
};
use crate::service::{CourseService, JoinTeamRequestService, RoleService, UserService};
use crate::state::HasServices;
use crate::telemetry;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub user_service: Arc<UserService<UserRepositoryImpl>>,
    pub course_service: Arc<CourseService<CourseRepositoryImpl, UserRepositoryImpl>>,
    pub join_team_request_service:
        Arc<JoinTeamRequestService<JoinTeamRequestRepositoryImpl, CourseRepositoryImpl>>,
    pub jwt_manager: JwtManager,
}

impl HasServices for AppState {
    type UserRepo = UserRepositoryImpl;
    type CourseRepo = CourseRepositoryImpl;
    type JoinTeamRequestRepo = JoinTeamRequestRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn user_service(&self) -> &UserService<Self::UserRepo> {
        &self.user_service
    }

    fn course_service(&self) -> &CourseService<Self::CourseRepo, Self::UserRepo> {
        &self.course_service
    }

    fn join_team_request_service(
        &self,
    ) -> &JoinTeamRequestService<Self::JoinTeamRequestRepo, Self::CourseRepo> {
        &self.join_team_request_service
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .is_ok()
    }
}

/// Create the database connection pool
pub async fn connect_pool(config: &Config) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")
}

/// Build the application state on top of an open pool.
///
/// Seeds the canonical role hierarchy before any service is handed the
/// hierarchy, so every request sees the same ordering.
pub async fn build_state(config: Config, db_pool: MySqlPool) -> Result<AppState> {
    let role_repo = Arc::new(RoleRepositoryImpl::new(db_pool.clone()));
    let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
    let course_repo = Arc::new(CourseRepositoryImpl::new(db_pool.clone()));
    let join_team_request_repo = Arc::new(JoinTeamRequestRepositoryImpl::new(db_pool.clone()));

    let hierarchy = Arc::new(
        RoleService::new(role_repo)
            .seed_hierarchy()
            .await
            .context("Failed to seed role hierarchy")?,
    );
    info!(roles = hierarchy.len(), "Role hierarchy loaded");

    let jwt_manager = JwtManager::new(config.jwt.clone());

    let user_service = Arc::new(UserService::new(user_repo.clone(), hierarchy.clone()));
    let course_service = Arc::new(CourseService::new(
        course_repo.clone(),
        user_repo,
        hierarchy.clone(),
    ));
    let join_team_request_service = Arc::new(JoinTeamRequestService::new(
        join_team_request_repo,
        course_repo,
        hierarchy,
    ));

    Ok(AppState {
        config: Arc::new(config),
        db_pool,
        user_service,
        course_service,
        join_team_request_service,
        jwt_manager,
    })
}

/// Run the server
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    migration::run_migrations(&config).await?;

    let db_pool = connect_pool(&config).await?;
    info!("Connected to database");

    if prometheus_handle.is_some() {
        telemetry::metrics::spawn_pool_metrics(db_pool.clone(), Duration::from_secs(15));
    }

    let http_addr = config.http_addr();
    let state = build_state(config, db_pool.clone()).await?;
    let app = build_router(state).merge(metrics_router(prometheus_handle));

    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;
    info!("HTTP server started on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// `/metrics` carries its own state so the main router stays generic
pub fn metrics_router(handle: Option<PrometheusHandle>) -> Router {
    Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(handle))
}

/// Build the HTTP router with generic state type
///
/// Works with both the production `AppState` and test states that implement
/// `HasServices`.
pub fn build_router<S: HasServices>(state: S) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .route(
            "/api/v1/join_team_requests",
            get(api::join_team_request::list::<S>).post(api::join_team_request::create::<S>),
        )
        .route(
            "/api/v1/join_team_requests/{id}",
            get(api::join_team_request::show::<S>)
                .put(api::join_team_request::update::<S>)
                .patch(api::join_team_request::update::<S>)
                .delete(api::join_team_request::delete::<S>),
        )
        .route(
            "/api/v1/join_team_requests/decline/{id}",
            post(api::join_team_request::decline::<S>),
        )
        .route(
            "/api/v1/join_team_requests/accept/{id}",
            post(api::join_team_request::accept::<S>),
        )
        .layer(ObservabilityLayer)
        .layer(TraceLayer::new_for_http().make_span_with(SanitizedMakeSpan))
        .layer(cors)
        .with_state(state)
}
