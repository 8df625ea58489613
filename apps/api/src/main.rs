//! Rotaplan API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rotaplan_application::{
    AuditLogService, IdentityVerifier, InviteService, LeaveService, OrgService, ScheduleService,
};
use rotaplan_core::AppError;
use rotaplan_infrastructure::{
    HttpIdentityVerifier, PostgresAuditLogRepository, PostgresInviteRepository,
    PostgresLeaveRepository, PostgresOrgRepository, PostgresScheduleRepository,
    StaticIdentityVerifier,
};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let identity_verifier = build_identity_verifier()?;

    let org_repository = Arc::new(PostgresOrgRepository::new(pool.clone()));
    let invite_repository = Arc::new(PostgresInviteRepository::new(pool.clone()));
    let leave_repository = Arc::new(PostgresLeaveRepository::new(pool.clone()));
    let schedule_repository = Arc::new(PostgresScheduleRepository::new(pool.clone()));
    let audit_log_repository = Arc::new(PostgresAuditLogRepository::new(pool.clone()));

    let state = AppState {
        org_service: OrgService::new(org_repository.clone()),
        invite_service: InviteService::new(invite_repository, org_repository.clone()),
        leave_service: LeaveService::new(leave_repository, org_repository.clone()),
        schedule_service: ScheduleService::new(schedule_repository, org_repository.clone()),
        audit_log_service: AuditLogService::new(audit_log_repository, org_repository),
        identity_verifier,
    };

    let cors_origin = frontend_url.parse::<HeaderValue>().map_err(|error| {
        AppError::Validation(format!("invalid FRONTEND_URL '{frontend_url}': {error}"))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let authenticated = Router::new()
        .route("/api/orgs", post(handlers::create_org))
        .route("/api/orgs/{org_id}/invites", post(handlers::invite_user))
        .route("/api/invites/redeem", post(handlers::redeem_invite))
        .route(
            "/api/orgs/{org_id}/leave-requests",
            post(handlers::submit_leave),
        )
        .route(
            "/api/orgs/{org_id}/leave-requests/{request_id}/decision",
            post(handlers::decide_leave),
        )
        .route(
            "/api/orgs/{org_id}/leave-requests/{request_id}/cancel",
            post(handlers::cancel_leave),
        )
        .route("/api/orgs/{org_id}/schedules", post(handlers::create_schedule))
        .route(
            "/api/orgs/{org_id}/schedules/{schedule_id}/days/{day_id}/assignments",
            post(handlers::assign_shift),
        )
        .route("/api/orgs/{org_id}/audit-log", get(handlers::list_audit_log))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(authenticated)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Validation(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::new(host, api_port);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "rotaplan-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}

fn build_identity_verifier() -> Result<Arc<dyn IdentityVerifier>, AppError> {
    let provider = env::var("IDENTITY_PROVIDER").unwrap_or_else(|_| "static".to_owned());

    match provider.as_str() {
        "http" => {
            let introspection_url = required_env("IDENTITY_INTROSPECTION_URL")?;
            let http_client = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build HTTP client: {error}"))
                })?;
            Ok(Arc::new(HttpIdentityVerifier::new(
                http_client,
                introspection_url,
            )))
        }
        "static" => Ok(Arc::new(StaticIdentityVerifier::new())),
        other => Err(AppError::Validation(format!(
            "IDENTITY_PROVIDER must be 'http' or 'static', got '{other}'"
        ))),
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::Validation(format!("missing required environment variable {name}")))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
