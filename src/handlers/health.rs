use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

use crate::{db, ApiResponse, AppState};

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusInfo {
    pub service: String,
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
    pub environment: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthInfo {
    pub status: String,
    pub database: String,
    pub latency_ms: u64,
    pub timestamp: String,
}

/// `GET /status`
#[utoipa::path(
    get,
    path = "/status",
    summary = "Service status",
    responses((status = 200, description = "Build and runtime information", body = ApiResponse<StatusInfo>))
)]
pub async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<StatusInfo>> {
    Json(ApiResponse::success(StatusInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_time: env!("BUILD_TIME").to_string(),
        environment: state.config.environment.clone(),
        uptime_secs: uptime_secs(),
    }))
}

/// `GET /health`: 200 when the database answers, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service healthy", body = ApiResponse<HealthInfo>),
        (status = 503, description = "Database unreachable", body = ApiResponse<HealthInfo>)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let database = db::check_connection(&state.db).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (status, label, db_label) = match &database {
        Ok(()) => (StatusCode::OK, "healthy", "up".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "down".to_string())
        }
    };

    (
        status,
        Json(ApiResponse::success(HealthInfo {
            status: label.to_string(),
            database: db_label,
            latency_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })),
    )
}
