//! Health check handlers

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::config::Config;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Readiness of the database plus the outbound and background wiring
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub mail: &'static str,
    pub reaper: JobStatus,
    pub notifier: JobStatus,
}

/// Scheduling of one background job
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

impl JobStatus {
    fn from_interval(interval: Option<Duration>) -> Self {
        Self {
            enabled: interval.is_some(),
            interval_secs: interval.map(|d| d.as_secs()),
        }
    }
}

impl ReadyResponse {
    fn connected(config: &Config) -> Self {
        Self {
            status: "ready",
            database: "connected",
            mail: if config.smtp.is_some() { "smtp" } else { "log" },
            reaper: JobStatus::from_interval(config.reaper_interval),
            notifier: JobStatus::from_interval(config.notifier_interval),
        }
    }
}

/// Liveness probe - always returns OK if the service is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe - checks database connectivity and reports job scheduling
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, StatusCode> {
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.pool).await {
        tracing::error!(error = ?e, "Database health check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(ReadyResponse::connected(&state.config)))
}
