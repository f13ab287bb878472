//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/live` - Liveness probe, always 200 while the process runs
//! - `/ready` - Readiness probe, 200 once startup has completed
//! - `/health` - Full report
//!
//! None of these consult the credential gate or the simulator.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Starting,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub ready: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub endpoints: usize,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

fn status_of(state: &AppState) -> HealthStatus {
    if state.is_ready() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Starting
    }
}

/// Full health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: status_of(&state),
        ready: state.is_ready(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        endpoints: state.registry.len(),
    })
}

/// Readiness probe endpoint
///
/// Returns 503 until configuration has been loaded and the listener is bound.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SimpleHealthResponse>) {
    let status = status_of(&state);
    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Starting => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(SimpleHealthResponse { status }))
}

/// Liveness probe endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
