//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

use crate::endpoints::Outcome;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<Option<PrometheusHandle>> = Lazy::new(|| {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "api_mock_requests_total",
        "Mock requests answered, by endpoint and outcome"
    );
    metrics::describe_counter!(
        "api_mock_auth_denied_total",
        "Requests rejected by the credential gate"
    );
    metrics::describe_counter!(
        "api_mock_rate_limited_total",
        "Requests rejected by the rate limiter"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record one simulated call
pub fn record_outcome(endpoint: &str, outcome: Outcome) {
    metrics::counter!(
        "api_mock_requests_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a credential rejection
pub fn record_auth_denied() {
    metrics::counter!("api_mock_auth_denied_total").increment(1);
}

/// Record a rate limit rejection
pub fn record_rate_limited() {
    metrics::counter!("api_mock_rate_limited_total").increment(1);
}
