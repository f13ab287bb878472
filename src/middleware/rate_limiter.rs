//! Rate limiting middleware
//!
//! A single GCRA limiter (`RATE_LIMIT` requests per second) guards the mock
//! surface. Rejected requests never reach the simulator, so they do not move
//! any endpoint counter.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::clock::{Clock, DefaultClock};
use serde_json::Value;
use tracing::warn;

use crate::{routes::metrics, AppState};

/// Seconds to advertise in `Retry-After`, never less than one
pub fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// Build a 429 Too Many Requests response
pub fn rate_limit_exceeded_response(body: &Value, wait: Duration) -> Response {
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body.clone())).into_response();
    response.headers_mut().insert(
        header::RETRY_AFTER,
        HeaderValue::from(retry_after_secs(wait)),
    );
    response
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    match state.rate_limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            warn!(
                path = %request.uri().path(),
                limit = state.config.rate_limit.get(),
                retry_after_ms = wait.as_millis() as u64,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited();
            rate_limit_exceeded_response(&state.config.rate_exceeded_body, wait)
        }
    }
}
