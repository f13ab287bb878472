//! Logging setup and request failure tracking
//!
//! Failures that the client can see (malformed bodies) get a short track id,
//! returned in the error body and attached to the log line, so a client report
//! can be matched with the server logs.

use axum::http::{HeaderMap, Method, Uri};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "api_mock=info,tower_http=info";

/// Install the global tracing subscriber
pub fn init(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init(),
    }
}

/// Short identifier for log correlation
pub fn new_track_id() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// Log a client-visible request failure and return its track id
pub fn log_request_failure(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    message: &str,
    cause: Option<&dyn std::error::Error>,
) -> String {
    let track_id = new_track_id();
    let origin = headers
        .get("origin")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    match cause {
        Some(cause) => error!(
            track_id = %track_id,
            method = %method,
            uri = %uri,
            origin = %origin,
            error = %cause,
            "{message}"
        ),
        None => warn!(
            track_id = %track_id,
            method = %method,
            uri = %uri,
            origin = %origin,
            "{message}"
        ),
    }

    track_id
}
