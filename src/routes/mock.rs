//! Mock endpoint handler
//!
//! `/v1/mock/{name}`: resolve the endpoint, draw the next outcome from its
//! counter and compose the response. Authentication and rate limiting have
//! already run as middleware by the time a request gets here.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{rejection::PathRejection, OriginalUri, Path, State},
    http::Method,
};
use tracing::{debug, instrument};

use crate::{
    endpoints::{compose, EndpointDefinition, EndpointId, MockResponse, Outcome, RouteError},
    error::{AppError, AppResult},
    routes::metrics,
    AppState,
};

/// Map a failed registry lookup to its HTTP error
pub fn route_error(error: RouteError, method: &Method, name: &str) -> AppError {
    match error {
        RouteError::NotFound => AppError::NotFound(name.to_string()),
        RouteError::MethodNotAllowed => AppError::MethodNotAllowed {
            method: method.to_string(),
            name: name.to_string(),
        },
    }
}

/// Draw one outcome for a resolved endpoint and record it
pub fn simulate(
    state: &AppState,
    id: EndpointId,
    endpoint: &EndpointDefinition,
) -> AppResult<Outcome> {
    let outcome = state
        .simulator
        .next_outcome(id)
        .ok_or_else(|| {
            AppError::Internal(anyhow!("no call counter for mock endpoint {}", endpoint.name))
        })?;
    metrics::record_outcome(&endpoint.name, outcome);
    Ok(outcome)
}

/// Handle a call to a mock endpoint
#[instrument(skip_all, fields(method = %method, name = tracing::field::Empty, outcome = tracing::field::Empty))]
pub async fn handle_mock(
    State(state): State<Arc<AppState>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    name: Result<Path<String>, PathRejection>,
) -> AppResult<MockResponse> {
    // A name that does not decode cannot match any endpoint
    let Path(name) = name.map_err(|e| {
        debug!(error = %e, "Undecodable mock endpoint name");
        AppError::NotFound(uri.path().to_string())
    })?;
    tracing::Span::current().record("name", name.as_str());

    let (id, endpoint) = state
        .registry
        .resolve(&method, &name)
        .map_err(|e| route_error(e, &method, &name))?;

    let outcome = simulate(&state, id, endpoint)?;
    tracing::Span::current().record("outcome", outcome.as_str());

    if !endpoint.delay.is_zero() {
        debug!(delay_ms = endpoint.delay.as_millis() as u64, "Delaying mock response");
        tokio::time::sleep(endpoint.delay).await;
    }

    Ok(compose(outcome, endpoint))
}

/// Any other path under the mock prefix
pub async fn unknown_mock_path(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
