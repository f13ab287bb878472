//! Authentication middleware
//!
//! Checks the presented credential against the configured set before any mock
//! logic runs. Denied requests never reach the registry or the simulator.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument};

use crate::{
    credentials::{extract_bearer_token, fingerprint, AuthDecision, AuthScheme, API_KEY_HEADER},
    error::AppError,
    routes::metrics,
    AppState,
};

/// Credential presented by the client, according to the configured scheme
pub fn presented_credential(scheme: AuthScheme, headers: &HeaderMap) -> Option<&str> {
    match scheme {
        AuthScheme::ApiKey => headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok()),
        AuthScheme::BearerToken => headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token),
    }
}

/// Authentication middleware
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = state.credentials();
    let scheme = credentials.scheme();
    let presented = presented_credential(scheme, request.headers());

    match credentials.authenticate(presented) {
        AuthDecision::Allow => {
            debug!(
                credential = %presented.map(fingerprint).unwrap_or_default(),
                "Request authenticated"
            );
            Ok(next.run(request).await)
        }
        AuthDecision::Deny => {
            debug!(
                scheme = scheme.as_str(),
                presented = presented.is_some(),
                "Request rejected by credential gate"
            );
            metrics::record_auth_denied();
            match scheme {
                AuthScheme::ApiKey => Err(AppError::Unauthorized),
                AuthScheme::BearerToken => Err(AppError::InvalidToken),
            }
        }
    }
}
