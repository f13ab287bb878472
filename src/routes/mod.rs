//! HTTP routes for the mock service
//!
//! This module defines all HTTP endpoints exposed by the service.

pub mod batch;
pub mod debug;
pub mod health;
pub mod metrics;
pub mod mock;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::OriginalUri,
    http::{header::HeaderName, Method},
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    credentials::API_KEY_HEADER,
    error::AppError,
    middleware::{auth::auth_middleware, rate_limiter::rate_limit_middleware},
    AppState,
};

/// Upper bound for serving one request, response delay included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut methods = state.registry.methods();
    if !methods.contains(&Method::POST) {
        methods.push(Method::POST);
    }

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .allow_headers([
            axum::http::header::ACCEPT,
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(300));

    // Every path under the prefix lands here, unmatched ones on the nested fallback
    let mock_routes = Router::new()
        .route(
            "/batch",
            post(batch::handle_batch).fallback(method_not_allowed),
        )
        .route("/:name", any(mock::handle_mock))
        .fallback(mock::unknown_mock_path);

    let mut protected_routes = Router::new().nest("/v1/mock", mock_routes);

    if state.config.debug_enabled {
        protected_routes = protected_routes.route("/debug/counters", get(debug::counters));
    }

    // Routes that require authentication and rate limiting
    // Middleware is applied in reverse order (last applied runs first)
    // So: auth runs first, then rate limiting
    let protected_routes = protected_routes
        // Apply rate limiting (runs after auth)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        // Apply authentication (runs first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes (health checks, metrics) - no auth required
    let public_routes = Router::new()
        .route("/live", get(health::liveness_check))
        .route("/ready", get(health::readiness_check))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        // Global middleware (applied to all routes)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: axum::http::Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::MethodNotAllowed {
        method: method.to_string(),
        name: uri.path().to_string(),
    }
}
