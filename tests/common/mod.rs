//! Common test utilities for the mock server
//!
//! The harness builds the real router from an environment-style variable list,
//! so configuration parsing is exercised the same way the binary does it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use api_mock::{routes, AppState, Config};
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};

/// Test configuration constants
pub mod constants {
    /// Accepted API key
    pub const TEST_API_KEY: &str = "some-api-key";
    /// Key that is configured but disabled
    pub const DISABLED_API_KEY: &str = "disabled-api-key";
    /// Accepted bearer token
    pub const TEST_API_TOKEN: &str = "some-api-token";
}

/// Variables shared by most tests: one key, two endpoints failing every second call
pub const DEFAULT_VARS: &[(&str, &str)] = &[
    ("API_KEY", constants::TEST_API_KEY),
    ("DISABLED_API_KEYS", constants::DISABLED_API_KEY),
    ("SUB_ROUTES", "foo,bar"),
    ("SUCCESS_RATIO", "0.5"),
];

/// Running mock server plus a handle on its state
pub struct MockTestHarness {
    pub server: TestServer,
    pub state: Arc<AppState>,
}

impl MockTestHarness {
    /// Harness over [`DEFAULT_VARS`], already marked ready
    pub fn new() -> Self {
        Self::with_vars(DEFAULT_VARS)
    }

    /// Harness over the given variables, already marked ready
    pub fn with_vars(vars: &[(&str, &str)]) -> Self {
        let harness = Self::starting(vars);
        harness.state.mark_ready();
        harness
    }

    /// Harness whose startup has not completed yet
    pub fn starting(vars: &[(&str, &str)]) -> Self {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_lookup(|key| vars.get(key).cloned())
            .expect("Failed to load test configuration");
        let state = Arc::new(AppState::new(config).expect("Failed to build app state"));
        let server = TestServer::new(routes::create_router(state.clone()))
            .expect("Failed to create test server");

        Self { server, state }
    }

    /// Total calls observed by an endpoint's counter
    pub fn total_calls(&self, name: &str) -> u64 {
        let id = self.state.registry.id_of(name).expect("unknown endpoint");
        self.state
            .simulator
            .snapshot(id)
            .expect("missing counter")
            .total_calls
    }
}

/// Attach the `X-API-KEY` header
pub fn with_key(request: TestRequest, key: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_str(key).expect("invalid header value"),
    )
}

/// Attach an `Authorization: Bearer` header
pub fn with_bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {token}")).expect("invalid header value"),
    )
}
