//! Mock endpoint definitions and the simulation engine
//!
//! - `registry` - resolves (method, name) to an endpoint
//! - `simulator` - per-endpoint success/failure cycle
//! - `composer` - turns an outcome into a JSON response

pub mod composer;
pub mod registry;
pub mod simulator;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::error::codes;

pub use composer::{compose, MockResponse};
pub use registry::{EndpointId, EndpointRegistry, RegistryError, RouteError};
pub use simulator::{CallCounter, CounterSnapshot, Outcome, Ratio, RatioError, RatioSimulator};

/// Methods an endpoint may accept
pub const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

/// Response returned on the success branch
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessProfile {
    pub status: StatusCode,
    pub body: Value,
}

impl Default for SuccessProfile {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "message": "success" }),
        }
    }
}

/// Body returned on the simulated failure branch
#[derive(Debug, Clone, PartialEq)]
pub enum FailureBody {
    /// `{"error":{"code":..,"message":..}}`
    Structured { code: u32, message: String },
    /// Verbatim JSON
    Custom(Value),
}

/// Response returned on the simulated failure branch
#[derive(Debug, Clone, PartialEq)]
pub struct FailureProfile {
    pub status: StatusCode,
    pub body: FailureBody,
}

impl Default for FailureProfile {
    fn default() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: FailureBody::Structured {
                code: codes::FAILED_REQUEST,
                message: "failed request".to_string(),
            },
        }
    }
}

/// A configured mock endpoint, served at `/v1/mock/{name}`
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDefinition {
    pub name: String,
    pub methods: Vec<Method>,
    pub ratio: Ratio,
    pub success: SuccessProfile,
    pub failure: FailureProfile,
    /// Delay applied before the response is written
    pub delay: Duration,
}

impl EndpointDefinition {
    /// Endpoint accepting GET and POST that never fails
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: vec![Method::GET, Method::POST],
            ratio: Ratio::ALWAYS_SUCCEED,
            success: SuccessProfile::default(),
            failure: FailureProfile::default(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Vec::new();
        for method in methods {
            if !self.methods.contains(&method) {
                self.methods.push(method);
            }
        }
        self
    }

    pub fn with_ratio(mut self, ratio: Ratio) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_success(mut self, success: SuccessProfile) -> Self {
        self.success = success;
        self
    }

    pub fn with_failure(mut self, failure: FailureProfile) -> Self {
        self.failure = failure;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

/// Normalize a configured sub-route (`/foo`, `foo`, `/foo/`) to a mock name
pub fn normalize_name(raw: &str) -> &str {
    raw.trim().trim_matches('/')
}

/// Mock names are a single path segment
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}
