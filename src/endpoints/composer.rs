//! Response composer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::{EndpointDefinition, FailureBody, Outcome};

/// Status and body for one mock call
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl MockResponse {
    /// Serialized body, as written on the wire
    pub fn body_string(&self) -> String {
        self.body.to_string()
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build the response for an outcome. Pure: no state, no randomness.
pub fn compose(outcome: Outcome, endpoint: &EndpointDefinition) -> MockResponse {
    match outcome {
        Outcome::Success => MockResponse {
            status: endpoint.success.status,
            body: endpoint.success.body.clone(),
        },
        Outcome::SimulatedFailure => MockResponse {
            status: endpoint.failure.status,
            body: failure_body(&endpoint.failure.body),
        },
    }
}

fn failure_body(body: &FailureBody) -> Value {
    match body {
        FailureBody::Structured { code, message } => {
            json!({ "error": { "code": code, "message": message } })
        }
        FailureBody::Custom(value) => value.clone(),
    }
}
