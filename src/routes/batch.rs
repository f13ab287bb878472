//! Batch mock endpoint
//!
//! `POST /v1/mock/batch` takes a form field `batch` holding a JSON array of
//! sub-requests. Each item is resolved on its own and draws one outcome from
//! its endpoint's counter, in array order.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{HeaderMap, Method, Uri},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    endpoints::{compose, normalize_name},
    error::{AppError, AppResult},
    logging::log_request_failure,
    routes::mock::{route_error, simulate},
    AppState,
};

/// Form body of a batch request
#[derive(Debug, Deserialize)]
pub struct BatchForm {
    pub batch: String,
}

/// One sub-request of a batch
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    pub method: String,
    pub relative_url: String,
    #[serde(default)]
    pub body: Option<Value>,
}

/// Result of one sub-request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub code: u16,
    /// Serialized JSON body
    pub body: String,
}

/// Handle a batch of mock calls
#[instrument(skip_all)]
pub async fn handle_batch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    form: Result<Form<BatchForm>, FormRejection>,
) -> AppResult<Json<Vec<BatchResponse>>> {
    let invalid_body = |message: &str, cause: &dyn std::error::Error| AppError::InvalidBody {
        message: message.to_string(),
        track_id: log_request_failure(&method, &uri, &headers, message, Some(cause)),
    };

    let Form(form) = form.map_err(|e| invalid_body("batch form parsing error", &e))?;
    let items: Vec<BatchItem> = serde_json::from_str(&form.batch)
        .map_err(|e| invalid_body("batch items parsing error", &e))?;

    debug!(items = items.len(), "Processing batch request");

    let responses = items
        .iter()
        .map(|item| run_item(&state, item))
        .collect();

    Ok(Json(responses))
}

fn run_item(state: &AppState, item: &BatchItem) -> BatchResponse {
    let name = normalize_name(&item.relative_url);
    let method = match Method::from_bytes(item.method.trim().to_ascii_uppercase().as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            return error_item(&AppError::MethodNotAllowed {
                method: item.method.clone(),
                name: name.to_string(),
            })
        }
    };

    let result = state
        .registry
        .resolve(&method, name)
        .map_err(|e| route_error(e, &method, name))
        .and_then(|(id, endpoint)| {
            simulate(state, id, endpoint).map(|outcome| compose(outcome, endpoint))
        });

    match result {
        Ok(response) => BatchResponse {
            code: response.status.as_u16(),
            body: response.body_string(),
        },
        Err(error) => {
            debug!(method = %method, name, error = %error, "Batch item did not resolve");
            error_item(&error)
        }
    }
}

fn error_item(error: &AppError) -> BatchResponse {
    let (status, body) = error.status_and_body();
    BatchResponse {
        code: status.as_u16(),
        body: body
            .and_then(|body| serde_json::to_string(&body).ok())
            .unwrap_or_default(),
    }
}
