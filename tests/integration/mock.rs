//! Mock endpoint integration tests
//!
//! Tests for `/v1/mock/{name}`:
//! - Credential gate (API key and bearer token schemes)
//! - Endpoint resolution
//! - Deterministic success/failure cycle

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{constants::*, with_bearer, with_key, MockTestHarness};

// =============================================================================
// Tests: Credential gate
// =============================================================================

#[tokio::test]
async fn test_missing_key_returns_401() {
    let harness = MockTestHarness::new();

    let response = harness.server.get("/v1/mock/foo").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.text().is_empty());
    assert_eq!(harness.total_calls("foo"), 0);
}

#[tokio::test]
async fn test_unknown_and_disabled_keys_return_401() {
    let harness = MockTestHarness::new();

    for key in ["wrong-key", DISABLED_API_KEY, ""] {
        let response = with_key(harness.server.get("/v1/mock/foo"), key).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
    assert_eq!(harness.total_calls("foo"), 0);
}

#[tokio::test]
async fn test_every_mock_path_is_gated() {
    let harness = MockTestHarness::new();

    // Registered, unregistered, nested and batch paths all authenticate first
    for path in [
        "/v1/mock/foo",
        "/v1/mock/nope",
        "/v1/mock/foo/extra",
        "/v1/mock/foo/",
        "/v1/mock/",
        "/v1/mock",
    ] {
        harness
            .server
            .get(path)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        harness
            .server
            .post(path)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
    harness
        .server
        .post("/v1/mock/batch")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_credential_set_denies_everything() {
    let harness = MockTestHarness::with_vars(&[("SUB_ROUTES", "foo")]);

    let response = with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_any_of_several_keys_is_accepted() {
    let harness = MockTestHarness::with_vars(&[
        ("API_KEYS", "first-key, second-key"),
        ("SUB_ROUTES", "foo"),
    ]);

    for key in ["first-key", "second-key"] {
        with_key(harness.server.get("/v1/mock/foo"), key)
            .await
            .assert_status_ok();
    }
}

#[tokio::test]
async fn test_bearer_token_scheme() {
    let harness = MockTestHarness::with_vars(&[
        ("API_TOKEN", TEST_API_TOKEN),
        ("SUB_ROUTES", "foo"),
    ]);

    let response = with_bearer(harness.server.get("/v1/mock/foo"), TEST_API_TOKEN).await;
    response.assert_status_ok();

    let response = with_bearer(harness.server.get("/v1/mock/foo"), "wrong-token").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let challenge = response.headers().get("www-authenticate").unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Bearer realm=\"api-mock\""));

    // An API key header means nothing under the bearer scheme
    let response = with_key(harness.server.get("/v1/mock/foo"), TEST_API_TOKEN).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Tests: Resolution
// =============================================================================

#[tokio::test]
async fn test_valid_key_returns_success() {
    let harness = MockTestHarness::new();

    let response = with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "message": "success" }));
}

#[tokio::test]
async fn test_unregistered_name_returns_404() {
    let harness = MockTestHarness::new();

    let response = with_key(harness.server.get("/v1/mock/baz"), TEST_API_KEY).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], 1002);
    assert_eq!(harness.total_calls("foo"), 0);
    assert_eq!(harness.total_calls("bar"), 0);
}

#[tokio::test]
async fn test_unaccepted_method_returns_404() {
    let harness = MockTestHarness::new();

    let response = with_key(harness.server.delete("/v1/mock/foo"), TEST_API_KEY).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], 1003);
    assert_eq!(harness.total_calls("foo"), 0);
}

#[tokio::test]
async fn test_paths_without_a_single_name_return_404() {
    let harness = MockTestHarness::new();

    for path in ["/v1/mock", "/v1/mock/", "/v1/mock/foo/", "/v1/mock/%FF"] {
        let response = with_key(harness.server.get(path), TEST_API_KEY).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"]["code"], 1002);
    }
    assert_eq!(harness.total_calls("foo"), 0);
}

#[tokio::test]
async fn test_configured_methods() {
    let harness = MockTestHarness::with_vars(&[
        ("API_KEY", TEST_API_KEY),
        ("SUB_ROUTES", "foo"),
        ("METHODS", "put,patch"),
    ]);

    with_key(harness.server.put("/v1/mock/foo"), TEST_API_KEY)
        .await
        .assert_status_ok();
    with_key(harness.server.patch("/v1/mock/foo"), TEST_API_KEY)
        .await
        .assert_status_ok();
    with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_top_level_path() {
    let harness = MockTestHarness::new();

    let response = harness.server.get("/v2/other").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": { "code": 1002, "message": "not found" } })
    );
}

// =============================================================================
// Tests: Ratio simulation
// =============================================================================

#[tokio::test]
async fn test_success_then_failure_shares_counter_across_methods() {
    let harness = MockTestHarness::new();

    let response = with_key(harness.server.get("/v1/mock/bar"), TEST_API_KEY).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "message": "success" }));

    let response = with_key(harness.server.post("/v1/mock/bar"), TEST_API_KEY).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": { "code": 1005, "message": "failed request" } })
    );
}

#[tokio::test]
async fn test_endpoints_have_independent_counters() {
    let harness = MockTestHarness::new();

    with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY)
        .await
        .assert_status_ok();
    // bar is still at the start of its own cycle
    with_key(harness.server.get("/v1/mock/bar"), TEST_API_KEY)
        .await
        .assert_status_ok();
    with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(harness.total_calls("foo"), 2);
    assert_eq!(harness.total_calls("bar"), 1);
}

#[tokio::test]
async fn test_outcomes_repeat_every_cycle() {
    // 0.3 success ratio: cycle of 10 calls with 7 failures
    let harness = MockTestHarness::with_vars(&[
        ("API_KEY", TEST_API_KEY),
        ("SUB_ROUTES", "foo"),
        ("SUCCESS_RATIO", "0.3"),
    ]);
    let cycle = 10;

    let mut statuses = Vec::new();
    for _ in 0..2 * cycle {
        let response = with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY).await;
        statuses.push(response.status_code());
    }

    assert_eq!(&statuses[..cycle], &statuses[cycle..]);
    let failures = statuses[..cycle]
        .iter()
        .filter(|status| **status == StatusCode::BAD_REQUEST)
        .count();
    assert_eq!(failures, 7);
    assert_eq!(statuses[cycle - 1], StatusCode::BAD_REQUEST);
    assert_eq!(harness.total_calls("foo"), 2 * cycle as u64);
}

#[tokio::test]
async fn test_always_succeeds_without_ratio() {
    let harness = MockTestHarness::with_vars(&[("API_KEY", TEST_API_KEY), ("SUB_ROUTES", "foo")]);

    for _ in 0..20 {
        with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY)
            .await
            .assert_status_ok();
    }
}

#[tokio::test]
async fn test_custom_profiles() {
    let harness = MockTestHarness::with_vars(&[
        ("API_KEY", TEST_API_KEY),
        ("SUB_ROUTES", "foo,qux"),
        ("SUCCESS_RATIO", "0.5"),
        ("SUCCESS_RESP_CODE", "201"),
        ("SUCCESS_RESP_BODY", r#"{"id": 42}"#),
        ("FAILURE_RESP_CODE", "503"),
        ("FAILURE_ERROR_CODE", "2001"),
        ("FAILURE_ERROR_MESSAGE", "upstream unavailable"),
    ]);

    let response = with_key(harness.server.post("/v1/mock/foo"), TEST_API_KEY).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>(), json!({ "id": 42 }));

    let response = with_key(harness.server.post("/v1/mock/foo"), TEST_API_KEY).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": { "code": 2001, "message": "upstream unavailable" } })
    );
}

#[tokio::test]
async fn test_custom_failure_body() {
    let harness = MockTestHarness::with_vars(&[
        ("API_KEY", TEST_API_KEY),
        ("SUB_ROUTES", "foo"),
        ("SUCCESS_RATIO", "0.5"),
        ("FAILURE_RESP_BODY", r#"{"status": "down"}"#),
    ]);

    with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY)
        .await
        .assert_status_ok();
    let response = with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "status": "down" }));
}

#[tokio::test]
async fn test_response_delay() {
    let harness = MockTestHarness::with_vars(&[
        ("API_KEY", TEST_API_KEY),
        ("SUB_ROUTES", "foo"),
        ("RESP_DELAY", "50"),
    ]);

    let started = std::time::Instant::now();
    with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY)
        .await
        .assert_status_ok();
    assert!(started.elapsed() >= std::time::Duration::from_millis(50));
}
