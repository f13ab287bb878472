//! Debug endpoint integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{constants::TEST_API_KEY, with_key, MockTestHarness};

const DEBUG_VARS: &[(&str, &str)] = &[
    ("API_KEY", TEST_API_KEY),
    ("SUB_ROUTES", "foo"),
    ("SUCCESS_RATIO", "0.75"),
    ("MOCK_DEBUG", "true"),
];

#[tokio::test]
async fn test_counters_return_404_when_disabled() {
    let harness = MockTestHarness::new();

    let response = with_key(harness.server.get("/debug/counters"), TEST_API_KEY).await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_counters_require_credentials() {
    let harness = MockTestHarness::with_vars(DEBUG_VARS);

    let response = harness.server.get("/debug/counters").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_counters_report_state_without_advancing() {
    let harness = MockTestHarness::with_vars(DEBUG_VARS);

    for _ in 0..5 {
        with_key(harness.server.get("/v1/mock/foo"), TEST_API_KEY).await;
    }

    for _ in 0..2 {
        let response = with_key(harness.server.get("/debug/counters"), TEST_API_KEY).await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!([{
                "name": "foo",
                "methods": ["GET", "POST"],
                "cycle_length": 4,
                "failures_per_cycle": 1,
                "total_calls": 5,
                "position": 1,
            }])
        );
    }
}
