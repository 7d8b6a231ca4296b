//! Wire contract of the blocking HTTP client against a local mock service.
//!
//! These tests are plain `#[test]` functions on purpose: the blocking client
//! must work without any async runtime on the caller side.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use mock_waii_service::MockWaiiService;
use serde_json::json;
use waii_sdk::client::common::{CommonRequest, CommonResponse};
use waii_sdk::http::client::{ApiError, WaiiHttpClient};

/// Each mock binds its own port, so each test gets its own registry entry.
fn scoped_client(mock: &MockWaiiService, api_key: &str) -> Arc<WaiiHttpClient> {
    let client = WaiiHttpClient::get_or_create(mock.base_url(), api_key).unwrap();
    client.set_scope("snowflake://tester@test-account/TEST");
    client
}

#[test]
fn test_bearer_header_present_iff_key_non_empty() {
    let mock = MockWaiiService::start();

    let with_key = scoped_client(&mock, "secret-key");
    let _: CommonResponse = with_key
        .common_fetch("echo", &CommonRequest::default())
        .unwrap();

    let without_key = scoped_client(&mock, "");
    let _: CommonResponse = without_key
        .common_fetch("echo", &CommonRequest::default())
        .unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret-key"));
    assert_eq!(requests[1].authorization, None);
}

#[test]
fn test_session_fields_injected_into_body() {
    let mock = MockWaiiService::start();
    let client = scoped_client(&mock, "key");
    client.set_org_id("org-1");
    client.set_user_id("user-1");

    let _: CommonResponse = client
        .common_fetch("echo", &CommonRequest::default())
        .unwrap();

    let body = mock.requests()[0].body.clone();
    assert_eq!(body["scope"], "snowflake://tester@test-account/TEST");
    assert_eq!(body["org_id"], "org-1");
    assert_eq!(body["user_id"], "user-1");
}

#[test]
fn test_no_scope_endpoints_work_before_activation() {
    let mock = MockWaiiService::start();
    // No scope configured at all.
    let client = WaiiHttpClient::get_or_create(mock.base_url(), "key").unwrap();

    let _: CommonResponse = client
        .common_fetch_no_scope("echo", &CommonRequest::default())
        .unwrap();

    let body = mock.requests()[0].body.clone();
    assert!(body.get("scope").is_none());
    assert_eq!(body["org_id"], "");
    assert_eq!(body["user_id"], "");
}

#[test]
fn test_no_scope_error_raised_before_any_network() {
    let mock = MockWaiiService::start();
    let client = WaiiHttpClient::get_or_create(mock.base_url(), "key").unwrap();

    let result: Result<CommonResponse, _> =
        client.common_fetch("echo", &CommonRequest::default());

    assert!(matches!(result, Err(ApiError::NoScope)));
    assert_eq!(mock.requests().len(), 0);
}

#[test]
fn test_schema_error_raised_before_any_network() {
    let mock = MockWaiiService::start();
    let client = scoped_client(&mock, "key");

    let params: CommonRequest = serde_json::from_value(json!({"made_up": 1})).unwrap();
    let result: Result<CommonResponse, _> = client.common_fetch("echo", &params);

    match result {
        Err(ApiError::Schema(err)) => assert_eq!(err.fields, vec!["made_up".to_string()]),
        other => panic!("expected a schema error, got {other:?}"),
    }
    assert_eq!(mock.hits("echo"), 0);
}

#[test]
fn test_remote_error_extracts_detail_field() {
    let mock = MockWaiiService::start();
    let client = scoped_client(&mock, "key");

    let result: Result<CommonResponse, _> =
        client.common_fetch("does-not-exist", &CommonRequest::default());

    match result {
        Err(ApiError::Remote { status, message }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "unknown endpoint: does-not-exist");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[test]
fn test_remote_error_falls_back_to_raw_text() {
    let mock = MockWaiiService::start();
    let client = scoped_client(&mock, "key");

    let result: Result<CommonResponse, _> =
        client.common_fetch("crash", &CommonRequest::default());

    match result {
        Err(ApiError::Remote { status, message }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "mock service crashed");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[test]
fn test_decode_error_on_malformed_success_body() {
    let mock = MockWaiiService::start();
    let client = scoped_client(&mock, "key");

    let result: Result<CommonResponse, _> =
        client.common_fetch("malformed", &CommonRequest::default());

    match result {
        Err(ApiError::Decode { endpoint, .. }) => assert_eq!(endpoint, "malformed"),
        other => panic!("expected a decode error, got {other:?}"),
    }
}

#[test]
fn test_echo_round_trip_preserves_declared_fields_and_extras() {
    let mock = MockWaiiService::start();
    let client = scoped_client(&mock, "key");

    let params = CommonRequest {
        tags: Some(vec!["nightly".to_string()]),
        ..CommonRequest::default()
    };
    let response: CommonResponse = client.common_fetch("echo", &params).unwrap();

    // The echo body contains the declared fields plus the injected session
    // fields; on `CommonResponse` all of them land in the extras capture.
    assert_eq!(response.extra.get("tags"), Some(&json!(["nightly"])));
    assert_eq!(
        response.extra.get("scope"),
        Some(&json!("snowflake://tester@test-account/TEST"))
    );
    assert!(response.extra.check_empty().is_err());
}

#[test]
fn test_impersonation_header_lifecycle() {
    let mock = MockWaiiService::start();
    let client = scoped_client(&mock, "key");
    let params = CommonRequest::default();

    let _: CommonResponse = client.common_fetch("echo", &params).unwrap();

    client.with_impersonation("ops@example.com", || {
        let _: CommonResponse = client.common_fetch("echo", &params).unwrap();
    });

    let _: CommonResponse = client.common_fetch("echo", &params).unwrap();

    let requests = mock.requests();
    assert_eq!(requests[0].impersonate_user, None);
    assert_eq!(
        requests[1].impersonate_user.as_deref(),
        Some("ops@example.com")
    );
    assert_eq!(requests[2].impersonate_user, None);
}

#[test]
fn test_impersonation_cleared_when_body_panics() {
    let mock = MockWaiiService::start();
    let client = scoped_client(&mock, "key");

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        client.with_impersonation("ops@example.com", || panic!("boom"));
    }));
    assert!(outcome.is_err());

    let _: CommonResponse = client
        .common_fetch("echo", &CommonRequest::default())
        .unwrap();
    assert_eq!(mock.requests()[0].impersonate_user, None);
}

#[test]
fn test_instance_registry_memoizes_clients() {
    let mock = MockWaiiService::start();

    let first = WaiiHttpClient::get_or_create(mock.base_url(), "same-key").unwrap();
    let second = WaiiHttpClient::get_or_create(mock.base_url(), "same-key").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let other = WaiiHttpClient::get_or_create(mock.base_url(), "other-key").unwrap();
    assert!(!Arc::ptr_eq(&first, &other));
}
