//! End-to-end flows through the synchronous [`Waii`] entry point.

use mock_waii_service::MockWaiiService;
use serde_json::json;
use waii_sdk::client::Waii;
use waii_sdk::client::query::{QueryGenerationRequest, QueryGenerationStep};
use waii_sdk::client::semantic_context::GetSemanticContextRequest;
use waii_sdk::http::client::ApiError;

#[test]
fn test_connect_activates_first_connection() {
    let mock = MockWaiiService::start();

    let waii = Waii::connect(mock.base_url(), "api-key").unwrap();

    assert_eq!(mock.hits("get-connections"), 1);
    assert_eq!(
        waii.http().scope(),
        "snowflake://tester@test-account/TEST?role=ANALYST&warehouse=COMPUTE_WH"
    );

    // Reconnecting with memoized coordinates keeps the selected connection
    // instead of fetching and activating again.
    waii.database.activate_connection("snowflake://other@acct/DB");
    let again = Waii::connect(mock.base_url(), "api-key").unwrap();
    assert_eq!(mock.hits("get-connections"), 1);
    assert_eq!(again.http().scope(), "snowflake://other@acct/DB");
}

#[test]
fn test_generate_returns_an_attached_query() {
    let mock = MockWaiiService::start();
    let waii = Waii::connect(mock.base_url(), "api-key").unwrap();

    let params = QueryGenerationRequest::from_ask("count users");
    let generated = waii.query.generate(&params).unwrap();

    assert_eq!(generated.current_step, Some(QueryGenerationStep::Completed));
    assert!(generated.query.as_deref().unwrap().contains("count users"));
    assert_eq!(
        generated.extra.get("server_build"),
        Some(&json!("mock-2024.01"))
    );

    let score = generated.confidence_score.clone().unwrap();
    assert!((score.linear_probability() - (-0.1f64).exp()).abs() < 1e-9);

    // The result can run itself through the same session.
    let results = generated.run().unwrap();
    assert_eq!(results.rows.as_deref().unwrap().len(), 2);
    assert_eq!(results.query_uuid.as_deref(), Some("run-0001"));
    assert_eq!(mock.hits("run-query"), 1);
}

#[test]
fn test_generate_rejects_unknown_request_fields_before_send() {
    let mock = MockWaiiService::start();
    let waii = Waii::connect(mock.base_url(), "api-key").unwrap();

    let params: QueryGenerationRequest =
        serde_json::from_value(json!({"ask": "count users", "made_up_flag": true})).unwrap();

    match waii.query.generate(&params) {
        Err(ApiError::Schema(err)) => {
            assert_eq!(err.fields, vec!["made_up_flag".to_string()]);
        }
        other => panic!("expected a schema error, got {other:?}"),
    }
    assert_eq!(mock.hits("generate-query"), 0);
}

#[test]
fn test_server_validation_detail_reaches_the_caller() {
    let mock = MockWaiiService::start();
    let waii = Waii::connect(mock.base_url(), "api-key").unwrap();

    // No ask at all: the service answers 400 with a detail message.
    match waii.query.generate(&QueryGenerationRequest::default()) {
        Err(ApiError::Remote { status, message }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "ask must not be empty");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[test]
fn test_semantic_context_flows_through_the_facade() {
    let mock = MockWaiiService::start();
    let waii = Waii::connect(mock.base_url(), "api-key").unwrap();

    let response = waii
        .semantic_context
        .get_semantic_context(&GetSemanticContextRequest::default())
        .unwrap();

    assert_eq!(response.semantic_context.as_deref(), Some(&[][..]));
    assert_eq!(response.available_statements, Some(0));

    let body = mock
        .requests()
        .into_iter()
        .find(|r| r.endpoint == "get-semantic-context")
        .unwrap()
        .body;
    assert_eq!(body["limit"], 1000);
    assert_eq!(body["offset"], 0);
}
