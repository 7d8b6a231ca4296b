//! The async surface must stay a thin wrapper: same results, same errors,
//! same session as the blocking modules.

use mock_waii_service::MockWaiiService;
use waii_sdk::client::query::QueryGenerationRequest;
use waii_sdk::client::{AsyncWaii, Waii};
use waii_sdk::http::client::ApiError;

#[tokio::test]
async fn test_async_connect_activates_first_connection() {
    let mock = MockWaiiService::start();

    let waii = AsyncWaii::connect(mock.base_url(), "api-key").await.unwrap();

    assert_eq!(mock.hits("get-connections"), 1);
    assert_eq!(
        waii.http().scope(),
        "snowflake://tester@test-account/TEST?role=ANALYST&warehouse=COMPUTE_WH"
    );
}

#[tokio::test]
async fn test_async_result_is_identical_to_sync() {
    let mock = MockWaiiService::start();
    let waii = AsyncWaii::connect(mock.base_url(), "api-key").await.unwrap();

    let params = QueryGenerationRequest::from_ask("count users");
    let async_generated = waii.query.generate(params.clone()).await.unwrap();

    // The blocking client refuses to run on an async runtime thread, so the
    // sync half of the comparison goes through the worker pool as well.
    let url = mock.base_url().to_string();
    let sync_generated = tokio::task::spawn_blocking(move || {
        let waii = Waii::connect(url, "api-key").unwrap();
        waii.query.generate(&params)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        serde_json::to_value(&async_generated).unwrap(),
        serde_json::to_value(&sync_generated).unwrap()
    );
}

#[tokio::test]
async fn test_concurrent_calls_stay_attributable() {
    let mock = MockWaiiService::start();
    let waii = AsyncWaii::connect(mock.base_url(), "api-key").await.unwrap();

    let first = waii
        .query
        .generate(QueryGenerationRequest::from_ask("first ask"));
    let second = waii
        .query
        .generate(QueryGenerationRequest::from_ask("second ask"));
    let (first, second) = tokio::join!(first, second);

    assert!(first.unwrap().query.unwrap().contains("first ask"));
    assert!(second.unwrap().query.unwrap().contains("second ask"));
    assert_eq!(mock.hits("generate-query"), 2);
}

#[tokio::test]
async fn test_async_errors_pass_through_unchanged() {
    let mock = MockWaiiService::start();
    let waii = AsyncWaii::connect(mock.base_url(), "api-key").await.unwrap();

    match waii.query.generate(QueryGenerationRequest::default()).await {
        Err(ApiError::Remote { status, message }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "ask must not be empty");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
}
