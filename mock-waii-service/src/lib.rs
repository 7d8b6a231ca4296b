//! # Mock Waii Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an HTTP server
//! with canned Waii responses for integration testing the `waii-sdk` crate.
//! It is not intended for production use.
//!
//! The server records every request it receives (endpoint, auth header,
//! impersonation header, JSON body) so tests can assert on the wire traffic,
//! then answers with a fixed response per endpoint. It runs on a background
//! thread with its own runtime, which lets blocking SDK clients call it from
//! plain `#[test]` functions as well as from async tests.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::oneshot;

const IMPERSONATE_USER_HEADER: &str = "x-waii-impersonate-user";

/// One request as the service saw it on the wire.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub authorization: Option<String>,
    pub impersonate_user: Option<String>,
    pub body: Value,
}

type SharedLog = Arc<Mutex<Vec<RecordedRequest>>>;

/// Handle to a running mock service. Dropping it shuts the server down.
pub struct MockWaiiService {
    base_url: String,
    requests: SharedLog,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MockWaiiService {
    /// Binds an OS-assigned port and serves canned responses until dropped.
    pub fn start() -> Self {
        let requests: SharedLog = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr_tx, addr_rx) = mpsc::channel::<SocketAddr>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("failed to build mock service runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("failed to bind mock service port");
                let addr = listener
                    .local_addr()
                    .expect("failed to read mock service address");
                addr_tx.send(addr).expect("failed to publish mock address");

                let app = Router::new()
                    .route("/api/{endpoint}", post(handle))
                    .with_state(log);
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("mock service crashed");
            });
        });

        let addr = addr_rx.recv().expect("mock service failed to start");
        Self {
            base_url: format!("http://{addr}/api/"),
            requests,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    /// Base URL ending in `/api/`, ready to hand to the SDK.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .clone()
    }

    /// Number of requests received for `endpoint`.
    pub fn hits(&self, endpoint: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }
}

impl Drop for MockWaiiService {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn handle(
    State(log): State<SharedLog>,
    Path(endpoint): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let record = RecordedRequest {
        endpoint: endpoint.clone(),
        authorization: header_value(&headers, "authorization"),
        impersonate_user: header_value(&headers, IMPERSONATE_USER_HEADER),
        body: body.clone(),
    };
    log.lock().expect("mock request log poisoned").push(record);

    match endpoint.as_str() {
        "echo" => Json(body).into_response(),
        "generate-query" => generate_query(&body),
        "get-connections" => Json(json!({
            "connectors": [
                {
                    "key": "snowflake://tester@test-account/TEST?role=ANALYST&warehouse=COMPUTE_WH",
                    "db_type": "snowflake",
                    "account_name": "test-account",
                    "username": "tester",
                    "database": "TEST",
                    "warehouse": "COMPUTE_WH",
                    "role": "ANALYST"
                }
            ],
            "default_db_connection_key": "snowflake://tester@test-account/TEST?role=ANALYST&warehouse=COMPUTE_WH"
        }))
        .into_response(),
        "run-query" => Json(json!({
            "rows": [
                {"ID": 1, "NAME": "alpha"},
                {"ID": 2, "NAME": "beta"}
            ],
            "more_rows": 0,
            "column_definitions": [
                {"name": "ID", "type": "number"},
                {"name": "NAME", "type": "text"}
            ],
            "query_uuid": "run-0001"
        }))
        .into_response(),
        "get-semantic-context" => Json(json!({
            "semantic_context": [],
            "available_statements": 0
        }))
        .into_response(),
        "crash" => (StatusCode::INTERNAL_SERVER_ERROR, "mock service crashed").into_response(),
        "malformed" => "this is not json".into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": format!("unknown endpoint: {endpoint}")})),
        )
            .into_response(),
    }
}

/// Builds a plausible generated-query payload around the incoming `ask` so
/// tests can attribute responses to their requests. The `server_build` field
/// is not part of any SDK model on purpose.
fn generate_query(body: &Value) -> Response {
    let ask = body.get("ask").and_then(Value::as_str).unwrap_or_default();
    if ask.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "ask must not be empty"})),
        )
            .into_response();
    }
    Json(json!({
        "uuid": format!("q-{:08x}", fingerprint(ask)),
        "liked": false,
        "current_step": "Completed",
        "query": format!("SELECT COUNT(*) FROM users /* {ask} */"),
        "detailed_steps": ["Selected tables", "Generated SQL", "Validated SQL"],
        "tables": [
            {"table_name": "USERS", "schema_name": "PUBLIC", "database_name": "TEST"}
        ],
        "confidence_score": {"log_prob_sum": -0.2, "token_count": 2},
        "elapsed_time_ms": 42,
        "is_new": true,
        "server_build": "mock-2024.01"
    }))
    .into_response()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn fingerprint(text: &str) -> u32 {
    text.bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32))
}
