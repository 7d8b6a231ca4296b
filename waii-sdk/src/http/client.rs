//! # Waii HTTP Client
//!
//! This module wraps a blocking `reqwest` client to provide the single
//! request path used by every feature module. It is agnostic to the specific
//! shapes being exchanged.
//!
//! ## How it works
//!
//! Every operation is one HTTP POST of a JSON object to
//! `{base_url}{endpoint}`. Before anything touches the network the request
//! value is validated ([`StrictFields`]), then the session identity is
//! injected into the body (`scope` when the endpoint requires an active
//! connection, `org_id` and `user_id` always). Non-2xx responses become
//! [`ApiError::Remote`] carrying the server's `detail` text when present.
//!
//! ## Instance registry
//!
//! [`WaiiHttpClient::get_or_create`] memoizes clients by `(url, api_key)`:
//! requesting the same pair again returns the same shared instance, so every
//! caller observes one session. A different pair creates a fresh instance.
//! Entries live for the rest of the process.
use crate::http::session::{ImpersonationGuard, SessionContext};
use crate::model::{SchemaError, StrictFields};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Header carrying the impersonated user id, sent only while an
/// impersonation scope is active.
pub const IMPERSONATE_USER_HEADER: &str = "x-waii-impersonate-user";

/// The service keeps long-running generation calls open; the default ceiling
/// is effectively no ceiling.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(150_000_000);

#[derive(thiserror::Error, Debug)]
pub enum ClientBuildError {
    #[error("Failed to build the underlying HTTP client: '{0}'")]
    Http(#[from] reqwest::Error),
}

/// Everything that can go wrong between calling an operation and holding its
/// decoded response.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The request value holds fields outside its declared shape. Raised
    /// before any network activity.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The endpoint requires an active connection scope and none is set.
    /// Raised before any network activity.
    #[error("You need to activate a connection first, use `Database::activate_connection`")]
    NoScope,
    /// An operation was invoked on a value that is not attached to a client
    /// (for example a hand-built `GeneratedQuery`).
    #[error("This value is not attached to a client, fetch it through the SDK first")]
    Detached,
    #[error("Failed to encode the request for '{endpoint}': '{source}'")]
    Encode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Request to '{endpoint}' failed: '{source}'")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status.
    #[error("The server returned {status}: '{message}'")]
    Remote { status: StatusCode, message: String },
    #[error("Invalid response received from '{endpoint}': '{source}'")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

type ClientKey = (String, String);

static INSTANCES: OnceLock<Mutex<HashMap<ClientKey, Arc<WaiiHttpClient>>>> = OnceLock::new();

/// The shared transport and session handle behind every feature module.
pub struct WaiiHttpClient {
    url: String,
    api_key: String,
    timeout: Duration,
    verbose: AtomicBool,
    http: reqwest::blocking::Client,
    session: SessionContext,
}

impl WaiiHttpClient {
    /// Builds an unregistered client with the default timeout.
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Arc<Self>, ClientBuildError> {
        Self::with_timeout(url, api_key, DEFAULT_TIMEOUT)
    }

    /// Builds an unregistered client with an explicit request timeout.
    pub fn with_timeout(
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Arc<Self>, ClientBuildError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Arc::new(Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout,
            verbose: AtomicBool::new(false),
            http,
            session: SessionContext::new(),
        }))
    }

    /// Returns the memoized client for `(url, api_key)`, creating and
    /// registering it on first request.
    pub fn get_or_create(url: &str, api_key: &str) -> Result<Arc<Self>, ClientBuildError> {
        let registry = INSTANCES.get_or_init(Default::default);
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);

        let key = (url.to_string(), api_key.to_string());
        if let Some(existing) = registry.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let client = Self::new(url, api_key)?;
        registry.insert(key, Arc::clone(&client));
        Ok(client)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// When set, each dispatch logs a curl-equivalent line (API key
    /// redacted) in addition to the regular debug event.
    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn scope(&self) -> String {
        self.session.scope()
    }

    pub fn set_scope(&self, scope: impl Into<String>) {
        self.session.set_scope(scope);
    }

    pub fn set_org_id(&self, org_id: impl Into<String>) {
        self.session.set_org_id(org_id);
    }

    pub fn set_user_id(&self, user_id: impl Into<String>) {
        self.session.set_user_id(user_id);
    }

    pub fn set_impersonate_user_id(&self, user_id: impl Into<String>) {
        self.session.set_impersonate_user_id(user_id);
    }

    pub fn clear_impersonation(&self) {
        self.session.clear_impersonation();
    }

    /// Sets the impersonation id for the lifetime of the returned guard.
    pub fn impersonate(&self, user_id: impl Into<String>) -> ImpersonationGuard<'_> {
        self.session.impersonate(user_id)
    }

    /// Runs `body` with the impersonation id set, clearing it on every exit
    /// path.
    pub fn with_impersonation<T>(
        &self,
        user_id: impl Into<String>,
        body: impl FnOnce() -> T,
    ) -> T {
        self.session.with_impersonation(user_id, body)
    }

    /// Performs one API call and decodes the response into `T`.
    ///
    /// # Returns
    /// * `Ok(T)` - 2xx response decoded into the requested shape (unknown
    ///   response fields are captured, not rejected).
    /// * `Err(ApiError)` - validation, scope, transport, server or decode
    ///   failure.
    pub fn common_fetch<R, T>(&self, endpoint: &str, params: &R) -> Result<T, ApiError>
    where
        R: Serialize + StrictFields + ?Sized,
        T: DeserializeOwned,
    {
        let value = self.dispatch(endpoint, params, true)?;
        decode(endpoint, value)
    }

    /// Same as [`Self::common_fetch`] for endpoints that work without an
    /// active connection (connection listing, key management).
    pub fn common_fetch_no_scope<R, T>(&self, endpoint: &str, params: &R) -> Result<T, ApiError>
    where
        R: Serialize + StrictFields + ?Sized,
        T: DeserializeOwned,
    {
        let value = self.dispatch(endpoint, params, false)?;
        decode(endpoint, value)
    }

    /// Performs one API call and returns the raw decoded JSON, for callers
    /// that dispatch on the payload themselves.
    pub fn fetch_value<R>(&self, endpoint: &str, params: &R) -> Result<Value, ApiError>
    where
        R: Serialize + StrictFields + ?Sized,
    {
        self.dispatch(endpoint, params, true)
    }

    fn dispatch<R>(&self, endpoint: &str, params: &R, need_scope: bool) -> Result<Value, ApiError>
    where
        R: Serialize + StrictFields + ?Sized,
    {
        params.check_extra_fields()?;

        let mut body = match serde_json::to_value(params) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(ApiError::Encode {
                    endpoint: endpoint.to_string(),
                    source: serde::ser::Error::custom("request must serialize to a JSON object"),
                });
            }
            Err(source) => {
                return Err(ApiError::Encode {
                    endpoint: endpoint.to_string(),
                    source,
                });
            }
        };

        let session = self.session.snapshot();
        if need_scope {
            if session.scope.trim().is_empty() {
                return Err(ApiError::NoScope);
            }
            body.insert("scope".to_string(), Value::String(session.scope));
        }
        body.insert("org_id".to_string(), Value::String(session.org_id));
        body.insert("user_id".to_string(), Value::String(session.user_id));

        let url = format!("{}{}", self.url, endpoint);
        debug!(endpoint, "sending request");
        if self.verbose.load(Ordering::Relaxed) {
            debug!(
                "{}",
                curl_line(&url, &body, &self.api_key, &session.impersonate_user_id)
            );
        }

        let mut request = self.http.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        if !session.impersonate_user_id.is_empty() {
            request = request.header(IMPERSONATE_USER_HEADER, &session.impersonate_user_id);
        }

        let response = request.send().map_err(|source| ApiError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let status = response.status();
        let text = response.text().map_err(|source| ApiError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Remote {
                status,
                message: error_message(text),
            });
        }

        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

impl fmt::Debug for WaiiHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaiiHttpClient")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Extracts the server's `detail` string from an error body, falling back to
/// the raw text so the error always carries something the server said.
fn error_message(body: String) -> String {
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => match value.get("detail").and_then(Value::as_str) {
            Some(detail) => detail.to_string(),
            None => body,
        },
        Err(_) => body,
    }
}

fn curl_line(url: &str, body: &serde_json::Map<String, Value>, api_key: &str, impersonate: &str) -> String {
    let mut line = format!("curl -X POST '{url}' -H 'Content-Type: application/json'");
    if !api_key.is_empty() {
        line.push_str(" -H 'Authorization: Bearer <redacted>'");
    }
    if !impersonate.is_empty() {
        line.push_str(&format!(" -H '{IMPERSONATE_USER_HEADER}: {impersonate}'"));
    }
    line.push_str(&format!(" -d '{}'", Value::Object(body.clone())));
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_returns_same_instance_for_same_pair() {
        let first = WaiiHttpClient::get_or_create("http://one.invalid/api/", "key-a").unwrap();
        let again = WaiiHttpClient::get_or_create("http://one.invalid/api/", "key-a").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn registry_creates_new_instance_for_new_pair() {
        let first = WaiiHttpClient::get_or_create("http://two.invalid/api/", "key-a").unwrap();
        let other_key = WaiiHttpClient::get_or_create("http://two.invalid/api/", "key-b").unwrap();
        let other_url = WaiiHttpClient::get_or_create("http://three.invalid/api/", "key-a").unwrap();
        assert!(!Arc::ptr_eq(&first, &other_key));
        assert!(!Arc::ptr_eq(&first, &other_url));
    }

    #[test]
    fn session_is_shared_through_the_registry() {
        let writer = WaiiHttpClient::get_or_create("http://four.invalid/api/", "key").unwrap();
        let reader = WaiiHttpClient::get_or_create("http://four.invalid/api/", "key").unwrap();
        writer.set_scope("snowflake://u@a/db");
        assert_eq!(reader.scope(), "snowflake://u@a/db");
    }

    #[test]
    fn error_message_prefers_detail() {
        let body = json!({"detail": "ask must not be empty"}).to_string();
        assert_eq!(error_message(body), "ask must not be empty");
    }

    #[test]
    fn error_message_falls_back_to_raw_text() {
        assert_eq!(error_message("boom".to_string()), "boom");
        // JSON without a detail string also falls back to the full body.
        let body = json!({"code": 17}).to_string();
        assert_eq!(error_message(body.clone()), body);
    }

    #[test]
    fn debug_redacts_the_api_key() {
        let client = WaiiHttpClient::new("http://five.invalid/api/", "super-secret").unwrap();
        let debugged = format!("{client:?}");
        assert!(!debugged.contains("super-secret"));
        assert!(debugged.contains("<redacted>"));
    }
}
