//! # Waii Client
//!
//! This module ties the feature modules together into a single entry point.
//!
//! [`Waii::connect`] resolves an HTTP client for the `(url, api_key)` pair,
//! hands a clone of it to every feature module, then fetches the database
//! connections registered for the key and activates the first one so that
//! scoped calls work right away. [`AsyncWaii::connect`] performs the same
//! bootstrap on the blocking worker pool and exposes the async module
//! surfaces instead.
//!
//! ## Example
//!
//! ```rust,no_run
//! use waii_sdk::client::Waii;
//! use waii_sdk::client::query::QueryGenerationRequest;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let waii = Waii::connect("https://tweakit.waii.ai/api/", "my-api-key")?;
//!
//! let params = QueryGenerationRequest::from_ask("How many users signed up last month?");
//! let generated = waii.query.generate(&params)?;
//! println!("{}", generated.query.unwrap_or_default());
//! # Ok(())
//! # }
//! ```
pub mod access_rules;
pub mod chart;
pub mod chat;
pub mod common;
pub mod database;
pub mod history;
pub mod query;
pub mod semantic_context;
pub mod semantic_layer_dump;
pub mod settings;
pub mod user;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::access_rules::{AccessRules, AsyncAccessRules};
use crate::client::chart::{AsyncChart, Chart};
use crate::client::chat::{AsyncChat, Chat};
use crate::client::database::{AsyncDatabase, Database};
use crate::client::history::{AsyncHistory, History};
use crate::client::query::{AsyncQuery, Query};
use crate::client::semantic_context::{AsyncSemanticContext, SemanticContext};
use crate::client::semantic_layer_dump::{AsyncSemanticLayerDump, SemanticLayerDump};
use crate::client::settings::{AsyncSettings, Settings};
use crate::client::user::{AsyncUserApi, UserApi};
use crate::http::client::{ApiError, ClientBuildError, WaiiHttpClient};
use crate::http::session::ImpersonationGuard;
use crate::model::{ExtraFields, SchemaError, StrictFields};

/// Endpoint of the service when no other deployment is specified.
pub const DEFAULT_URL: &str = "https://tweakit.waii.ai/api/";

const GET_MODELS_ENDPOINT: &str = "get-models";

/// Error returned by [`Waii::connect`] and [`AsyncWaii::connect`].
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The HTTP client itself could not be built.
    #[error(transparent)]
    Build(#[from] ClientBuildError),
    /// The bootstrap fetch of database connections failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetModelsRequest {
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetModelsRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// A language model the service can route generation requests to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ModelType {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetModelsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelType>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetModelsResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.models.check_extra_fields()?;
        self.extra.check_empty()
    }
}

/// Synchronous entry point exposing every feature module of the service.
pub struct Waii {
    pub database: Database,
    pub query: Query,
    pub semantic_context: SemanticContext,
    pub chat: Chat,
    pub chart: Chart,
    pub history: History,
    pub user: UserApi,
    pub access_rules: AccessRules,
    pub settings: Settings,
    pub semantic_layer_dump: SemanticLayerDump,
    http: Arc<WaiiHttpClient>,
}

impl Waii {
    /// Connects to the service and prepares every feature module.
    ///
    /// Clients are memoized per `(url, api_key)` pair, so connecting twice
    /// with the same coordinates shares one session. When the session has no
    /// active connection yet, the first connector registered for the key is
    /// activated so scoped calls can be made immediately.
    pub fn connect(
        url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConnectError> {
        let http = WaiiHttpClient::get_or_create(&url.into(), &api_key.into())?;
        activate_default_connection(&http)?;
        Ok(Self::from_http(http))
    }

    pub(crate) fn from_http(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            database: Database::new(Arc::clone(&http)),
            query: Query::new(Arc::clone(&http)),
            semantic_context: SemanticContext::new(Arc::clone(&http)),
            chat: Chat::new(Arc::clone(&http)),
            chart: Chart::new(Arc::clone(&http)),
            history: History::new(Arc::clone(&http)),
            user: UserApi::new(Arc::clone(&http)),
            access_rules: AccessRules::new(Arc::clone(&http)),
            settings: Settings::new(Arc::clone(&http)),
            semantic_layer_dump: SemanticLayerDump::new(Arc::clone(&http)),
            http,
        }
    }

    /// The underlying HTTP client shared by every module.
    pub fn http(&self) -> &Arc<WaiiHttpClient> {
        &self.http
    }

    /// Enables or disables request logging for this session.
    pub fn set_verbose(&self, verbose: bool) {
        self.http.set_verbose(verbose);
    }

    /// Lists the language models available to this API key.
    pub fn get_models(&self, params: &GetModelsRequest) -> Result<GetModelsResponse, ApiError> {
        self.http.common_fetch(GET_MODELS_ENDPOINT, params)
    }

    /// Attributes every following call to `user_id` until cleared.
    pub fn set_impersonate_user(&self, user_id: impl Into<String>) {
        self.http.set_impersonate_user_id(user_id);
    }

    /// Stops attributing calls to an impersonated user.
    pub fn clear_impersonation(&self) {
        self.http.clear_impersonation();
    }

    /// Impersonates `user_id` until the returned guard is dropped.
    pub fn impersonate(&self, user_id: impl Into<String>) -> ImpersonationGuard<'_> {
        self.http.impersonate(user_id)
    }

    /// Runs `body` with calls attributed to `user_id`, then clears the
    /// impersonation even when `body` panics.
    pub fn with_impersonation<T>(
        &self,
        user_id: impl Into<String>,
        body: impl FnOnce() -> T,
    ) -> T {
        self.http.with_impersonation(user_id, body)
    }

    /// Version of this crate.
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

/// Asynchronous entry point mirroring [`Waii`] module by module.
pub struct AsyncWaii {
    pub database: AsyncDatabase,
    pub query: AsyncQuery,
    pub semantic_context: AsyncSemanticContext,
    pub chat: AsyncChat,
    pub chart: AsyncChart,
    pub history: AsyncHistory,
    pub user: AsyncUserApi,
    pub access_rules: AsyncAccessRules,
    pub settings: AsyncSettings,
    pub semantic_layer_dump: AsyncSemanticLayerDump,
    http: Arc<WaiiHttpClient>,
}

impl AsyncWaii {
    /// Connects to the service without blocking the calling task.
    ///
    /// The bootstrap (client construction plus the connection fetch) runs on
    /// the blocking worker pool; the semantics are identical to
    /// [`Waii::connect`].
    pub async fn connect(
        url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConnectError> {
        let url = url.into();
        let api_key = api_key.into();
        let bootstrap = tokio::task::spawn_blocking(move || {
            let http = WaiiHttpClient::get_or_create(&url, &api_key)?;
            activate_default_connection(&http)?;
            Ok::<_, ConnectError>(http)
        });
        let http = match bootstrap.await {
            Ok(result) => result?,
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            // Only reachable when the runtime is shutting down mid-call.
            Err(join_error) => panic!("blocking call was cancelled: {join_error}"),
        };
        Ok(Self::from_http(http))
    }

    pub(crate) fn from_http(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            database: AsyncDatabase::new(Arc::clone(&http)),
            query: AsyncQuery::new(Arc::clone(&http)),
            semantic_context: AsyncSemanticContext::new(Arc::clone(&http)),
            chat: AsyncChat::new(Arc::clone(&http)),
            chart: AsyncChart::new(Arc::clone(&http)),
            history: AsyncHistory::new(Arc::clone(&http)),
            user: AsyncUserApi::new(Arc::clone(&http)),
            access_rules: AsyncAccessRules::new(Arc::clone(&http)),
            settings: AsyncSettings::new(Arc::clone(&http)),
            semantic_layer_dump: AsyncSemanticLayerDump::new(Arc::clone(&http)),
            http,
        }
    }

    /// The underlying HTTP client shared by every module.
    pub fn http(&self) -> &Arc<WaiiHttpClient> {
        &self.http
    }

    /// Enables or disables request logging for this session.
    pub fn set_verbose(&self, verbose: bool) {
        self.http.set_verbose(verbose);
    }

    /// Lists the language models available to this API key.
    pub async fn get_models(&self, params: GetModelsRequest) -> Result<GetModelsResponse, ApiError> {
        let http = Arc::clone(&self.http);
        let fetch = tokio::task::spawn_blocking(move || {
            http.common_fetch::<_, GetModelsResponse>(GET_MODELS_ENDPOINT, &params)
        });
        match fetch.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Err(join_error) => panic!("blocking call was cancelled: {join_error}"),
        }
    }

    /// Attributes every following call to `user_id` until cleared.
    pub fn set_impersonate_user(&self, user_id: impl Into<String>) {
        self.http.set_impersonate_user_id(user_id);
    }

    /// Stops attributing calls to an impersonated user.
    pub fn clear_impersonation(&self) {
        self.http.clear_impersonation();
    }

    /// Version of this crate.
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

/// Activates the first connector registered for the key when the session has
/// no scope yet. Reconnecting with memoized coordinates keeps whatever
/// connection the session already selected.
fn activate_default_connection(http: &Arc<WaiiHttpClient>) -> Result<(), ApiError> {
    if !http.scope().is_empty() {
        return Ok(());
    }
    let database = Database::new(Arc::clone(http));
    let connections = database.get_connections()?;
    let connectors = connections.connectors.unwrap_or_default();
    if let Some(connector) = connectors.first() {
        database.activate_connection(&connector.key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_models_request_serializes_empty() {
        let params = GetModelsRequest::default();
        let encoded = serde_json::to_value(&params).unwrap();
        assert_eq!(encoded, serde_json::json!({}));
        assert!(params.check_extra_fields().is_ok());
    }

    #[test]
    fn unknown_model_fields_are_captured() {
        let decoded: GetModelsResponse = serde_json::from_value(serde_json::json!({
            "models": [
                {"name": "gpt-4o", "vendor": "openai", "context_window": 128000}
            ]
        }))
        .unwrap();

        let models = decoded.models.as_deref().unwrap();
        assert_eq!(models[0].name, "gpt-4o");
        let err = decoded.check_extra_fields().unwrap_err();
        assert_eq!(err.fields, vec!["context_window".to_string()]);
    }

    #[test]
    fn version_matches_manifest() {
        assert_eq!(Waii::version(), env!("CARGO_PKG_VERSION"));
        assert_eq!(AsyncWaii::version(), Waii::version());
    }
}
