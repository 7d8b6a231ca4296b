//! # Conversational Interface
//!
//! A single ask routed across the other modules: the service decides
//! whether to generate a query, run it, fetch context, list tables or draw
//! a chart, then folds everything into one templated response. Long
//! conversations chain through `parent_uuid`.
use crate::client::chart::{ChartGenerationResponse, ChartType};
use crate::client::common::{AsyncObjectResponse, GetObjectRequest};
use crate::client::database::{CatalogDefinition, SearchContext};
use crate::client::query::{GeneratedQuery, GetQueryResultResponse};
use crate::client::semantic_context::{GetSemanticContextResponse, SemanticStatement};
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const CHAT_MESSAGE_ENDPOINT: &str = "chat-message";
const SUBMIT_CHAT_MESSAGE_ENDPOINT: &str = "submit-chat-message";
const GET_CHAT_RESPONSE_ENDPOINT: &str = "get-chat-response";

/// The building blocks a chat answer can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatModule {
    Data,
    Tables,
    Query,
    Chart,
    Context,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub ask: String,
    #[serde(default)]
    pub streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<ChatModule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_limit_in_response: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<Vec<SemanticStatement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<Vec<SearchContext>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ChatRequest {
    pub fn new(ask: impl Into<String>) -> Self {
        Self {
            ask: ask.into(),
            streaming: false,
            parent_uuid: None,
            chart_type: None,
            modules: None,
            module_limit_in_response: None,
            additional_context: None,
            search_context: None,
            model: None,
            use_cache: Some(true),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for ChatRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.additional_context.check_extra_fields()?;
        self.search_context.check_extra_fields()
    }
}

/// Per-module payloads backing a chat answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<GetQueryResultResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<GeneratedQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartGenerationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_context: Option<GetSemanticContextResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<CatalogDefinition>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ChatResponseData {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.data.check_extra_fields()?;
        self.query.check_extra_fields()?;
        self.chart.check_extra_fields()?;
        self.semantic_context.check_extra_fields()?;
        self.tables.check_extra_fields()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatResponseStep {
    #[serde(rename = "Routing Request")]
    RoutingRequest,
    #[serde(rename = "Generating Query")]
    GeneratingQuery,
    #[serde(rename = "Retrieving Context")]
    RetrievingContext,
    #[serde(rename = "Retrieving Tables")]
    RetrievingTables,
    #[serde(rename = "Running Query")]
    RunningQuery,
    #[serde(rename = "Generating Chart")]
    GeneratingChart,
    #[serde(rename = "Preparing Result")]
    PreparingResult,
    #[serde(rename = "Completed")]
    Completed,
}

/// A templated answer. Placeholders like `{query}` in `response` refer to
/// the modules listed in `response_selected_fields` and carried in
/// `response_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<ChatResponseStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<ChatResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_selected_fields: Option<Vec<ChatModule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    pub chat_uuid: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ChatResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.response_data.check_extra_fields()
    }
}

/// Blocking chat operations.
#[derive(Debug, Clone)]
pub struct Chat {
    http: Arc<WaiiHttpClient>,
}

impl Chat {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    /// Sends one conversational ask and waits for the assembled answer.
    pub fn chat_message(&self, params: &ChatRequest) -> Result<ChatResponse, ApiError> {
        self.http.common_fetch(CHAT_MESSAGE_ENDPOINT, params)
    }

    /// Starts a chat turn server side. Poll the returned uuid with
    /// [`get_chat_response`](Self::get_chat_response).
    pub fn submit_chat_message(&self, params: &ChatRequest) -> Result<AsyncObjectResponse, ApiError> {
        self.http.common_fetch(SUBMIT_CHAT_MESSAGE_ENDPOINT, params)
    }

    pub fn get_chat_response(&self, params: &GetObjectRequest) -> Result<ChatResponse, ApiError> {
        self.http.common_fetch(GET_CHAT_RESPONSE_ENDPOINT, params)
    }
}

/// [`Chat`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncChat {
    inner: AsyncFacade<Chat>,
}

impl AsyncChat {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(Chat::new(http)),
        }
    }

    pub async fn chat_message(&self, params: ChatRequest) -> Result<ChatResponse, ApiError> {
        self.inner.run(move |chat| chat.chat_message(&params)).await
    }

    pub async fn submit_chat_message(
        &self,
        params: ChatRequest,
    ) -> Result<AsyncObjectResponse, ApiError> {
        self.inner
            .run(move |chat| chat.submit_chat_message(&params))
            .await
    }

    pub async fn get_chat_response(&self, params: GetObjectRequest) -> Result<ChatResponse, ApiError> {
        self.inner.run(move |chat| chat.get_chat_response(&params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_serializes_streaming_flag() {
        let value = serde_json::to_value(ChatRequest::new("top customers by revenue")).unwrap();
        assert_eq!(value["ask"], json!("top customers by revenue"));
        assert_eq!(value["streaming"], json!(false));
        assert_eq!(value["use_cache"], json!(true));
        assert!(value.get("modules").is_none());
    }

    #[test]
    fn chat_response_decodes_selected_modules() {
        let response: ChatResponse = serde_json::from_value(json!({
            "chat_uuid": "c-1",
            "response": "Here are the results: {query}",
            "current_step": "Completed",
            "response_selected_fields": ["query", "data"],
            "response_data": {
                "query": {"uuid": "q-1", "query": "SELECT 1"},
                "data": {"rows": [{"n": 1}]}
            }
        }))
        .unwrap();

        assert_eq!(response.current_step, Some(ChatResponseStep::Completed));
        assert_eq!(
            response.response_selected_fields,
            Some(vec![ChatModule::Query, ChatModule::Data])
        );
        let data = response.response_data.unwrap();
        assert_eq!(data.query.unwrap().query.as_deref(), Some("SELECT 1"));
        assert_eq!(data.data.unwrap().rows.unwrap().len(), 1);
    }

    #[test]
    fn step_names_use_display_casing() {
        assert_eq!(
            serde_json::to_value(ChatResponseStep::RoutingRequest).unwrap(),
            json!("Routing Request")
        );
    }
}
