//! # Generation History
//!
//! Read back what was generated on the active connection: queries, charts
//! and chat turns, newest first by default.
//!
//! ## How it works
//!
//! The `get-history` payload mixes entry kinds in one list, discriminated
//! by a `history_type` field, so the response is decoded by hand: the
//! `history` key and each entry's `history_type` are required, known kinds
//! decode into their entry shape, and kinds this SDK predates are skipped
//! instead of failing the whole page.
use crate::client::chart::{ChartGenerationRequest, ChartGenerationResponse};
use crate::client::chat::{ChatRequest, ChatResponse};
use crate::client::query::{GeneratedQuery, QueryGenerationRequest};
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const LIST_ENDPOINT: &str = "get-generated-query-history";
const GET_ENDPOINT: &str = "get-history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedHistoryEntryType {
    Query,
    Chart,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQueryHistoryEntry {
    pub history_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<GeneratedQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<QueryGenerationRequest>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GeneratedQueryHistoryEntry {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.query.check_extra_fields()?;
        self.request.check_extra_fields()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedChartHistoryEntry {
    pub history_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<ChartGenerationRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ChartGenerationResponse>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GeneratedChartHistoryEntry {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.request.check_extra_fields()?;
        self.response.check_extra_fields()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedChatHistoryEntry {
    pub history_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<ChatRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ChatResponse>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GeneratedChatHistoryEntry {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.request.check_extra_fields()?;
        self.response.check_extra_fields()
    }
}

/// One decoded entry from the mixed history list.
#[derive(Debug, Clone)]
pub enum GeneratedHistoryEntry {
    Query(GeneratedQueryHistoryEntry),
    Chart(GeneratedChartHistoryEntry),
    Chat(GeneratedChatHistoryEntry),
}

impl GeneratedHistoryEntry {
    pub fn timestamp_ms(&self) -> Option<i64> {
        match self {
            Self::Query(entry) => entry.timestamp_ms,
            Self::Chart(entry) => entry.timestamp_ms,
            Self::Chat(entry) => entry.timestamp_ms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetGeneratedQueryHistoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetGeneratedQueryHistoryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetGeneratedQueryHistoryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<GeneratedQueryHistoryEntry>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetGeneratedQueryHistoryResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.history.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetHistoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_types: Option<Vec<GeneratedHistoryEntryType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid_filter: Option<String>,
    /// When set, `included_types` must contain only queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_query_filter: Option<bool>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for GetHistoryRequest {
    fn default() -> Self {
        Self {
            included_types: Some(vec![
                GeneratedHistoryEntryType::Query,
                GeneratedHistoryEntryType::Chart,
                GeneratedHistoryEntryType::Chat,
            ]),
            limit: Some(1000),
            offset: Some(0),
            timestamp_sort_order: Some(SortOrder::Desc),
            uuid_filter: None,
            liked_query_filter: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for GetHistoryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetHistoryResponse {
    pub history: Vec<GeneratedHistoryEntry>,
}

/// Blocking history operations.
#[derive(Debug, Clone)]
pub struct History {
    http: Arc<WaiiHttpClient>,
}

impl History {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    #[deprecated(note = "covers only query history, use `get` instead")]
    pub fn list(
        &self,
        params: &GetGeneratedQueryHistoryRequest,
    ) -> Result<GetGeneratedQueryHistoryResponse, ApiError> {
        self.http.common_fetch(LIST_ENDPOINT, params)
    }

    /// Fetches mixed history entries.
    pub fn get(&self, params: &GetHistoryRequest) -> Result<GetHistoryResponse, ApiError> {
        let value = self.http.fetch_value(GET_ENDPOINT, params)?;
        decode_history(&value).map_err(|source| ApiError::Decode {
            endpoint: GET_ENDPOINT.to_string(),
            source,
        })
    }
}

/// [`History`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncHistory {
    inner: AsyncFacade<History>,
}

impl AsyncHistory {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(History::new(http)),
        }
    }

    #[deprecated(note = "covers only query history, use `get` instead")]
    pub async fn list(
        &self,
        params: GetGeneratedQueryHistoryRequest,
    ) -> Result<GetGeneratedQueryHistoryResponse, ApiError> {
        #[allow(deprecated)]
        let fetch = self.inner.run(move |history| history.list(&params));
        fetch.await
    }

    pub async fn get(&self, params: GetHistoryRequest) -> Result<GetHistoryResponse, ApiError> {
        self.inner.run(move |history| history.get(&params)).await
    }
}

fn decode_history(value: &Value) -> Result<GetHistoryResponse, serde_json::Error> {
    use serde::de::Error;

    let Some(entries) = value.get("history") else {
        return Err(Error::custom(format!(
            "history is required, but not found in the response, {value}"
        )));
    };
    let entries = entries
        .as_array()
        .ok_or_else(|| Error::custom("history must be a list"))?;

    let mut history = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(history_type) = entry.get("history_type").and_then(Value::as_str) else {
            return Err(Error::custom(format!(
                "history_type is required, but not found in the response, {entry}"
            )));
        };

        match history_type {
            "query" => history.push(GeneratedHistoryEntry::Query(serde_json::from_value(
                entry.clone(),
            )?)),
            "chart" => history.push(GeneratedHistoryEntry::Chart(serde_json::from_value(
                entry.clone(),
            )?)),
            "chat" => history.push(GeneratedHistoryEntry::Chat(serde_json::from_value(
                entry.clone(),
            )?)),
            _ => {}
        }
    }

    Ok(GetHistoryResponse { history })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_cover_all_entry_types() {
        let value = serde_json::to_value(GetHistoryRequest::default()).unwrap();
        assert_eq!(value["included_types"], json!(["query", "chart", "chat"]));
        assert_eq!(value["limit"], json!(1000));
        assert_eq!(value["offset"], json!(0));
        assert_eq!(value["timestamp_sort_order"], json!("desc"));
    }

    #[test]
    fn mixed_entries_decode_by_history_type() {
        let response = decode_history(&json!({
            "history": [
                {"history_type": "query", "timestamp_ms": 3, "query": {"uuid": "q-1"}},
                {"history_type": "chat", "timestamp_ms": 2, "response": {"chat_uuid": "c-1"}},
                {"history_type": "chart", "timestamp_ms": 1, "response": {"uuid": "g-1"}}
            ]
        }))
        .unwrap();

        assert_eq!(response.history.len(), 3);
        assert!(matches!(
            &response.history[0],
            GeneratedHistoryEntry::Query(entry) if entry.timestamp_ms == Some(3)
        ));
        assert!(matches!(
            &response.history[1],
            GeneratedHistoryEntry::Chat(entry)
                if entry.response.as_ref().map(|r| r.chat_uuid.as_str()) == Some("c-1")
        ));
        assert!(matches!(
            &response.history[2],
            GeneratedHistoryEntry::Chart(entry)
                if entry.response.as_ref().map(|r| r.uuid.as_str()) == Some("g-1")
        ));
    }

    #[test]
    fn unknown_entry_kinds_are_skipped() {
        let response = decode_history(&json!({
            "history": [
                {"history_type": "hologram", "timestamp_ms": 9},
                {"history_type": "query", "timestamp_ms": 3}
            ]
        }))
        .unwrap();

        assert_eq!(response.history.len(), 1);
        assert_eq!(response.history[0].timestamp_ms(), Some(3));
    }

    #[test]
    fn missing_history_key_is_an_error() {
        let err = decode_history(&json!({"entries": []})).unwrap_err();
        assert!(err.to_string().contains("history is required"));
    }

    #[test]
    fn entries_without_a_type_are_an_error() {
        let err = decode_history(&json!({
            "history": [{"timestamp_ms": 1}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("history_type is required"));
    }
}
