//! # Semantic Context
//!
//! Curated statements about the data model that steer query generation,
//! for example "revenue is always net of refunds". Statements can be
//! scoped to users, tenants and orgs, filtered at retrieval time, and
//! toggled without deleting them.
use crate::client::database::SearchContext;
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const MODIFY_ENDPOINT: &str = "update-semantic-context";
const GET_ENDPOINT: &str = "get-semantic-context";
const ENABLE_ENDPOINT: &str = "enable-semantic-context";
const DISABLE_ENDPOINT: &str = "disable-semantic-context";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticStatementWarning {
    pub message: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for SemanticStatementWarning {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// A single statement of domain knowledge.
///
/// `always_include` statements are injected into every generation within
/// scope; the rest are retrieved by similarity against the ask, using
/// `lookup_summaries` as search keys when present. `critical` statements
/// get a second verification pass after generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_include: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_summaries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarization_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<SemanticStatementWarning>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_constraint: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl SemanticStatement {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            ..Self::default()
        }
    }
}

impl Default for SemanticStatement {
    fn default() -> Self {
        Self {
            id: None,
            statement: String::new(),
            labels: None,
            scope: None,
            always_include: Some(true),
            critical: Some(false),
            lookup_summaries: None,
            summarization_prompt: None,
            enabled: Some(true),
            warnings: None,
            user_id: Some("*".to_string()),
            tenant_id: Some("*".to_string()),
            org_id: Some("*".to_string()),
            semantic_constraint: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for SemanticStatement {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.warnings.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifySemanticContextRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<Vec<SemanticStatement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Vec<String>>,
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

impl Default for ModifySemanticContextRequest {
    fn default() -> Self {
        Self {
            updated: None,
            deleted: None,
            model: None,
            use_cache: Some(true),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for ModifySemanticContextRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.updated.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifySemanticContextResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<Vec<SemanticStatement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ModifySemanticContextResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.updated.check_extra_fields()
    }
}

/// Retrieval filter. `labels`, `scope` and `statement` are case
/// insensitive substring matches combined with AND; `always_include`
/// narrows to one side when set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetSemanticContextRequestFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_include: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetSemanticContextRequestFilter {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetSemanticContextRequest {
    #[serde(default)]
    pub filter: GetSemanticContextRequestFilter,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_statement_limit")]
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
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

impl Default for GetSemanticContextRequest {
    fn default() -> Self {
        Self {
            filter: GetSemanticContextRequestFilter::default(),
            offset: 0,
            limit: default_statement_limit(),
            search_text: None,
            search_context: None,
            model: None,
            use_cache: Some(true),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for GetSemanticContextRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.filter.check_extra_fields()?;
        self.search_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetSemanticContextResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_context: Option<Vec<SemanticStatement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_statements: Option<i64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for GetSemanticContextResponse {
    fn default() -> Self {
        Self {
            semantic_context: None,
            available_statements: Some(0),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for GetSemanticContextResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.semantic_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnableSemanticContextRequest {
    pub statement_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for EnableSemanticContextRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Lists the statement ids that were actually enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnableSemanticContextResponse {
    pub statement_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for EnableSemanticContextResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisableSemanticContextRequest {
    pub statement_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for DisableSemanticContextRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Lists the statement ids that were actually disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisableSemanticContextResponse {
    pub statement_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for DisableSemanticContextResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Blocking semantic context operations.
#[derive(Debug, Clone)]
pub struct SemanticContext {
    http: Arc<WaiiHttpClient>,
}

impl SemanticContext {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    pub fn modify_semantic_context(
        &self,
        params: &ModifySemanticContextRequest,
    ) -> Result<ModifySemanticContextResponse, ApiError> {
        self.http.common_fetch(MODIFY_ENDPOINT, params)
    }

    pub fn get_semantic_context(
        &self,
        params: &GetSemanticContextRequest,
    ) -> Result<GetSemanticContextResponse, ApiError> {
        self.http.common_fetch(GET_ENDPOINT, params)
    }

    pub fn enable_semantic_context(
        &self,
        params: &EnableSemanticContextRequest,
    ) -> Result<EnableSemanticContextResponse, ApiError> {
        self.http.common_fetch(ENABLE_ENDPOINT, params)
    }

    pub fn disable_semantic_context(
        &self,
        params: &DisableSemanticContextRequest,
    ) -> Result<DisableSemanticContextResponse, ApiError> {
        self.http.common_fetch(DISABLE_ENDPOINT, params)
    }
}

/// [`SemanticContext`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncSemanticContext {
    inner: AsyncFacade<SemanticContext>,
}

impl AsyncSemanticContext {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(SemanticContext::new(http)),
        }
    }

    pub async fn modify_semantic_context(
        &self,
        params: ModifySemanticContextRequest,
    ) -> Result<ModifySemanticContextResponse, ApiError> {
        self.inner
            .run(move |ctx| ctx.modify_semantic_context(&params))
            .await
    }

    pub async fn get_semantic_context(
        &self,
        params: GetSemanticContextRequest,
    ) -> Result<GetSemanticContextResponse, ApiError> {
        self.inner
            .run(move |ctx| ctx.get_semantic_context(&params))
            .await
    }

    pub async fn enable_semantic_context(
        &self,
        params: EnableSemanticContextRequest,
    ) -> Result<EnableSemanticContextResponse, ApiError> {
        self.inner
            .run(move |ctx| ctx.enable_semantic_context(&params))
            .await
    }

    pub async fn disable_semantic_context(
        &self,
        params: DisableSemanticContextRequest,
    ) -> Result<DisableSemanticContextResponse, ApiError> {
        self.inner
            .run(move |ctx| ctx.disable_semantic_context(&params))
            .await
    }
}

fn default_statement_limit() -> i64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statement_defaults_are_wildcarded_and_enabled() {
        let statement = SemanticStatement::new("all amounts are in cents");
        assert_eq!(statement.always_include, Some(true));
        assert_eq!(statement.critical, Some(false));
        assert_eq!(statement.enabled, Some(true));
        assert_eq!(statement.user_id.as_deref(), Some("*"));
        assert_eq!(statement.tenant_id.as_deref(), Some("*"));
        assert_eq!(statement.org_id.as_deref(), Some("*"));
    }

    #[test]
    fn get_request_defaults_include_filter_and_paging() {
        let value = serde_json::to_value(GetSemanticContextRequest::default()).unwrap();
        assert_eq!(value["offset"], json!(0));
        assert_eq!(value["limit"], json!(1000));
        assert_eq!(value["filter"], json!({}));
        assert!(value.get("search_text").is_none());
    }

    #[test]
    fn get_request_paging_survives_decode_when_missing() {
        let decoded: GetSemanticContextRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(decoded.offset, 0);
        assert_eq!(decoded.limit, 1000);
    }

    #[test]
    fn nested_statement_extras_fail_validation() {
        let mut statement = SemanticStatement::new("joins go through the dim tables");
        statement
            .extra
            .insert("priority".to_string(), json!("high"));
        let request = ModifySemanticContextRequest {
            updated: Some(vec![statement]),
            ..ModifySemanticContextRequest::default()
        };

        let err = request.check_extra_fields().unwrap_err();
        assert_eq!(err.fields, vec!["priority".to_string()]);
    }
}
