//! # Query Generation and Execution
//!
//! The heart of the SDK: turn a natural language ask into SQL, refine it
//! with tweak history, run it, and inspect the result set. Also hosts the
//! surrounding operations the service exposes for queries: describe, diff,
//! autocomplete, performance analysis, dialect transcoding, similarity
//! lookup, compiler checks and table access rules.
//!
//! ## How it works
//!
//! `generate` and `transcode` return a [`GeneratedQuery`] that stays
//! attached to the client it came from, so `generated.run()` works without
//! rebuilding a request by hand. Long running generations can instead go
//! through `submit_generate_query` and be polled with `get_generated_query`.
use crate::client::common::{AsyncObjectResponse, GetObjectRequest};
use crate::client::database::{SchemaName, SearchContext, TableName};
use crate::client::semantic_context::SemanticStatement;
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const GENERATE_ENDPOINT: &str = "generate-query";
const RUN_ENDPOINT: &str = "run-query";
const SUBMIT_ENDPOINT: &str = "submit-query";
const FAVORITE_ENDPOINT: &str = "like-query";
const DESCRIBE_ENDPOINT: &str = "describe-query";
const DIFF_ENDPOINT: &str = "diff-query";
const RESULTS_ENDPOINT: &str = "get-query-result";
const CANCEL_ENDPOINT: &str = "cancel-query";
const AUTOCOMPLETE_ENDPOINT: &str = "auto-complete";
const PERF_ENDPOINT: &str = "get-query-performance";
const TRANSCODE_ENDPOINT: &str = "transcode-query";
const GENERATE_QUESTION_ENDPOINT: &str = "generate-questions";
const SIMILAR_QUERY_ENDPOINT: &str = "get-similar-query";
const RUN_COMPILER_ENDPOINT: &str = "run-query-compiler";
const CONTEXT_CHECKER_ENDPOINT: &str = "semantic-context-checker";
const APPLY_ACCESS_RULES_ENDPOINT: &str = "apply-table-access-rules";
const SUBMIT_GENERATE_ENDPOINT: &str = "submit-generate-query";
const GET_GENERATED_ENDPOINT: &str = "get-generated-query";
const GET_LIKED_ENDPOINT: &str = "get-liked-query";

/// Keys the service may use in [`GeneratedQuery::debug_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebugInfoType {
    #[serde(rename = "learned_template")]
    LearnedTemplate,
    #[serde(rename = "retry_info")]
    RetryInfo,
    #[serde(rename = "equivalent")]
    Equivalent,
    #[serde(rename = "fixit_info")]
    FixitInfo,
    #[serde(rename = "query_gen_source")]
    QueryGenSource,
    #[serde(rename = "query_gen_model")]
    QueryGenModel,
    #[serde(rename = "empty_table_selection")]
    EmptyTableSelection,
    #[serde(rename = "after_considering_tweak_history")]
    AfterTweakHistory,
    #[serde(rename = "after_info_schema_check")]
    AfterInfoSchemaCheck,
    #[serde(rename = "after_embedding_match")]
    AfterEmbeddingMatch,
    #[serde(rename = "after_initial_table_selection")]
    AfterInitialTableSelection,
    #[serde(rename = "after_iterative_table_selection")]
    AfterIterativeTableSelection,
}

/// Audience for query descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPersona {
    SqlExpert,
    DomainExpert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryGenerationStep {
    #[serde(rename = "Selecting Tables and Rules")]
    SelectingTablesAndRules,
    #[serde(rename = "Generating Query")]
    GeneratingQuery,
    #[serde(rename = "Validating Query")]
    ValidatingQuery,
    #[serde(rename = "Completed")]
    Completed,
}

/// One refinement round: either edited SQL, a follow-up ask, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tweak {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for Tweak {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryGenerationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<Vec<SearchContext>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweak_history: Option<Vec<Tweak>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_example_queries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<Vec<SemanticStatement>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl QueryGenerationRequest {
    pub fn from_ask(ask: impl Into<String>) -> Self {
        Self {
            ask: Some(ask.into()),
            ..Self::default()
        }
    }
}

impl Default for QueryGenerationRequest {
    fn default() -> Self {
        Self {
            tags: None,
            parameters: None,
            model: None,
            use_cache: Some(true),
            search_context: None,
            tweak_history: None,
            ask: None,
            uuid: None,
            dialect: None,
            parent_uuid: None,
            flags: Some(HashMap::new()),
            use_example_queries: Some(true),
            additional_context: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for QueryGenerationRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()?;
        self.tweak_history.check_extra_fields()?;
        self.additional_context.check_extra_fields()
    }
}

/// Translates a query between SQL dialects, optionally reshaping it with a
/// fresh ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeQueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<Vec<SearchContext>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dialect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_dialect: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for TranscodeQueryRequest {
    fn default() -> Self {
        Self {
            tags: None,
            parameters: None,
            model: None,
            use_cache: Some(true),
            search_context: None,
            ask: Some(String::new()),
            source_dialect: None,
            source_query: None,
            target_dialect: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for TranscodeQueryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribeQueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<Vec<SearchContext>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_context: Option<Vec<SemanticStatement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<TargetPersona>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for DescribeQueryRequest {
    fn default() -> Self {
        Self {
            tags: None,
            parameters: None,
            search_context: None,
            current_schema: None,
            query: None,
            asks: None,
            semantic_context: None,
            persona: Some(TargetPersona::SqlExpert),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for DescribeQueryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()?;
        self.semantic_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeQueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableName>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for DescribeQueryResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.tables.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffQueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<Vec<SearchContext>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_context: Option<Vec<SemanticStatement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<TargetPersona>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for DiffQueryRequest {
    fn default() -> Self {
        Self {
            tags: None,
            parameters: None,
            search_context: None,
            current_schema: None,
            query: None,
            previous_query: None,
            asks: None,
            semantic_context: None,
            persona: Some(TargetPersona::SqlExpert),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for DiffQueryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()?;
        self.semantic_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffQueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableName>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what_changed: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for DiffQueryResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.tables.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for CompilationError {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LLMUsageStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_total: Option<i64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for LLMUsageStatistics {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// A stored query matched by similarity lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedQuery {
    pub uuid: String,
    pub ask: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_steps: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for MatchedQuery {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_prob_sum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_value: Option<f64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ConfidenceScore {
    /// Average per-token probability, `0.0` when no tokens were recorded.
    pub fn linear_probability(&self) -> f64 {
        match (self.log_prob_sum, self.token_count) {
            (Some(log_prob_sum), Some(token_count)) if token_count > 0 => {
                (log_prob_sum / token_count as f64).exp()
            }
            _ => 0.0,
        }
    }
}

impl StrictFields for ConfidenceScore {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRuleProtectionState {
    Protected,
    Unprotected,
    Uncompilable,
    Unexplainable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRuleProtectionStatus {
    pub state: AccessRuleProtectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for AccessRuleProtectionStatus {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyTableAccessRulesResponse {
    pub query: String,
    pub status: AccessRuleProtectionStatus,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ApplyTableAccessRulesResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.status.check_extra_fields()
    }
}

/// A query produced by the service, with everything it learned on the way.
///
/// Values returned by [`Query::generate`] and [`Query::transcode`] keep a
/// handle to the client that produced them, so [`run`](Self::run) and
/// [`apply_table_access_rules`](Self::apply_table_access_rules) can be
/// called directly. Values decoded from anywhere else (history entries,
/// chat responses) are detached and those calls return
/// [`ApiError::Detached`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<QueryGenerationStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableName>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_context: Option<Vec<SemanticStatement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what_changed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compilation_errors: Option<Vec<CompilationError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_usage_stats: Option<LLMUsageStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<ConfidenceScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
    #[serde(skip)]
    http_client: Option<Arc<WaiiHttpClient>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl GeneratedQuery {
    pub(crate) fn attach(&mut self, http: Arc<WaiiHttpClient>) {
        self.http_client = Some(http);
    }

    fn attached(&self) -> Result<Query, ApiError> {
        self.http_client
            .clone()
            .map(Query::new)
            .ok_or(ApiError::Detached)
    }

    /// Executes the generated SQL on the client that produced this value.
    pub fn run(&self) -> Result<GetQueryResultResponse, ApiError> {
        let query = self.attached()?;
        query.run(&RunQueryRequest::new(
            self.query.clone().unwrap_or_default(),
        ))
    }

    /// Rewrites the generated SQL with the caller's table access rules
    /// applied.
    pub fn apply_table_access_rules(&self) -> Result<ApplyTableAccessRulesResponse, ApiError> {
        let query = self.attached()?;
        query.apply_table_access_rules(&ApplyTableAccessRulesRequest::new(
            self.query.clone().unwrap_or_default(),
        ))
    }
}

impl StrictFields for GeneratedQuery {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.tables.check_extra_fields()?;
        self.semantic_context.check_extra_fields()?;
        self.compilation_errors.check_extra_fields()?;
        self.llm_usage_stats.check_extra_fields()?;
        self.confidence_score.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunQueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_schema: Option<SchemaName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_parameters: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl RunQueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: None,
            current_schema: None,
            session_parameters: None,
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for RunQueryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.current_schema.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunQueryCompilerRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<Vec<SearchContext>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<Vec<SemanticStatement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl RunQueryCompilerRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_context: None,
            additional_context: None,
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for RunQueryCompilerRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()?;
        self.additional_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunQueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for RunQueryResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetQueryResultRequest {
    pub query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_returned_rows: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl GetQueryResultRequest {
    pub fn new(query_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            max_returned_rows: Some(10_000),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for GetQueryResultRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelQueryRequest {
    pub query_id: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CancelQueryRequest {
    pub fn new(query_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for CancelQueryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelQueryResponse {
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for CancelQueryResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetQueryResultResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub more_rows: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_definitions: Option<Vec<crate::client::database::ColumnDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_uuid: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetQueryResultResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.column_definitions.check_extra_fields()
    }
}

/// Marks a query as a curated example, by uuid or by ask/query pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite_question: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_org_id: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for LikedQuery {
    fn default() -> Self {
        Self {
            query_uuid: None,
            ask: None,
            query: None,
            liked: false,
            rewrite_question: Some(false),
            detailed_steps: Some(Vec::new()),
            target_user_id: None,
            target_tenant_id: None,
            target_org_id: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for LikedQuery {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetLikedQueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetLikedQueryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetLikedQueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<LikedQuery>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetLikedQueryResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.queries.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeQueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite_question: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for LikeQueryRequest {
    fn default() -> Self {
        Self {
            query_uuid: None,
            ask: None,
            query: None,
            liked: false,
            rewrite_question: Some(false),
            detailed_steps: Some(Vec::new()),
            target_user_id: None,
            target_tenant_id: None,
            target_org_id: None,
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for LikeQueryRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikeQueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<LikedQuery>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for LikeQueryResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.queries.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoCompleteRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<Vec<SearchContext>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl AutoCompleteRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor_offset: None,
            dialect: None,
            search_context: None,
            max_output_tokens: None,
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for AutoCompleteRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoCompleteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for AutoCompleteResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPerformanceRequest {
    pub query_id: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl QueryPerformanceRequest {
    pub fn new(query_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for QueryPerformanceRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPerformanceResponse {
    pub summary: Vec<String>,
    pub recommendations: Vec<String>,
    pub query_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compilation_time_ms: Option<i64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for QueryPerformanceResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedQuestionComplexity {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateQuestionRequest {
    pub schema_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_questions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<GeneratedQuestionComplexity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl GenerateQuestionRequest {
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            n_questions: Some(10),
            complexity: Some(GeneratedQuestionComplexity::Hard),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for GenerateQuestionRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub complexity: GeneratedQuestionComplexity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableName>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GeneratedQuestion {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.tables.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateQuestionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<GeneratedQuestion>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GenerateQuestionResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.questions.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarQueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equivalent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<MatchedQuery>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for SimilarQueryResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.query.check_extra_fields()
    }
}

/// Compilation verdict from the database engine, carried on the wire as an
/// integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilationStateFromDbEngine {
    /// The explain itself failed, e.g. for permission reasons.
    Unknown,
    Compilable,
    Uncompilable,
}

impl CompilationStateFromDbEngine {
    fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Compilable => 1,
            Self::Uncompilable => 2,
        }
    }
}

impl Serialize for CompilationStateFromDbEngine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for CompilationStateFromDbEngine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i32::deserialize(deserializer)? {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Compilable),
            2 => Ok(Self::Uncompilable),
            other => Err(serde::de::Error::custom(format!(
                "unknown compilation state: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationErrorMsgFromDbEngine {
    pub state: CompilationStateFromDbEngine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for CompilationErrorMsgFromDbEngine {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunQueryCompilerResponse {
    pub query: String,
    pub errors: String,
    pub should_compile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableName>>,
    pub explain_error_msg: CompilationErrorMsgFromDbEngine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforce_table_access_rules_response: Option<ApplyTableAccessRulesResponse>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for RunQueryCompilerResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.tables.check_extra_fields()?;
        self.explain_error_msg.check_extra_fields()?;
        self.enforce_table_access_rules_response.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticContextCheckerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<Vec<SearchContext>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<HashMap<String, Value>>,
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

impl Default for SemanticContextCheckerRequest {
    fn default() -> Self {
        Self {
            ask: None,
            query: None,
            dialect: None,
            search_context: None,
            flags: None,
            model: None,
            use_cache: Some(true),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for SemanticContextCheckerRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyTableAccessRulesRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ApplyTableAccessRulesRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for ApplyTableAccessRulesRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Blocking query operations.
#[derive(Debug, Clone)]
pub struct Query {
    http: Arc<WaiiHttpClient>,
}

impl Query {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    /// Generates SQL from a natural language ask. The returned value stays
    /// attached to this client so it can be run directly.
    pub fn generate(&self, params: &QueryGenerationRequest) -> Result<GeneratedQuery, ApiError> {
        let mut generated: GeneratedQuery = self.http.common_fetch(GENERATE_ENDPOINT, params)?;
        generated.attach(Arc::clone(&self.http));
        Ok(generated)
    }

    /// Runs a query to completion and returns its result set.
    pub fn run(&self, params: &RunQueryRequest) -> Result<GetQueryResultResponse, ApiError> {
        self.http.common_fetch(RUN_ENDPOINT, params)
    }

    pub fn like(&self, params: &LikeQueryRequest) -> Result<LikeQueryResponse, ApiError> {
        self.http.common_fetch(FAVORITE_ENDPOINT, params)
    }

    /// Starts a query without waiting for it. Pair with
    /// [`get_results`](Self::get_results) and [`cancel`](Self::cancel).
    pub fn submit(&self, params: &RunQueryRequest) -> Result<RunQueryResponse, ApiError> {
        self.http.common_fetch(SUBMIT_ENDPOINT, params)
    }

    pub fn get_results(
        &self,
        params: &GetQueryResultRequest,
    ) -> Result<GetQueryResultResponse, ApiError> {
        self.http.common_fetch(RESULTS_ENDPOINT, params)
    }

    pub fn cancel(&self, params: &CancelQueryRequest) -> Result<CancelQueryResponse, ApiError> {
        self.http.common_fetch(CANCEL_ENDPOINT, params)
    }

    pub fn describe(
        &self,
        params: &DescribeQueryRequest,
    ) -> Result<DescribeQueryResponse, ApiError> {
        self.http.common_fetch(DESCRIBE_ENDPOINT, params)
    }

    pub fn auto_complete(
        &self,
        params: &AutoCompleteRequest,
    ) -> Result<AutoCompleteResponse, ApiError> {
        self.http.common_fetch(AUTOCOMPLETE_ENDPOINT, params)
    }

    pub fn diff(&self, params: &DiffQueryRequest) -> Result<DiffQueryResponse, ApiError> {
        self.http.common_fetch(DIFF_ENDPOINT, params)
    }

    pub fn analyze_performance(
        &self,
        params: &QueryPerformanceRequest,
    ) -> Result<QueryPerformanceResponse, ApiError> {
        self.http.common_fetch(PERF_ENDPOINT, params)
    }

    /// Translates a query into another dialect. The returned value stays
    /// attached to this client.
    pub fn transcode(&self, params: &TranscodeQueryRequest) -> Result<GeneratedQuery, ApiError> {
        let mut generated: GeneratedQuery = self.http.common_fetch(TRANSCODE_ENDPOINT, params)?;
        generated.attach(Arc::clone(&self.http));
        Ok(generated)
    }

    pub fn generate_question(
        &self,
        params: &GenerateQuestionRequest,
    ) -> Result<GenerateQuestionResponse, ApiError> {
        self.http.common_fetch(GENERATE_QUESTION_ENDPOINT, params)
    }

    pub fn get_similar_query(
        &self,
        params: &QueryGenerationRequest,
    ) -> Result<SimilarQueryResponse, ApiError> {
        self.http.common_fetch(SIMILAR_QUERY_ENDPOINT, params)
    }

    pub fn run_query_compiler(
        &self,
        params: &RunQueryCompilerRequest,
    ) -> Result<RunQueryCompilerResponse, ApiError> {
        self.http.common_fetch(RUN_COMPILER_ENDPOINT, params)
    }

    pub fn semantic_context_checker(
        &self,
        params: &SemanticContextCheckerRequest,
    ) -> Result<GeneratedQuery, ApiError> {
        self.http.common_fetch(CONTEXT_CHECKER_ENDPOINT, params)
    }

    pub fn apply_table_access_rules(
        &self,
        params: &ApplyTableAccessRulesRequest,
    ) -> Result<ApplyTableAccessRulesResponse, ApiError> {
        self.http.common_fetch(APPLY_ACCESS_RULES_ENDPOINT, params)
    }

    /// Kicks off generation server side and returns a handle to poll with
    /// [`get_generated_query`](Self::get_generated_query).
    pub fn submit_generate_query(
        &self,
        params: &QueryGenerationRequest,
    ) -> Result<AsyncObjectResponse, ApiError> {
        self.http.common_fetch(SUBMIT_GENERATE_ENDPOINT, params)
    }

    pub fn get_generated_query(
        &self,
        params: &GetObjectRequest,
    ) -> Result<GeneratedQuery, ApiError> {
        self.http.common_fetch(GET_GENERATED_ENDPOINT, params)
    }

    pub fn get_liked_query(
        &self,
        params: &GetLikedQueryRequest,
    ) -> Result<GetLikedQueryResponse, ApiError> {
        self.http.common_fetch(GET_LIKED_ENDPOINT, params)
    }
}

/// [`Query`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncQuery {
    inner: AsyncFacade<Query>,
}

impl AsyncQuery {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(Query::new(http)),
        }
    }

    pub async fn generate(&self, params: QueryGenerationRequest) -> Result<GeneratedQuery, ApiError> {
        self.inner.run(move |q| q.generate(&params)).await
    }

    pub async fn run(&self, params: RunQueryRequest) -> Result<GetQueryResultResponse, ApiError> {
        self.inner.run(move |q| q.run(&params)).await
    }

    pub async fn like(&self, params: LikeQueryRequest) -> Result<LikeQueryResponse, ApiError> {
        self.inner.run(move |q| q.like(&params)).await
    }

    pub async fn submit(&self, params: RunQueryRequest) -> Result<RunQueryResponse, ApiError> {
        self.inner.run(move |q| q.submit(&params)).await
    }

    pub async fn get_results(
        &self,
        params: GetQueryResultRequest,
    ) -> Result<GetQueryResultResponse, ApiError> {
        self.inner.run(move |q| q.get_results(&params)).await
    }

    pub async fn cancel(&self, params: CancelQueryRequest) -> Result<CancelQueryResponse, ApiError> {
        self.inner.run(move |q| q.cancel(&params)).await
    }

    pub async fn describe(
        &self,
        params: DescribeQueryRequest,
    ) -> Result<DescribeQueryResponse, ApiError> {
        self.inner.run(move |q| q.describe(&params)).await
    }

    pub async fn auto_complete(
        &self,
        params: AutoCompleteRequest,
    ) -> Result<AutoCompleteResponse, ApiError> {
        self.inner.run(move |q| q.auto_complete(&params)).await
    }

    pub async fn diff(&self, params: DiffQueryRequest) -> Result<DiffQueryResponse, ApiError> {
        self.inner.run(move |q| q.diff(&params)).await
    }

    pub async fn analyze_performance(
        &self,
        params: QueryPerformanceRequest,
    ) -> Result<QueryPerformanceResponse, ApiError> {
        self.inner.run(move |q| q.analyze_performance(&params)).await
    }

    pub async fn transcode(&self, params: TranscodeQueryRequest) -> Result<GeneratedQuery, ApiError> {
        self.inner.run(move |q| q.transcode(&params)).await
    }

    pub async fn generate_question(
        &self,
        params: GenerateQuestionRequest,
    ) -> Result<GenerateQuestionResponse, ApiError> {
        self.inner.run(move |q| q.generate_question(&params)).await
    }

    pub async fn get_similar_query(
        &self,
        params: QueryGenerationRequest,
    ) -> Result<SimilarQueryResponse, ApiError> {
        self.inner.run(move |q| q.get_similar_query(&params)).await
    }

    pub async fn run_query_compiler(
        &self,
        params: RunQueryCompilerRequest,
    ) -> Result<RunQueryCompilerResponse, ApiError> {
        self.inner.run(move |q| q.run_query_compiler(&params)).await
    }

    pub async fn semantic_context_checker(
        &self,
        params: SemanticContextCheckerRequest,
    ) -> Result<GeneratedQuery, ApiError> {
        self.inner
            .run(move |q| q.semantic_context_checker(&params))
            .await
    }

    pub async fn apply_table_access_rules(
        &self,
        params: ApplyTableAccessRulesRequest,
    ) -> Result<ApplyTableAccessRulesResponse, ApiError> {
        self.inner
            .run(move |q| q.apply_table_access_rules(&params))
            .await
    }

    pub async fn submit_generate_query(
        &self,
        params: QueryGenerationRequest,
    ) -> Result<AsyncObjectResponse, ApiError> {
        self.inner.run(move |q| q.submit_generate_query(&params)).await
    }

    pub async fn get_generated_query(
        &self,
        params: GetObjectRequest,
    ) -> Result<GeneratedQuery, ApiError> {
        self.inner.run(move |q| q.get_generated_query(&params)).await
    }

    pub async fn get_liked_query(
        &self,
        params: GetLikedQueryRequest,
    ) -> Result<GetLikedQueryResponse, ApiError> {
        self.inner.run(move |q| q.get_liked_query(&params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generation_request_defaults() {
        let request = QueryGenerationRequest::from_ask("show all users");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["ask"], json!("show all users"));
        assert_eq!(value["use_cache"], json!(true));
        assert_eq!(value["use_example_queries"], json!(true));
        assert_eq!(value["flags"], json!({}));
        assert!(value.get("dialect").is_none());
        assert!(value.get("tweak_history").is_none());
    }

    #[test]
    fn generation_steps_serialize_as_display_names() {
        assert_eq!(
            serde_json::to_value(QueryGenerationStep::SelectingTablesAndRules).unwrap(),
            json!("Selecting Tables and Rules")
        );
        assert_eq!(
            serde_json::to_value(QueryGenerationStep::Completed).unwrap(),
            json!("Completed")
        );
    }

    #[test]
    fn debug_info_keys_use_wire_names() {
        assert_eq!(
            serde_json::to_value(DebugInfoType::AfterTweakHistory).unwrap(),
            json!("after_considering_tweak_history")
        );
    }

    #[test]
    fn compilation_state_is_an_integer_code() {
        assert_eq!(
            serde_json::to_value(CompilationStateFromDbEngine::Compilable).unwrap(),
            json!(1)
        );
        let state: CompilationStateFromDbEngine = serde_json::from_value(json!(2)).unwrap();
        assert_eq!(state, CompilationStateFromDbEngine::Uncompilable);
        assert!(serde_json::from_value::<CompilationStateFromDbEngine>(json!(7)).is_err());
    }

    #[test]
    fn linear_probability_handles_missing_counts() {
        let score = ConfidenceScore {
            log_prob_sum: Some(-0.5),
            token_count: Some(5),
            ..ConfidenceScore::default()
        };
        assert!((score.linear_probability() - (-0.1f64).exp()).abs() < 1e-12);

        assert_eq!(ConfidenceScore::default().linear_probability(), 0.0);
        let zero_tokens = ConfidenceScore {
            log_prob_sum: Some(-0.5),
            token_count: Some(0),
            ..ConfidenceScore::default()
        };
        assert_eq!(zero_tokens.linear_probability(), 0.0);
    }

    #[test]
    fn detached_query_cannot_run() {
        let generated = GeneratedQuery {
            query: Some("SELECT 1".to_string()),
            ..GeneratedQuery::default()
        };
        assert!(matches!(generated.run(), Err(ApiError::Detached)));
        assert!(matches!(
            generated.apply_table_access_rules(),
            Err(ApiError::Detached)
        ));
    }

    #[test]
    fn liked_query_defaults_keep_explicit_false() {
        let value = serde_json::to_value(LikedQuery::default()).unwrap();
        assert_eq!(value["liked"], json!(false));
        assert_eq!(value["rewrite_question"], json!(false));
        assert_eq!(value["detailed_steps"], json!([]));
        assert!(value.get("query_uuid").is_none());
    }

    #[test]
    fn result_request_caps_rows_by_default() {
        let value = serde_json::to_value(GetQueryResultRequest::new("qid-1")).unwrap();
        assert_eq!(value["max_returned_rows"], json!(10_000));
    }
}
