//! # Semantic Layer Dumps
//!
//! Bulk export and import of everything the service knows about a
//! connection: semantic context, liked queries, schema descriptions and
//! the rest. Both directions run server side; the returned `op_id` is
//! polled through the status endpoints.
use crate::client::common::{CheckOperationStatusRequest, CheckOperationStatusResponse};
use crate::client::database::SearchContext;
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const EXPORT_ENDPOINT: &str = "semantic-layer/export";
const IMPORT_ENDPOINT: &str = "semantic-layer/import";
const IMPORT_STATUS_ENDPOINT: &str = "semantic-layer/import/status";
const EXPORT_STATUS_ENDPOINT: &str = "semantic-layer/export/status";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSemanticLayerDumpRequest {
    pub db_conn_key: String,
    #[serde(default = "default_search_context")]
    pub search_context: Vec<SearchContext>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ExportSemanticLayerDumpRequest {
    pub fn new(db_conn_key: impl Into<String>) -> Self {
        Self {
            db_conn_key: db_conn_key.into(),
            search_context: default_search_context(),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for ExportSemanticLayerDumpRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSemanticLayerDumpResponse {
    pub op_id: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ExportSemanticLayerDumpResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Replays an exported configuration into another connection. The mapping
/// tables rename schemas and databases on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSemanticLayerDumpRequest {
    pub db_conn_key: String,
    pub configuration: HashMap<String, Value>,
    #[serde(default)]
    pub schema_mapping: HashMap<String, String>,
    #[serde(default)]
    pub database_mapping: HashMap<String, String>,
    #[serde(default = "default_search_context")]
    pub search_context: Vec<SearchContext>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ImportSemanticLayerDumpRequest {
    pub fn new(db_conn_key: impl Into<String>, configuration: HashMap<String, Value>) -> Self {
        Self {
            db_conn_key: db_conn_key.into(),
            configuration,
            schema_mapping: HashMap::new(),
            database_mapping: HashMap::new(),
            search_context: default_search_context(),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for ImportSemanticLayerDumpRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.search_context.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSemanticLayerDumpResponse {
    pub op_id: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ImportSemanticLayerDumpResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Blocking dump operations.
#[derive(Debug, Clone)]
pub struct SemanticLayerDump {
    http: Arc<WaiiHttpClient>,
}

impl SemanticLayerDump {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    pub fn export_dump(
        &self,
        params: &ExportSemanticLayerDumpRequest,
    ) -> Result<ExportSemanticLayerDumpResponse, ApiError> {
        self.http.common_fetch(EXPORT_ENDPOINT, params)
    }

    pub fn import_dump(
        &self,
        params: &ImportSemanticLayerDumpRequest,
    ) -> Result<ImportSemanticLayerDumpResponse, ApiError> {
        self.http.common_fetch(IMPORT_ENDPOINT, params)
    }

    pub fn export_dump_status(
        &self,
        params: &CheckOperationStatusRequest,
    ) -> Result<CheckOperationStatusResponse, ApiError> {
        self.http.common_fetch(EXPORT_STATUS_ENDPOINT, params)
    }

    pub fn import_dump_status(
        &self,
        params: &CheckOperationStatusRequest,
    ) -> Result<CheckOperationStatusResponse, ApiError> {
        self.http.common_fetch(IMPORT_STATUS_ENDPOINT, params)
    }
}

/// [`SemanticLayerDump`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncSemanticLayerDump {
    inner: AsyncFacade<SemanticLayerDump>,
}

impl AsyncSemanticLayerDump {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(SemanticLayerDump::new(http)),
        }
    }

    pub async fn export_dump(
        &self,
        params: ExportSemanticLayerDumpRequest,
    ) -> Result<ExportSemanticLayerDumpResponse, ApiError> {
        self.inner.run(move |dump| dump.export_dump(&params)).await
    }

    pub async fn import_dump(
        &self,
        params: ImportSemanticLayerDumpRequest,
    ) -> Result<ImportSemanticLayerDumpResponse, ApiError> {
        self.inner.run(move |dump| dump.import_dump(&params)).await
    }

    pub async fn export_dump_status(
        &self,
        params: CheckOperationStatusRequest,
    ) -> Result<CheckOperationStatusResponse, ApiError> {
        self.inner.run(move |dump| dump.export_dump_status(&params)).await
    }

    pub async fn import_dump_status(
        &self,
        params: CheckOperationStatusRequest,
    ) -> Result<CheckOperationStatusResponse, ApiError> {
        self.inner.run(move |dump| dump.import_dump_status(&params)).await
    }
}

fn default_search_context() -> Vec<SearchContext> {
    vec![SearchContext::default()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn export_request_defaults_to_match_everything() {
        let value = serde_json::to_value(ExportSemanticLayerDumpRequest::new("conn-1")).unwrap();
        assert_eq!(value["db_conn_key"], json!("conn-1"));
        assert_eq!(
            value["search_context"],
            json!([{"db_name": "*", "schema_name": "*", "table_name": "*"}])
        );
    }

    #[test]
    fn import_request_serializes_empty_mappings() {
        let mut configuration = HashMap::new();
        configuration.insert("version".to_string(), json!(1));
        let value =
            serde_json::to_value(ImportSemanticLayerDumpRequest::new("conn-2", configuration))
                .unwrap();

        assert_eq!(value["schema_mapping"], json!({}));
        assert_eq!(value["database_mapping"], json!({}));
        assert_eq!(value["configuration"]["version"], json!(1));
    }
}
