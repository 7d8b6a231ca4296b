//! # Service Parameters
//!
//! Tunable knobs the service exposes per org, tenant, user or connection,
//! addressed by dotted names like `PUBLIC.REFLECTION.ENABLED`.
use crate::client::common::{CommonRequest, CommonResponse};
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const UPDATE_PARAMETER_ENDPOINT: &str = "update-parameter";
const LIST_PARAMETER_ENDPOINT: &str = "list-parameters";
const DELETE_PARAMETER_ENDPOINT: &str = "delete-parameter";

/// Well-known parameter names.
pub mod parameters {
    pub const LIKED_QUERIES_ENABLED: &str = "PUBLIC.LIKED_QUERIES.ENABLED";
    pub const LIKED_QUERIES_LEARNING_MODE: &str = "PUBLIC.LIKED_QUERIES.LEARNING_MODE";
    pub const REFLECTION_ENABLED: &str = "PUBLIC.REFLECTION.ENABLED";
    pub const GUARDRAIL_INVALID_QUESTION_CHECKER_ENABLED: &str =
        "PUBLIC.GUARDRAIL.INVALID_QUESTION_CHECKER.ENABLED";
    pub const QUERY_GENERATION_ANALYSIS_ENABLE_ALL: &str =
        "PUBLIC.QUERY_GENERATION.ANALYSIS.ENABLE_ALL";
    pub const DEEP_THINKING_ENABLED: &str = "PUBLIC.DEEP_THINKING.ENABLED";
}

/// Sets a parameter. The `target_*` fields narrow where the value applies;
/// all unset means the caller's own scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParameterRequest {
    pub parameter: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_connection_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl UpdateParameterRequest {
    pub fn new(parameter: impl Into<String>, value: Value) -> Self {
        Self {
            parameter: parameter.into(),
            value,
            target_org_id: None,
            target_tenant_id: None,
            target_user_id: None,
            target_connection_key: None,
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for UpdateParameterRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Resets a parameter to its inherited value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteParameterRequest {
    pub parameter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_connection_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl DeleteParameterRequest {
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            target_org_id: None,
            target_tenant_id: None,
            target_user_id: None,
            target_connection_key: None,
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for DeleteParameterRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_values: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ParameterInfo {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParametersResponse {
    pub parameters: HashMap<String, ParameterInfo>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ListParametersResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.parameters.check_extra_fields()
    }
}

/// Blocking parameter operations.
#[derive(Debug, Clone)]
pub struct Settings {
    http: Arc<WaiiHttpClient>,
}

impl Settings {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    pub fn update_parameter(
        &self,
        params: &UpdateParameterRequest,
    ) -> Result<CommonResponse, ApiError> {
        self.http.common_fetch(UPDATE_PARAMETER_ENDPOINT, params)
    }

    pub fn list_parameters(&self) -> Result<ListParametersResponse, ApiError> {
        self.http
            .common_fetch(LIST_PARAMETER_ENDPOINT, &CommonRequest::default())
    }

    pub fn delete_parameter(
        &self,
        params: &DeleteParameterRequest,
    ) -> Result<CommonResponse, ApiError> {
        self.http.common_fetch(DELETE_PARAMETER_ENDPOINT, params)
    }
}

/// [`Settings`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncSettings {
    inner: AsyncFacade<Settings>,
}

impl AsyncSettings {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(Settings::new(http)),
        }
    }

    pub async fn update_parameter(
        &self,
        params: UpdateParameterRequest,
    ) -> Result<CommonResponse, ApiError> {
        self.inner
            .run(move |settings| settings.update_parameter(&params))
            .await
    }

    pub async fn list_parameters(&self) -> Result<ListParametersResponse, ApiError> {
        self.inner.run(Settings::list_parameters).await
    }

    pub async fn delete_parameter(
        &self,
        params: DeleteParameterRequest,
    ) -> Result<CommonResponse, ApiError> {
        self.inner
            .run(move |settings| settings.delete_parameter(&params))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_request_carries_arbitrary_values() {
        let request = UpdateParameterRequest::new(parameters::REFLECTION_ENABLED, json!(true));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["parameter"], json!("PUBLIC.REFLECTION.ENABLED"));
        assert_eq!(value["value"], json!(true));
        assert!(value.get("target_org_id").is_none());
    }

    #[test]
    fn parameter_listing_decodes_info_map() {
        let response: ListParametersResponse = serde_json::from_value(json!({
            "parameters": {
                "PUBLIC.DEEP_THINKING.ENABLED": {
                    "value": false,
                    "possible_values": [true, false]
                }
            }
        }))
        .unwrap();

        let info = &response.parameters["PUBLIC.DEEP_THINKING.ENABLED"];
        assert_eq!(info.value, Some(json!(false)));
        assert_eq!(info.possible_values.as_ref().map(Vec::len), Some(2));
    }
}
