//! Shapes shared by several feature modules: the bare common request, the
//! empty common response, and the polling types for server-side async
//! operations.
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The request shape for operations that take no parameters of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for CommonRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonResponse {
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for CommonResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOperationStatusRequest {
    pub op_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for CheckOperationStatusRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

impl CheckOperationStatusRequest {
    pub fn new(op_id: impl Into<String>) -> Self {
        Self {
            op_id: op_id.into(),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Succeeded,
    Failed,
    InProgress,
    NotExists,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOperationStatusResponse {
    pub op_id: String,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for CheckOperationStatusResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Returned by `submit-*` endpoints; the uuid keys later result lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncObjectResponse {
    pub uuid: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for AsyncObjectResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetObjectRequest {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetObjectRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

impl GetObjectRequest {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}
