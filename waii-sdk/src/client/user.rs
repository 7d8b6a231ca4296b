//! # Users and Access Keys
//!
//! API key management for the calling user. These endpoints work without
//! an active connection, since a fresh account needs a key before it can
//! do anything else.
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const LIST_ACCESS_KEY_ENDPOINT: &str = "list-access-keys";
const DELETE_ACCESS_KEY_ENDPOINT: &str = "delete-access-keys";
const CREATE_KEY_ENDPOINT: &str = "create-key";

/// A service user, as referenced by access rules and impersonation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            tenant_id: None,
            org_id: None,
            variables: None,
            roles: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for User {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccessKeyRequest {
    pub name: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CreateAccessKeyRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for CreateAccessKeyRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessKey {
    pub access_key: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for AccessKey {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetAccessKeyRequest {
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetAccessKeyRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetAccessKeyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_keys: Option<Vec<AccessKey>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetAccessKeyResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.access_keys.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelAccessKeyRequest {
    pub names: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for DelAccessKeyRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelAccessKeyResponse {
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for DelAccessKeyResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Blocking access key operations.
#[derive(Debug, Clone)]
pub struct UserApi {
    http: Arc<WaiiHttpClient>,
}

impl UserApi {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    /// Mints a named access key and returns the full key list.
    pub fn create_access_key(
        &self,
        params: &CreateAccessKeyRequest,
    ) -> Result<GetAccessKeyResponse, ApiError> {
        self.http.common_fetch_no_scope(CREATE_KEY_ENDPOINT, params)
    }

    pub fn list_access_keys(
        &self,
        params: &GetAccessKeyRequest,
    ) -> Result<GetAccessKeyResponse, ApiError> {
        self.http
            .common_fetch_no_scope(LIST_ACCESS_KEY_ENDPOINT, params)
    }

    pub fn delete_access_key(
        &self,
        params: &DelAccessKeyRequest,
    ) -> Result<DelAccessKeyResponse, ApiError> {
        self.http
            .common_fetch_no_scope(DELETE_ACCESS_KEY_ENDPOINT, params)
    }
}

/// [`UserApi`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncUserApi {
    inner: AsyncFacade<UserApi>,
}

impl AsyncUserApi {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(UserApi::new(http)),
        }
    }

    pub async fn create_access_key(
        &self,
        params: CreateAccessKeyRequest,
    ) -> Result<GetAccessKeyResponse, ApiError> {
        self.inner.run(move |user| user.create_access_key(&params)).await
    }

    pub async fn list_access_keys(
        &self,
        params: GetAccessKeyRequest,
    ) -> Result<GetAccessKeyResponse, ApiError> {
        self.inner.run(move |user| user.list_access_keys(&params)).await
    }

    pub async fn delete_access_key(
        &self,
        params: DelAccessKeyRequest,
    ) -> Result<DelAccessKeyResponse, ApiError> {
        self.inner.run(move |user| user.delete_access_key(&params)).await
    }
}
