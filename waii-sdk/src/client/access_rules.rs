//! # Table Access Rules
//!
//! Row level protection attached to tables. A `filter` rule rewrites
//! queries with a guarding expression, a `block` rule stops matching users
//! from touching the table at all. Rules target users through the usual
//! org, tenant and user wildcards.
use crate::client::common::CommonResponse;
use crate::client::database::TableName;
use crate::client::user::User;
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const UPDATE_TABLE_ACCESS_RULES_ENDPOINT: &str = "update-table-access-rules";
const REMOVE_TABLE_ACCESS_RULES_ENDPOINT: &str = "remove-table-access-rules";
const LIST_TABLE_ACCESS_RULES_ENDPOINT: &str = "list-table-access-rules";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableAccessRuleType {
    /// Protect access with a filter expression.
    Filter,
    /// Stop all access from the identified users.
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAccessRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub table: TableName,
    #[serde(default = "wildcard")]
    pub org_id: String,
    #[serde(default = "wildcard")]
    pub tenant_id: String,
    #[serde(default = "wildcard")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub rule_type: TableAccessRuleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl TableAccessRule {
    pub fn new(
        name: impl Into<String>,
        table: TableName,
        rule_type: TableAccessRuleType,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            table,
            org_id: wildcard(),
            tenant_id: wildcard(),
            user_id: wildcard(),
            rule_type,
            expression: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for TableAccessRule {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.table.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTableAccessRuleRequest {
    pub rules: Vec<TableAccessRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for UpdateTableAccessRuleRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.rules.check_extra_fields()
    }
}

/// Removes rules by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoveTableAccessRuleRequest {
    pub rules: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for RemoveTableAccessRuleRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Lists rules, optionally narrowed to a table, ids, or the rules that
/// would apply to a given user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListTableAccessRuleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ListTableAccessRuleRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.table.check_extra_fields()?;
        self.lookup_user.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListTableAccessRuleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<TableAccessRule>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ListTableAccessRuleResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.rules.check_extra_fields()
    }
}

/// Blocking access rule operations.
#[derive(Debug, Clone)]
pub struct AccessRules {
    http: Arc<WaiiHttpClient>,
}

impl AccessRules {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    pub fn update_table_access_rules(
        &self,
        params: &UpdateTableAccessRuleRequest,
    ) -> Result<CommonResponse, ApiError> {
        self.http
            .common_fetch(UPDATE_TABLE_ACCESS_RULES_ENDPOINT, params)
    }

    pub fn remove_table_access_rules(
        &self,
        params: &RemoveTableAccessRuleRequest,
    ) -> Result<CommonResponse, ApiError> {
        self.http
            .common_fetch(REMOVE_TABLE_ACCESS_RULES_ENDPOINT, params)
    }

    pub fn list_table_access_rules(
        &self,
        params: &ListTableAccessRuleRequest,
    ) -> Result<ListTableAccessRuleResponse, ApiError> {
        self.http
            .common_fetch(LIST_TABLE_ACCESS_RULES_ENDPOINT, params)
    }
}

/// [`AccessRules`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncAccessRules {
    inner: AsyncFacade<AccessRules>,
}

impl AsyncAccessRules {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(AccessRules::new(http)),
        }
    }

    pub async fn update_table_access_rules(
        &self,
        params: UpdateTableAccessRuleRequest,
    ) -> Result<CommonResponse, ApiError> {
        self.inner
            .run(move |rules| rules.update_table_access_rules(&params))
            .await
    }

    pub async fn remove_table_access_rules(
        &self,
        params: RemoveTableAccessRuleRequest,
    ) -> Result<CommonResponse, ApiError> {
        self.inner
            .run(move |rules| rules.remove_table_access_rules(&params))
            .await
    }

    pub async fn list_table_access_rules(
        &self,
        params: ListTableAccessRuleRequest,
    ) -> Result<ListTableAccessRuleResponse, ApiError> {
        self.inner
            .run(move |rules| rules.list_table_access_rules(&params))
            .await
    }
}

fn wildcard() -> String {
    "*".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rules_default_to_wildcard_targets() {
        let rule = TableAccessRule::new(
            "region lock",
            TableName::new("ORDERS"),
            TableAccessRuleType::Filter,
        );
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["org_id"], json!("*"));
        assert_eq!(value["tenant_id"], json!("*"));
        assert_eq!(value["user_id"], json!("*"));
        assert_eq!(value["type"], json!("filter"));
    }

    #[test]
    fn rule_type_round_trips_under_its_wire_name() {
        let rule: TableAccessRule = serde_json::from_value(json!({
            "name": "deny interns",
            "table": {"table_name": "SALARIES"},
            "type": "block"
        }))
        .unwrap();
        assert_eq!(rule.rule_type, TableAccessRuleType::Block);
        assert_eq!(rule.org_id, "*");

        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["type"], json!("block"));
        assert!(value.get("rule_type").is_none());
    }
}
