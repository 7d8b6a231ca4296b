//! # Database Connections and Catalogs
//!
//! Connection management (list, modify, activate) plus catalog metadata
//! retrieval. Activating a connection is a purely local operation: it sets
//! the session scope that every scope-requiring endpoint injects.
//!
//! Identifier handling follows the service's quoting rules: a part that
//! matches `[A-Z_][A-Z_0-9$]*` may appear bare, anything else is wrapped in
//! double quotes, and parts are joined with dots.
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use url::Url;

const GET_DB_ENDPOINT: &str = "get-connections";
const MODIFY_DB_ENDPOINT: &str = "update-db-connect-info";
const GET_CATALOG_ENDPOINT: &str = "get-table-definitions";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    #[error("Quotes not closed in name: '{0}'")]
    UnclosedQuotes(String),
    #[error("Invalid schema name: '{0}'")]
    Schema(String),
    #[error("Invalid table name: '{0}'")]
    Table(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ScopeUrlError {
    #[error("Invalid scope url: '{0}'")]
    Parse(#[from] url::ParseError),
    #[error("Unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("Missing '{0}' in scope url")]
    MissingField(&'static str),
}

/// A schema identifier, optionally qualified by its database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaName {
    pub schema_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl SchemaName {
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            database_name: None,
            extra: ExtraFields::default(),
        }
    }

    /// Parses `[db.]schema`, honoring double quotes.
    pub fn from_quoted_str(quoted_str: &str) -> Result<Self, InvalidNameError> {
        let parts = quoted_str_to_parts(quoted_str)?;
        if parts.len() > 2 || parts.iter().any(String::is_empty) {
            return Err(InvalidNameError::Schema(quoted_str.to_string()));
        }

        let mut parts = parts.into_iter().rev();
        let schema_name = parts.next().unwrap_or_default();
        Ok(Self {
            schema_name,
            database_name: parts.next(),
            extra: ExtraFields::default(),
        })
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = [self.database_name.as_deref(), Some(&*self.schema_name)]
            .into_iter()
            .flatten()
            .map(quote_part_if_needed)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)
    }
}

impl PartialEq for SchemaName {
    fn eq(&self, other: &Self) -> bool {
        (&self.schema_name, &self.database_name) == (&other.schema_name, &other.database_name)
    }
}

impl Eq for SchemaName {}

impl Hash for SchemaName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema_name.hash(state);
        self.database_name.hash(state);
    }
}

impl StrictFields for SchemaName {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// A table identifier, optionally qualified by schema and database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableName {
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl TableName {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema_name: None,
            database_name: None,
            extra: ExtraFields::default(),
        }
    }

    /// Parses `[db.][schema.]table`, honoring double quotes.
    pub fn from_quoted_str(quoted_str: &str) -> Result<Self, InvalidNameError> {
        let parts = quoted_str_to_parts(quoted_str)?;
        if parts.len() > 3 || parts.iter().any(String::is_empty) {
            return Err(InvalidNameError::Table(quoted_str.to_string()));
        }

        let mut parts = parts.into_iter().rev();
        let table_name = parts.next().unwrap_or_default();
        Ok(Self {
            table_name,
            schema_name: parts.next(),
            database_name: parts.next(),
            extra: ExtraFields::default(),
        })
    }

    pub fn extract_schema_name(&self) -> SchemaName {
        SchemaName {
            schema_name: self.schema_name.clone().unwrap_or_default(),
            database_name: self.database_name.clone(),
            extra: ExtraFields::default(),
        }
    }

    pub fn starts_with_schema(&self, prefix: &SchemaName) -> bool {
        self.database_name == prefix.database_name
            && self.schema_name.as_deref() == Some(&*prefix.schema_name)
    }

    pub fn compare_ignore_case(&self, other: &TableName) -> bool {
        fn part_matches(a: &Option<String>, b: &Option<String>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
        }

        part_matches(&self.database_name, &other.database_name)
            && part_matches(&self.schema_name, &other.schema_name)
            && self.table_name.eq_ignore_ascii_case(&other.table_name)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = [
            self.database_name.as_deref(),
            self.schema_name.as_deref(),
            Some(&*self.table_name),
        ]
        .into_iter()
        .flatten()
        .map(quote_part_if_needed)
        .collect::<Vec<_>>()
        .join(".");
        f.write_str(&joined)
    }
}

impl PartialEq for TableName {
    fn eq(&self, other: &Self) -> bool {
        (&self.table_name, &self.schema_name, &self.database_name)
            == (&other.table_name, &other.schema_name, &other.database_name)
    }
}

impl Eq for TableName {}

impl Hash for TableName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table_name.hash(state);
        self.schema_name.hash(state);
        self.database_name.hash(state);
    }
}

impl StrictFields for TableName {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

/// Distinct values observed in a column, with their occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSampleValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<HashMap<String, i64>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ColumnSampleValues {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_values: Option<ColumnSampleValues>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ColumnDefinition {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.sample_values.check_extra_fields()
    }
}

/// A foreign-key style relation between two tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_table: Option<TableName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_cols: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_table: Option<TableName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_cols: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for TableReference {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.src_table.check_extra_fields()?;
        self.ref_table.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableNameToDescription {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for TableNameToDescription {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_questions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_tables: Option<Vec<TableNameToDescription>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for SchemaDescription {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.common_tables.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: TableName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_altered_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refs: Option<Vec<TableReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for TableDefinition {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.name.check_extra_fields()?;
        self.columns.check_extra_fields()?;
        self.refs.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: SchemaName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<SchemaDescription>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for SchemaDefinition {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.name.check_extra_fields()?;
        self.tables.check_extra_fields()?;
        self.description.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Vec<SchemaDefinition>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for CatalogDefinition {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.schemas.check_extra_fields()
    }
}

/// A stored database connection. The `key` doubles as the session scope
/// when the connection is activated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DBConnection {
    pub key: String,
    pub db_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl DBConnection {
    /// The canonical scope URL for snowflake connections, `None` for other
    /// database types.
    pub fn scope_key_url(&self) -> Option<String> {
        if self.db_type != "snowflake" {
            return None;
        }
        Some(format!(
            "snowflake://{}@{}/{}?role={}&warehouse={}",
            self.username.as_deref().unwrap_or_default(),
            self.account_name.as_deref().unwrap_or_default(),
            self.database.as_deref().unwrap_or_default(),
            self.role.as_deref().unwrap_or_default(),
            self.warehouse.as_deref().unwrap_or_default(),
        ))
    }

    /// Reconstructs a connection from a scope URL produced by
    /// [`Self::scope_key_url`].
    pub fn from_scope_url(scope_key_url: &str) -> Result<Self, ScopeUrlError> {
        let parsed = Url::parse(scope_key_url)?;
        if parsed.scheme() != "snowflake" {
            return Err(ScopeUrlError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let account_name = parsed
            .host_str()
            .ok_or(ScopeUrlError::MissingField("account_name"))?;
        let database = parsed.path().trim_start_matches('/');

        let mut role = None;
        let mut warehouse = None;
        for (name, value) in parsed.query_pairs() {
            match name.as_ref() {
                "role" => role = Some(value.into_owned()),
                "warehouse" => warehouse = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            key: account_name.to_string(),
            db_type: "snowflake".to_string(),
            username: Some(parsed.username().to_string()),
            account_name: Some(account_name.to_string()),
            database: Some(database.to_string()),
            role: Some(role.ok_or(ScopeUrlError::MissingField("role"))?),
            warehouse: Some(warehouse.ok_or(ScopeUrlError::MissingField("warehouse"))?),
            ..Self::default()
        })
    }

    /// For snowflake, the org id combines db type and account name.
    pub fn org_id(&self) -> Option<String> {
        if self.db_type != "snowflake" {
            return None;
        }
        Some(format!(
            "{}_{}",
            self.db_type,
            self.account_name.as_deref().unwrap_or_default()
        ))
    }

    /// For snowflake, the scope name combines database and role.
    pub fn scope_name(&self) -> Option<String> {
        if self.db_type != "snowflake" {
            return None;
        }
        Some(format!(
            "{}_{}",
            self.database.as_deref().unwrap_or_default(),
            self.role.as_deref().unwrap_or_default()
        ))
    }
}

impl StrictFields for DBConnection {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifyDBConnectionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<Vec<DBConnection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_before_save: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_db_connection_key: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ModifyDBConnectionRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.updated.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifyDBConnectionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectors: Option<Vec<DBConnection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_db_connection_key: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ModifyDBConnectionResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.connectors.check_extra_fields()
    }
}

/// Narrows an operation to matching database/schema/table names; `*`
/// matches everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self {
            db_name: Some("*".to_string()),
            schema_name: Some("*".to_string()),
            table_name: Some("*".to_string()),
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for SearchContext {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetCatalogRequest {
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetCatalogRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetDBConnectionRequest {
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetDBConnectionRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetDBConnectionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectors: Option<Vec<DBConnection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_db_connection_key: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetDBConnectionResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.connectors.check_extra_fields()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetCatalogResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalogs: Option<Vec<CatalogDefinition>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for GetCatalogResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.catalogs.check_extra_fields()
    }
}

/// Blocking database operations.
#[derive(Debug, Clone)]
pub struct Database {
    http: Arc<WaiiHttpClient>,
}

impl Database {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    /// Adds, updates or removes stored connections. Works without an active
    /// scope so connections can be managed before any activation.
    pub fn modify_connections(
        &self,
        params: &ModifyDBConnectionRequest,
    ) -> Result<ModifyDBConnectionResponse, ApiError> {
        self.http.common_fetch_no_scope(MODIFY_DB_ENDPOINT, params)
    }

    pub fn get_connections(&self) -> Result<GetDBConnectionResponse, ApiError> {
        self.http
            .common_fetch_no_scope(GET_DB_ENDPOINT, &GetDBConnectionRequest::default())
    }

    /// Makes `key` the active connection for every subsequent call on this
    /// client. Local only, no request is sent.
    pub fn activate_connection(&self, key: impl Into<String>) {
        self.http.set_scope(key);
    }

    pub fn get_catalogs(&self) -> Result<GetCatalogResponse, ApiError> {
        self.http
            .common_fetch(GET_CATALOG_ENDPOINT, &GetCatalogRequest::default())
    }
}

/// [`Database`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncDatabase {
    inner: AsyncFacade<Database>,
}

impl AsyncDatabase {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(Database::new(http)),
        }
    }

    pub async fn modify_connections(
        &self,
        params: ModifyDBConnectionRequest,
    ) -> Result<ModifyDBConnectionResponse, ApiError> {
        self.inner.run(move |db| db.modify_connections(&params)).await
    }

    pub async fn get_connections(&self) -> Result<GetDBConnectionResponse, ApiError> {
        self.inner.run(Database::get_connections).await
    }

    pub async fn activate_connection(&self, key: String) {
        self.inner.run(move |db| db.activate_connection(key)).await
    }

    pub async fn get_catalogs(&self) -> Result<GetCatalogResponse, ApiError> {
        self.inner.run(Database::get_catalogs).await
    }
}

fn no_quote_needed(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '$')
}

fn quote_part_if_needed(part: &str) -> String {
    if no_quote_needed(part) {
        part.to_string()
    } else {
        format!("\"{part}\"")
    }
}

/// Splits a dotted identifier into parts. Double quotes group a part (the
/// quote characters themselves are dropped), dots outside quotes separate
/// parts, and surrounding whitespace is trimmed from each part.
fn quoted_str_to_parts(quoted_str: &str) -> Result<Vec<String>, InvalidNameError> {
    let mut parts = Vec::new();
    let mut part = String::new();
    let mut quoted = false;

    for ch in quoted_str.chars() {
        match ch {
            '"' => quoted = !quoted,
            '.' if !quoted => {
                parts.push(part.trim().to_string());
                part.clear();
            }
            _ => part.push(ch),
        }
    }

    if quoted {
        return Err(InvalidNameError::UnclosedQuotes(quoted_str.to_string()));
    }

    parts.push(part.trim().to_string());
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_table_name_parses() {
        let name = TableName::from_quoted_str("MY_TABLE").unwrap();
        assert_eq!(name.table_name, "MY_TABLE");
        assert_eq!(name.schema_name, None);
        assert_eq!(name.database_name, None);
    }

    #[test]
    fn parts_right_align_into_db_schema_table() {
        let name = TableName::from_quoted_str("INFORMATION_SCHEMA.TABLES").unwrap();
        assert_eq!(name.table_name, "TABLES");
        assert_eq!(name.schema_name.as_deref(), Some("INFORMATION_SCHEMA"));
        assert_eq!(name.database_name, None);

        let name = TableName::from_quoted_str("DB.SCH.TBL").unwrap();
        assert_eq!(name.database_name.as_deref(), Some("DB"));
        assert_eq!(name.schema_name.as_deref(), Some("SCH"));
        assert_eq!(name.table_name, "TBL");
    }

    #[test]
    fn quoted_parts_keep_dots_and_case() {
        let name = TableName::from_quoted_str("\"my db\".\"weird.schema\".ORDERS").unwrap();
        assert_eq!(name.database_name.as_deref(), Some("my db"));
        assert_eq!(name.schema_name.as_deref(), Some("weird.schema"));
        assert_eq!(name.table_name, "ORDERS");
    }

    #[test]
    fn too_many_or_empty_parts_are_invalid() {
        assert!(matches!(
            TableName::from_quoted_str("A.B.C.D"),
            Err(InvalidNameError::Table(s)) if s == "A.B.C.D"
        ));
        assert!(matches!(
            TableName::from_quoted_str("A..C"),
            Err(InvalidNameError::Table(_))
        ));
        assert!(matches!(
            SchemaName::from_quoted_str("A.B.C"),
            Err(InvalidNameError::Schema(_))
        ));
    }

    #[test]
    fn unclosed_quotes_are_invalid() {
        assert!(matches!(
            TableName::from_quoted_str("\"open.TBL"),
            Err(InvalidNameError::UnclosedQuotes(_))
        ));
    }

    #[test]
    fn display_quotes_only_when_needed() {
        let mut name = TableName::new("orders");
        name.schema_name = Some("PUBLIC".to_string());
        assert_eq!(name.to_string(), "PUBLIC.\"orders\"");

        let name = TableName::from_quoted_str("DB1.PUBLIC.T$1").unwrap();
        assert_eq!(name.to_string(), "DB1.PUBLIC.T$1");
    }

    #[test]
    fn schema_prefix_and_extraction() {
        let table = TableName::from_quoted_str("DB.SALES.ORDERS").unwrap();
        let schema = table.extract_schema_name();
        assert_eq!(schema.schema_name, "SALES");
        assert_eq!(schema.database_name.as_deref(), Some("DB"));
        assert!(table.starts_with_schema(&schema));

        let other = SchemaName::from_quoted_str("DB.MARKETING").unwrap();
        assert!(!table.starts_with_schema(&other));
    }

    #[test]
    fn comparison_ignores_case_but_not_missing_parts() {
        let a = TableName::from_quoted_str("Sales.Orders").unwrap();
        let b = TableName::from_quoted_str("SALES.ORDERS").unwrap();
        assert!(a.compare_ignore_case(&b));

        let unqualified = TableName::new("ORDERS");
        assert!(!a.compare_ignore_case(&unqualified));
    }

    #[test]
    fn scope_url_round_trips() {
        let conn = DBConnection::from_scope_url(
            "snowflake://deputy@acme-account/SALES_DB?role=ANALYST&warehouse=COMPUTE_WH",
        )
        .unwrap();
        assert_eq!(conn.key, "acme-account");
        assert_eq!(conn.db_type, "snowflake");
        assert_eq!(conn.username.as_deref(), Some("deputy"));
        assert_eq!(conn.database.as_deref(), Some("SALES_DB"));
        assert_eq!(conn.role.as_deref(), Some("ANALYST"));
        assert_eq!(conn.warehouse.as_deref(), Some("COMPUTE_WH"));

        assert_eq!(
            conn.scope_key_url().unwrap(),
            "snowflake://deputy@acme-account/SALES_DB?role=ANALYST&warehouse=COMPUTE_WH"
        );
        assert_eq!(conn.org_id().unwrap(), "snowflake_acme-account");
        assert_eq!(conn.scope_name().unwrap(), "SALES_DB_ANALYST");
    }

    #[test]
    fn non_snowflake_connections_have_no_scope_url() {
        let conn = DBConnection {
            key: "postgresql://localhost/app".to_string(),
            db_type: "postgresql".to_string(),
            ..DBConnection::default()
        };
        assert_eq!(conn.scope_key_url(), None);
        assert_eq!(conn.org_id(), None);

        assert!(matches!(
            DBConnection::from_scope_url("postgresql://u@h/db"),
            Err(ScopeUrlError::UnsupportedScheme(s)) if s == "postgresql"
        ));
    }
}
