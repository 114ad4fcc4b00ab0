//! Data sources

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tenantdash_schema::{DefaultValue, FieldKind, FieldSpec, Schema, UnknownFields};

use crate::entity::{Deletable, Entity, Listable, Readable, Writable};

/// Default data source type
pub const DEFAULT_DATA_SOURCE_TYPE: &str = "redshift";

/// Wire schema of [`DataSourceOptions`]
pub static DATA_SOURCE_OPTIONS_SCHEMA: Schema = Schema {
    name: "DataSourceOptions",
    fields: &[
        FieldSpec::optional("host", FieldKind::String),
        FieldSpec::optional("port", FieldKind::Integer),
        FieldSpec::optional("user", FieldKind::String),
        FieldSpec::optional("password", FieldKind::String),
        FieldSpec::optional("dbname", FieldKind::String),
    ],
};

/// Wire schema of [`DataSource`]
pub static DATA_SOURCE_SCHEMA: Schema = Schema {
    name: "DataSource",
    fields: &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::optional("options", FieldKind::Nested(&DATA_SOURCE_OPTIONS_SCHEMA)),
        FieldSpec::optional("id", FieldKind::Integer),
        FieldSpec::with_default(
            "kind",
            FieldKind::String,
            DefaultValue::Str(DEFAULT_DATA_SOURCE_TYPE),
        )
        .wire("type"),
        FieldSpec::optional("scheduled_queue_name", FieldKind::String),
        FieldSpec::optional("paused", FieldKind::Integer),
        FieldSpec::optional("pause_reason", FieldKind::String),
        FieldSpec::optional("queue_name", FieldKind::String),
        FieldSpec::optional("syntax", FieldKind::String),
        FieldSpec::optional("groups", FieldKind::Map(&FieldKind::Boolean)),
        FieldSpec::optional("view_only", FieldKind::Boolean),
    ],
};

/// Connection settings of a warehouse data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceOptions {
    /// Warehouse host
    pub host: Option<String>,
    /// Warehouse port
    pub port: Option<i64>,
    /// Login user
    pub user: Option<String>,
    /// Login password
    pub password: Option<String>,
    /// Database name
    pub dbname: Option<String>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl DataSourceOptions {
    /// Create options for a warehouse connection
    pub fn new(
        host: impl Into<String>,
        port: i64,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            user: Some(user.into()),
            password: Some(password.into()),
            dbname: Some(dbname.into()),
            unknown_fields: UnknownFields::new(),
        }
    }
}

impl_structured!(DataSourceOptions, DATA_SOURCE_OPTIONS_SCHEMA);

/// A connection to a warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSource {
    /// Display name
    pub name: String,
    /// Connection settings
    pub options: Option<DataSourceOptions>,
    /// Server-assigned id
    pub id: Option<i64>,
    /// Backend type, e.g. `redshift`
    #[serde(rename = "type")]
    pub kind: String,
    /// Scheduled queue
    pub scheduled_queue_name: Option<String>,
    /// Non-zero when paused
    pub paused: Option<i64>,
    /// Why it is paused
    pub pause_reason: Option<String>,
    /// Ad-hoc queue
    pub queue_name: Option<String>,
    /// Query syntax
    pub syntax: Option<String>,
    /// Group id to view-only flag
    pub groups: Option<BTreeMap<String, bool>>,
    /// Caller's access is view-only
    pub view_only: Option<bool>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl Default for DataSource {
    fn default() -> Self {
        Self {
            name: String::new(),
            options: None,
            id: None,
            kind: DEFAULT_DATA_SOURCE_TYPE.to_string(),
            scheduled_queue_name: None,
            paused: None,
            pause_reason: None,
            queue_name: None,
            syntax: None,
            groups: None,
            view_only: None,
            unknown_fields: UnknownFields::new(),
        }
    }
}

impl DataSource {
    /// Create an unsaved data source
    pub fn new(name: impl Into<String>, options: DataSourceOptions) -> Self {
        Self {
            name: name.into(),
            options: Some(options),
            ..Self::default()
        }
    }
}

impl_structured!(DataSource, DATA_SOURCE_SCHEMA);

impl Entity for DataSource {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Readable for DataSource {
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }
}

impl Listable for DataSource {}
impl Writable for DataSource {}
impl Deletable for DataSource {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tenantdash_schema::Structured;

    #[test]
    fn endpoint_from_type_name() {
        assert_eq!(DataSource::base_endpoint(), "data_sources");
        assert_eq!(DataSource::object_endpoint_by_id(4), "data_sources/4");
    }

    #[test]
    fn type_defaults_to_redshift() {
        let source = DataSource::load(&json!({"name": "Widgets Co (99)"})).unwrap();
        assert_eq!(source.kind, "redshift");

        let dumped = DataSource::new("x", DataSourceOptions::default()).dump().unwrap();
        assert_eq!(dumped["type"], json!("redshift"));
    }

    #[test]
    fn server_payload_round_trips() {
        let raw = json!({
            "id": 3,
            "name": "Acme (42)",
            "type": "redshift",
            "options": {"host": "h", "port": 5439, "user": "u", "password": "p", "dbname": "d", "sslmode": "require"},
            "scheduled_queue_name": "scheduled_queries",
            "paused": 0,
            "pause_reason": null,
            "queue_name": "queries",
            "syntax": "sql",
            "groups": {"2": true},
            "view_only": false,
            "supports_auto_limit": true,
        });
        let source = DataSource::load(&raw).unwrap();

        assert_eq!(source.unknown_fields().len(), 2);
        assert_eq!(source.dump().unwrap(), raw);
    }

    #[test]
    fn unsaved_has_no_object_endpoint() {
        let source = DataSource::new("x", DataSourceOptions::default());
        assert!(source.object_endpoint("delete").is_err());
    }
}
