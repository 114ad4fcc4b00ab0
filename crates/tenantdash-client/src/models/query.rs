//! Queries and their value objects

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tenantdash_schema::{DefaultValue, FieldKind, FieldSpec, Schema, Structured, UnknownFields};

use crate::client::ApiClient;
use crate::entity::{Deletable, Entity, PaginatedListable, Readable, Writable};
use crate::error::EntityResult;
use crate::models::{User, USER_SCHEMA};

/// Wire schema of [`QuerySchedule`]
pub static QUERY_SCHEDULE_SCHEMA: Schema = Schema {
    name: "QuerySchedule",
    fields: &[
        FieldSpec::required("interval", FieldKind::Integer),
        FieldSpec::optional("time", FieldKind::String),
        FieldSpec::optional("day_of_week", FieldKind::String),
        FieldSpec::optional("until", FieldKind::String),
    ],
};

/// Wire schema of [`Visualization`]
pub static VISUALIZATION_SCHEMA: Schema = Schema {
    name: "Visualization",
    fields: &[
        FieldSpec::optional("description", FieldKind::String),
        FieldSpec::optional("name", FieldKind::String),
        FieldSpec::optional("created_at", FieldKind::DateTime),
        FieldSpec::optional("updated_at", FieldKind::DateTime),
        FieldSpec::optional("id", FieldKind::Integer),
        FieldSpec::optional("kind", FieldKind::String).wire("type"),
        FieldSpec::optional("options", FieldKind::Any),
    ],
};

const PARAMETER_SCALAR: &[FieldKind] = &[FieldKind::String, FieldKind::Integer];

/// Wire schema of [`QueryParameter`]
pub static QUERY_PARAMETER_SCHEMA: Schema = Schema {
    name: "QueryParameter",
    fields: &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("title", FieldKind::String),
        FieldSpec::required(
            "value",
            FieldKind::OneOf(&[
                FieldKind::String,
                FieldKind::Integer,
                FieldKind::List(&FieldKind::OneOf(PARAMETER_SCALAR)),
            ]),
        ),
        FieldSpec::required("kind", FieldKind::String).wire("type"),
        FieldSpec::required("is_global", FieldKind::Boolean).wire("global"),
        FieldSpec::optional("locals", FieldKind::Any),
        FieldSpec::optional("query_id", FieldKind::Integer).wire("queryId"),
        FieldSpec::optional("enum_options", FieldKind::String).wire("enumOptions"),
    ],
};

/// Wire schema of [`QueryOptions`]
pub static QUERY_OPTIONS_SCHEMA: Schema = Schema {
    name: "QueryOptions",
    fields: &[FieldSpec::optional(
        "parameters",
        FieldKind::NestedList(&QUERY_PARAMETER_SCHEMA),
    )],
};

/// Wire schema of [`Query`]
pub static QUERY_SCHEMA: Schema = Schema {
    name: "Query",
    fields: &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("data_source_id", FieldKind::Integer).nullable(),
        FieldSpec::with_default("query", FieldKind::String, DefaultValue::Str("")),
        FieldSpec::optional("is_archived", FieldKind::Boolean),
        FieldSpec::optional("updated_at", FieldKind::DateTime),
        FieldSpec::optional("is_favorite", FieldKind::Boolean),
        FieldSpec::optional("id", FieldKind::Integer),
        FieldSpec::optional("description", FieldKind::String),
        FieldSpec::optional("tags", FieldKind::List(&FieldKind::String)),
        FieldSpec::optional("version", FieldKind::Integer),
        FieldSpec::optional("query_hash", FieldKind::String),
        FieldSpec::optional("api_key", FieldKind::String),
        FieldSpec::optional("is_safe", FieldKind::Boolean),
        FieldSpec::optional("latest_query_data_id", FieldKind::Integer),
        FieldSpec::optional("schedule", FieldKind::Nested(&QUERY_SCHEDULE_SCHEMA)),
        FieldSpec::optional("user", FieldKind::Nested(&USER_SCHEMA)),
        FieldSpec::optional("is_draft", FieldKind::Boolean),
        FieldSpec::optional("can_edit", FieldKind::Boolean),
        FieldSpec::optional("created_at", FieldKind::DateTime),
        FieldSpec::optional("last_modified_by", FieldKind::Nested(&USER_SCHEMA)),
        FieldSpec::optional("visualizations", FieldKind::NestedList(&VISUALIZATION_SCHEMA)),
        FieldSpec::optional("options", FieldKind::Nested(&QUERY_OPTIONS_SCHEMA)),
    ],
};

/// Refresh schedule of a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySchedule {
    /// Seconds between runs
    pub interval: i64,
    /// Time of day
    pub time: Option<String>,
    /// Day of week
    pub day_of_week: Option<String>,
    /// Last run date
    pub until: Option<String>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl_structured!(QuerySchedule, QUERY_SCHEDULE_SCHEMA);

/// A chart or table rendered from a query's result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visualization {
    /// Free text description
    pub description: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Creation time (RFC 3339)
    pub created_at: Option<String>,
    /// Last update time (RFC 3339)
    pub updated_at: Option<String>,
    /// Server-assigned id
    pub id: Option<i64>,
    /// Renderer, e.g. `CHART` or `TABLE`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Renderer settings
    pub options: Option<Value>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl Visualization {
    /// Same name, renderer and settings
    ///
    /// Ids and timestamps are ignored.
    #[must_use]
    pub fn renders_like(&self, name: Option<&str>, kind: Option<&str>, options: Option<&Value>) -> bool {
        self.name.as_deref() == name && self.kind.as_deref() == kind && self.options.as_ref() == options
    }
}

impl_structured!(Visualization, VISUALIZATION_SCHEMA);

/// A query text parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParameter {
    /// Placeholder name
    pub name: String,
    /// Display title
    pub title: String,
    /// Current value: text, number, or list of either
    pub value: Value,
    /// Parameter type
    #[serde(rename = "type")]
    pub kind: String,
    /// Shared across dashboard widgets
    #[serde(rename = "global")]
    pub is_global: bool,
    /// Local overrides
    pub locals: Option<Value>,
    /// Query backing a dropdown
    #[serde(rename = "queryId")]
    pub query_id: Option<i64>,
    /// Dropdown options
    #[serde(rename = "enumOptions")]
    pub enum_options: Option<String>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl_structured!(QueryParameter, QUERY_PARAMETER_SCHEMA);

/// Query options blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Declared parameters
    pub parameters: Option<Vec<QueryParameter>>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl_structured!(QueryOptions, QUERY_OPTIONS_SCHEMA);

/// A saved SQL query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Display name
    pub name: String,
    /// Backing data source; null once orphaned
    pub data_source_id: Option<i64>,
    /// SQL text
    pub query: String,
    /// Archived flag
    pub is_archived: Option<bool>,
    /// Last update time (RFC 3339)
    pub updated_at: Option<String>,
    /// Favourite of the caller
    pub is_favorite: Option<bool>,
    /// Server-assigned id
    pub id: Option<i64>,
    /// Free text description
    pub description: Option<String>,
    /// Tags
    pub tags: Option<Vec<String>>,
    /// Edit counter
    pub version: Option<i64>,
    /// Hash of the SQL text
    pub query_hash: Option<String>,
    /// Query API key
    pub api_key: Option<String>,
    /// Safe to run with parameters
    pub is_safe: Option<bool>,
    /// Latest cached result
    pub latest_query_data_id: Option<i64>,
    /// Refresh schedule
    pub schedule: Option<QuerySchedule>,
    /// Owner
    pub user: Option<User>,
    /// Unpublished flag
    pub is_draft: Option<bool>,
    /// Caller may edit
    pub can_edit: Option<bool>,
    /// Creation time (RFC 3339)
    pub created_at: Option<String>,
    /// Last editor
    pub last_modified_by: Option<User>,
    /// Renderers of this query's result
    pub visualizations: Option<Vec<Visualization>>,
    /// Parameters and other options
    pub options: Option<QueryOptions>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl Query {
    /// Create an unsaved query
    pub fn new(name: impl Into<String>, data_source_id: i64, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_source_id: Some(data_source_id),
            query: query.into(),
            ..Self::default()
        }
    }

    /// Visualizations of this query, empty when not loaded
    #[must_use]
    pub fn visualizations(&self) -> &[Visualization] {
        self.visualizations.as_deref().unwrap_or_default()
    }

    /// Ask the server to copy this query and all of its visualizations
    ///
    /// Returns the new query; `self` is unchanged.
    pub async fn fork(&self, client: &ApiClient) -> EntityResult<Query> {
        let endpoint = format!("{}/fork", self.object_endpoint("fork")?);
        let body = client.post_json(&endpoint, None).await?;
        Ok(Query::load(&body)?)
    }
}

impl_structured!(Query, QUERY_SCHEMA);

impl Entity for Query {
    const RESOURCE: Option<&'static str> = Some("queries");

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Readable for Query {
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }
}

impl PaginatedListable for Query {}
impl Writable for Query {}
impl Deletable for Query {}
