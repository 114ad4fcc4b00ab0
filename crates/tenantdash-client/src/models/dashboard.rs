//! Dashboards

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tenantdash_schema::{DefaultValue, FieldKind, FieldSpec, Schema, UnknownFields};

use crate::entity::{Deletable, Entity, PaginatedListable, Readable, Writable};
use crate::error::{EntityError, EntityResult};
use crate::models::{User, Widget, USER_SCHEMA, WIDGET_SCHEMA};

/// Wire schema of [`Dashboard`]
pub static DASHBOARD_SCHEMA: Schema = Schema {
    name: "Dashboard",
    fields: &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::optional("tags", FieldKind::List(&FieldKind::String)),
        FieldSpec::optional("is_archived", FieldKind::Boolean),
        FieldSpec::optional("created_at", FieldKind::DateTime),
        FieldSpec::optional("updated_at", FieldKind::DateTime),
        FieldSpec::optional("is_favorite", FieldKind::Boolean),
        FieldSpec::optional("user", FieldKind::Nested(&USER_SCHEMA)),
        FieldSpec::optional("layout", FieldKind::Any).load_only(),
        FieldSpec::with_default("is_draft", FieldKind::Boolean, DefaultValue::Bool(false)),
        FieldSpec::optional("id", FieldKind::Integer),
        FieldSpec::with_default("can_edit", FieldKind::Boolean, DefaultValue::Bool(true)),
        FieldSpec::optional("user_id", FieldKind::Integer),
        FieldSpec::optional("slug", FieldKind::String),
        FieldSpec::optional("version", FieldKind::Integer),
        FieldSpec::with_default(
            "dashboard_filters_enabled",
            FieldKind::Boolean,
            DefaultValue::Bool(true),
        ),
        FieldSpec::optional("widgets", FieldKind::NestedList(&WIDGET_SCHEMA)).load_only(),
    ],
};

/// A dashboard, addressed by slug for reads and deletes
///
/// `widgets` is only filled by [`Readable::get`] and [`Readable::fetch`];
/// listings leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dashboard {
    /// Display name
    pub name: String,
    /// Tags
    pub tags: Option<Vec<String>>,
    /// Archived flag
    pub is_archived: Option<bool>,
    /// Creation time (RFC 3339)
    pub created_at: Option<String>,
    /// Last update time (RFC 3339)
    pub updated_at: Option<String>,
    /// Favourite of the caller
    pub is_favorite: Option<bool>,
    /// Owner
    pub user: Option<User>,
    /// Legacy layout, never sent back
    pub layout: Option<Value>,
    /// Unpublished flag
    pub is_draft: bool,
    /// Server-assigned id
    pub id: Option<i64>,
    /// Caller may edit
    pub can_edit: bool,
    /// Owner id
    pub user_id: Option<i64>,
    /// URL slug
    pub slug: Option<String>,
    /// Edit counter
    pub version: Option<i64>,
    /// Dashboard-level filters shown
    pub dashboard_filters_enabled: bool,
    /// Widgets, never sent back
    pub widgets: Option<Vec<Widget>>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            name: String::new(),
            tags: None,
            is_archived: None,
            created_at: None,
            updated_at: None,
            is_favorite: None,
            user: None,
            layout: None,
            is_draft: false,
            id: None,
            can_edit: true,
            user_id: None,
            slug: None,
            version: None,
            dashboard_filters_enabled: true,
            widgets: None,
            unknown_fields: UnknownFields::new(),
        }
    }
}

impl Dashboard {
    /// Create an unsaved dashboard
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Widgets of a fully fetched dashboard
    #[must_use]
    pub fn widgets(&self) -> &[Widget] {
        self.widgets.as_deref().unwrap_or_default()
    }
}

impl_structured!(Dashboard, DASHBOARD_SCHEMA);

impl Entity for Dashboard {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Readable for Dashboard {
    type Key = String;

    fn key(&self) -> Option<String> {
        self.slug.clone()
    }
}

impl PaginatedListable for Dashboard {}
impl Writable for Dashboard {}

impl Deletable for Dashboard {
    fn delete_endpoint(&self) -> EntityResult<String> {
        self.slug
            .as_deref()
            .map(|slug| format!("{}/{slug}", Self::base_endpoint()))
            .ok_or(EntityError::Unsaved {
                entity: "Dashboard",
                operation: "delete",
            })
    }
}
