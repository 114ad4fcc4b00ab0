//! Dashboard widgets

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tenantdash_schema::{FieldKind, FieldSpec, Schema, UnknownFields};

use crate::entity::{Deletable, Entity, Writable};
use crate::models::{Query, Visualization, QUERY_SCHEMA};

/// Wire schema of [`WidgetVisualization`]
pub static WIDGET_VISUALIZATION_SCHEMA: Schema = Schema {
    name: "WidgetVisualization",
    fields: &[
        FieldSpec::optional("description", FieldKind::String),
        FieldSpec::optional("name", FieldKind::String),
        FieldSpec::optional("created_at", FieldKind::DateTime),
        FieldSpec::optional("updated_at", FieldKind::DateTime),
        FieldSpec::optional("id", FieldKind::Integer),
        FieldSpec::optional("kind", FieldKind::String).wire("type"),
        FieldSpec::optional("options", FieldKind::Any),
        FieldSpec::optional("query", FieldKind::Nested(&QUERY_SCHEMA)),
    ],
};

/// Wire schema of [`Widget`]
pub static WIDGET_SCHEMA: Schema = Schema {
    name: "Widget",
    fields: &[
        FieldSpec::required("dashboard_id", FieldKind::Integer),
        FieldSpec::optional("visualization_id", FieldKind::Integer),
        FieldSpec::optional("visualization", FieldKind::Nested(&WIDGET_VISUALIZATION_SCHEMA)).load_only(),
        FieldSpec::optional("text", FieldKind::String),
        FieldSpec::optional("created_at", FieldKind::DateTime),
        FieldSpec::optional("updated_at", FieldKind::DateTime),
        FieldSpec::optional("options", FieldKind::Any),
        FieldSpec::optional("width", FieldKind::Integer),
        FieldSpec::optional("id", FieldKind::Integer),
    ],
};

/// A visualization as embedded in a widget, with its owning query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetVisualization {
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
    /// Renderer
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Renderer settings
    pub options: Option<Value>,
    /// Query this visualization belongs to
    pub query: Option<Query>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl WidgetVisualization {
    /// Find the visualization among `candidates` that renders the same way
    #[must_use]
    pub fn find_match<'a>(&self, candidates: &'a [Visualization]) -> Option<&'a Visualization> {
        candidates.iter().find(|candidate| {
            candidate.renders_like(self.name.as_deref(), self.kind.as_deref(), self.options.as_ref())
        })
    }
}

impl_structured!(WidgetVisualization, WIDGET_VISUALIZATION_SCHEMA);

/// A tile on a dashboard: a visualization or a block of text
///
/// The service has no read or list endpoints for widgets; they are only
/// seen embedded in a fully fetched [`crate::models::Dashboard`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Widget {
    /// Owning dashboard
    pub dashboard_id: i64,
    /// Rendered visualization; `None` for text widgets
    pub visualization_id: Option<i64>,
    /// Embedded visualization, never sent back
    pub visualization: Option<WidgetVisualization>,
    /// Markdown text of a text widget
    pub text: Option<String>,
    /// Creation time (RFC 3339)
    pub created_at: Option<String>,
    /// Last update time (RFC 3339)
    pub updated_at: Option<String>,
    /// Layout and parameter mapping
    pub options: Option<Value>,
    /// Width in grid units
    pub width: Option<i64>,
    /// Server-assigned id
    pub id: Option<i64>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl Widget {
    /// Check for a text-only widget
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.visualization.is_none() && self.visualization_id.is_none()
    }
}

impl_structured!(Widget, WIDGET_SCHEMA);

impl Entity for Widget {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Writable for Widget {}
impl Deletable for Widget {}
