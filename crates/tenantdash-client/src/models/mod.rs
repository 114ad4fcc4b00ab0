//! BI service entity models
//!
//! Each model pairs a serde struct with a `static` [`Schema`] describing
//! its wire fields. Timestamps are kept as RFC 3339 strings so dumps
//! reproduce the server's text exactly.
//!
//! [`Schema`]: tenantdash_schema::Schema

/// Implement `Structured` for a model with an `unknown_fields` field
macro_rules! impl_structured {
    ($ty:ty, $schema:path) => {
        impl tenantdash_schema::Structured for $ty {
            fn schema() -> &'static tenantdash_schema::Schema {
                &$schema
            }

            fn unknown_fields(&self) -> &tenantdash_schema::UnknownFields {
                &self.unknown_fields
            }

            fn unknown_fields_mut(&mut self) -> &mut tenantdash_schema::UnknownFields {
                &mut self.unknown_fields
            }
        }
    };
}

mod dashboard;
mod data_source;
mod group;
mod query;
mod user;
mod widget;

pub use dashboard::{Dashboard, DASHBOARD_SCHEMA};
pub use data_source::{DataSource, DataSourceOptions, DATA_SOURCE_OPTIONS_SCHEMA, DATA_SOURCE_SCHEMA};
pub use group::{Group, GROUP_SCHEMA};
pub use query::{
    Query, QueryOptions, QueryParameter, QuerySchedule, Visualization,
    QUERY_OPTIONS_SCHEMA, QUERY_PARAMETER_SCHEMA, QUERY_SCHEDULE_SCHEMA, QUERY_SCHEMA,
    VISUALIZATION_SCHEMA,
};
pub use user::{GroupRef, GroupSummary, User, USER_SCHEMA};
pub use widget::{Widget, WidgetVisualization, WIDGET_SCHEMA, WIDGET_VISUALIZATION_SCHEMA};
