//! Error types for provisioning
//!
//! Precondition failures abort the run synchronously. Remote and SQL
//! failures are wrapped as they come; nothing is rolled back.

use tenantdash_client::EntityError;

use crate::sql::SqlError;

/// Provisioning failure
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Neither a template slug nor a template owner was given
    #[error("template slug and template owner are both missing; at least one is required")]
    MissingTemplateSelector,

    /// No dashboard matched the template selector
    #[error("template dashboard not found: {0}")]
    TemplateNotFound(String),

    /// Owner could not be read from the template name
    #[error("cannot derive template owner from dashboard name '{0}'")]
    TemplateNameUnparseable(String),

    /// Forked query lacks a copy of the widget's visualization
    #[error("query {query_id} has no visualization matching '{name}' ({kind})")]
    NoMatchingVisualization {
        /// Forked query id
        query_id: i64,
        /// Visualization name
        name: String,
        /// Visualization type
        kind: String,
    },

    /// Widget references a visualization that is missing or carries no query
    #[error("widget {widget_id:?} references a visualization that cannot be resolved to a query")]
    DanglingVisualization {
        /// Template widget id
        widget_id: Option<i64>,
    },

    /// Dashboard cloning was started before a data source was provisioned
    #[error("no tenant data source; provision access before cloning")]
    MissingDataSource,

    /// User roster could not be parsed
    #[error("invalid user roster: {0}")]
    InvalidRoster(String),

    /// Remote operation failed
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// SQL collaborator failed
    #[error(transparent)]
    Sql(#[from] SqlError),
}

impl ProvisionError {
    /// Check if re-running the same step may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Entity(EntityError::Api(e)) => e.is_retryable(),
            Self::Sql(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantdash_client::{ApiError, HttpMethod};

    #[test]
    fn retry_classification() {
        let server = ProvisionError::from(EntityError::Api(ApiError::Status {
            status: 502,
            method: HttpMethod::Get,
            endpoint: "dashboards".into(),
            body: String::new(),
        }));
        assert!(server.is_retryable());

        assert!(!ProvisionError::MissingTemplateSelector.is_retryable());
        assert!(ProvisionError::from(SqlError::Connection("down".into())).is_retryable());
    }

    #[test]
    fn messages() {
        let err = ProvisionError::NoMatchingVisualization {
            query_id: 12,
            name: "Chart".into(),
            kind: "CHART".into(),
        };
        assert_eq!(err.to_string(), "query 12 has no visualization matching 'Chart' (CHART)");
    }
}
