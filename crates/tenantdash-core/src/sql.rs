//! Direct database access for bookkeeping the REST API does not offer

use std::fmt::Debug;

use async_trait::async_trait;

/// Archives queries left without a data source, then dashboards showing
/// archived queries
pub const ARCHIVE_STATEMENT: &str = "\
update queries set is_archived=TRUE where data_source_id is null and is_archived=FALSE;
update dashboards set is_archived=TRUE where id in (
    select distinct (dashboards.id)
    from dashboards
          join widgets w on dashboards.id = w.dashboard_id
          join visualizations v on w.visualization_id = v.id
          join queries q on q.id = v.query_id
    where dashboards.is_archived=FALSE and q.is_archived = true);
";

/// Statement replacing a group's permission literal
///
/// Single quotes in `permissions` are doubled.
#[must_use]
pub fn group_permissions_statement(group_id: i64, permissions: &str) -> String {
    let escaped = permissions.replace('\'', "''");
    format!("UPDATE groups SET permissions='{escaped}' where id={group_id}")
}

/// SQL collaborator failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum SqlError {
    /// Could not reach the database
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Statement was rejected
    #[error("statement failed: {0}")]
    Execution(String),
}

impl SqlError {
    /// Check if another attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Runs statements whose results are not needed
#[async_trait]
pub trait SqlExecutor: Send + Sync + Debug {
    /// Execute one or more `;`-separated statements
    async fn execute_only(&self, statement: &str) -> Result<(), SqlError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_statement() {
        assert_eq!(
            group_permissions_statement(7, "{view_query}"),
            "UPDATE groups SET permissions='{view_query}' where id=7"
        );
        assert_eq!(
            group_permissions_statement(7, "{it's}"),
            "UPDATE groups SET permissions='{it''s}' where id=7"
        );
    }

    #[test]
    fn archive_covers_queries_then_dashboards() {
        let statements: Vec<&str> = ARCHIVE_STATEMENT
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("update queries"));
        assert!(statements[1].starts_with("update dashboards"));
    }

    #[test]
    fn only_connection_failures_retry() {
        assert!(SqlError::Connection("refused".into()).is_retryable());
        assert!(!SqlError::Execution("syntax".into()).is_retryable());
    }
}
