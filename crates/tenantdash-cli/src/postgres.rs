//! SQL collaborator over the BI service's metadata database

use async_trait::async_trait;
use tenantdash_core::{SqlError, SqlExecutor};
use tokio_postgres::NoTls;
use tracing::{debug, warn};

/// Runs statements on a fresh connection each time
///
/// A run issues two statements, so connections are not pooled.
#[derive(Debug, Clone)]
pub(crate) struct PostgresSqlExecutor {
    url: String,
}

impl PostgresSqlExecutor {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl SqlExecutor for PostgresSqlExecutor {
    async fn execute_only(&self, statement: &str) -> Result<(), SqlError> {
        let (client, connection) = tokio_postgres::connect(&self.url, NoTls)
            .await
            .map_err(|e| SqlError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "database connection closed with error");
            }
        });

        debug!(statement, "executing statement");
        client
            .batch_execute(statement)
            .await
            .map_err(|e| SqlError::Execution(e.to_string()))
    }
}
