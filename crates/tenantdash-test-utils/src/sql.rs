use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tenantdash_core::{SqlError, SqlExecutor};

/// SQL collaborator that records statements instead of running them
#[derive(Debug, Clone, Default)]
pub struct RecordingSqlExecutor {
    statements: Arc<Mutex<Vec<String>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl RecordingSqlExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later statement fail
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock() = Some(message.to_string());
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }
}

#[async_trait]
impl SqlExecutor for RecordingSqlExecutor {
    async fn execute_only(&self, statement: &str) -> Result<(), SqlError> {
        self.statements.lock().push(statement.to_string());
        match self.fail_with.lock().as_ref() {
            Some(message) => Err(SqlError::Execution(message.clone())),
            None => Ok(()),
        }
    }
}
