//! Client configuration

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the BI service
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Service root, without the `/api` suffix
    pub base_url: String,
    /// API key sent as `Authorization: Key <api_key>`
    pub api_key: String,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retry behaviour
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Create config with default timeout and retry
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Set per-attempt timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
