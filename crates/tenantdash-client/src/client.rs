//! Authenticated API client with bounded retry

use std::sync::Arc;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::retry::RetryPolicy;
use crate::transport::{ApiRequest, HttpBackend, HttpMethod, ReqwestBackend};

/// Handle used by every entity operation
///
/// Cheap to clone; clones share the backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    backend: Arc<dyn HttpBackend>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create client over HTTP
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let backend = ReqwestBackend::new(config)?;
        Ok(Self {
            backend: Arc::new(backend),
            retry: config.retry.clone(),
        })
    }

    /// Create client over any backend
    #[must_use]
    pub fn with_backend(backend: Arc<dyn HttpBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Retry policy in use
    #[inline]
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send a request, retrying transient failures
    ///
    /// Returns `None` for an empty success body.
    ///
    /// # Errors
    /// Returns the last failure once attempts are exhausted, or the first
    /// non-retryable failure immediately.
    pub async fn request(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        let mut attempt = 1;
        loop {
            match self.attempt(&request).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        method = %request.method,
                        endpoint = %request.endpoint,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "request failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<Option<Value>, ApiError> {
        let response = self.backend.execute(request).await?;

        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status,
                method: request.method,
                endpoint: request.endpoint.clone(),
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            debug!(endpoint = %request.endpoint, status = response.status, "empty response body");
            return Ok(None);
        }

        serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|e| ApiError::InvalidBody {
                endpoint: request.endpoint.clone(),
                message: e.to_string(),
            })
    }

    /// GET an endpoint
    pub async fn get(&self, endpoint: &str) -> Result<Option<Value>, ApiError> {
        self.request(ApiRequest::new(HttpMethod::Get, endpoint)).await
    }

    /// GET an endpoint with query parameters
    pub async fn get_with_query(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<Option<Value>, ApiError> {
        self.request(ApiRequest::new(HttpMethod::Get, endpoint).with_query(query))
            .await
    }

    /// POST to an endpoint
    pub async fn post(&self, endpoint: &str, body: Option<Value>) -> Result<Option<Value>, ApiError> {
        self.request(ApiRequest::new(HttpMethod::Post, endpoint).with_body(body))
            .await
    }

    /// DELETE an endpoint
    pub async fn delete(&self, endpoint: &str) -> Result<Option<Value>, ApiError> {
        self.request(ApiRequest::new(HttpMethod::Delete, endpoint)).await
    }

    /// GET an endpoint that must return JSON
    pub async fn get_json(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.get(endpoint)
            .await?
            .ok_or_else(|| ApiError::EmptyBody(endpoint.to_string()))
    }

    /// POST to an endpoint that must return JSON
    pub async fn post_json(&self, endpoint: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.post(endpoint, body)
            .await?
            .ok_or_else(|| ApiError::EmptyBody(endpoint.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubBackend;
    use crate::transport::ApiResponse;
    use serde_json::json;

    #[tokio::test]
    async fn succeeds_after_two_server_errors() {
        let stub = StubBackend::scripted(vec![
            ApiResponse::new(503, "busy"),
            ApiResponse::new(503, "busy"),
            ApiResponse::json(&json!({"id": 1})),
        ]);
        let client = stub.client(RetryPolicy::immediate(3));

        let body = client.get("queries/1").await.unwrap();

        assert_eq!(body, Some(json!({"id": 1})));
        assert_eq!(stub.requests().len(), 3);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let stub = StubBackend::scripted(vec![
            ApiResponse::new(400, "email taken"),
            ApiResponse::json(&json!({})),
        ]);
        let client = stub.client(RetryPolicy::immediate(3));

        let err = client.post("users", Some(json!({}))).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(stub.requests().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let stub = StubBackend::scripted(vec![
            ApiResponse::new(500, ""),
            ApiResponse::new(502, ""),
            ApiResponse::new(503, ""),
            ApiResponse::json(&json!({})),
        ]);
        let client = stub.client(RetryPolicy::immediate(3));

        let err = client.get("groups").await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(stub.requests().len(), 3);
    }

    #[tokio::test]
    async fn empty_body_is_none() {
        let stub = StubBackend::scripted(vec![ApiResponse::new(200, "")]);
        let client = stub.client(RetryPolicy::none());

        assert_eq!(client.delete("data_sources/3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_json_is_reported() {
        let stub = StubBackend::scripted(vec![ApiResponse::new(200, "<html>")]);
        let client = stub.client(RetryPolicy::none());

        let err = client.get("dashboards").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidBody { .. }));
    }
}
