use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tenantdash_client::{ApiClient, ApiError, ApiRequest, ApiResponse, HttpBackend, RetryPolicy};

/// Backend replaying canned responses in order
///
/// Once the script runs out every request gets a 500.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, ApiError>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn respond(&self, response: ApiResponse) -> &Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    /// Queue a connection failure
    pub fn fail(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .push_back(Err(ApiError::Transport(message.to_string())));
        self
    }

    pub fn client(&self, retry: RetryPolicy) -> ApiClient {
        ApiClient::with_backend(Arc::new(self.clone()), retry)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpBackend for ScriptedBackend {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(500, "script exhausted")))
    }
}
