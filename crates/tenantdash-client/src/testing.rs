//! In-crate stub backend for unit tests

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::retry::RetryPolicy;
use crate::transport::{ApiRequest, ApiResponse, HttpBackend};

type Handler = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

enum Responder {
    Scripted(VecDeque<ApiResponse>),
    Handler(Handler),
}

struct StubState {
    responder: Responder,
    requests: Vec<ApiRequest>,
}

/// Backend answering from a script or a closure, recording every request
#[derive(Clone)]
pub(crate) struct StubBackend {
    state: Arc<Mutex<StubState>>,
}

impl fmt::Debug for StubBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubBackend")
            .field("requests", &self.state.lock().requests.len())
            .finish()
    }
}

impl StubBackend {
    /// Answer with these responses in order, then 500
    pub(crate) fn scripted(responses: Vec<ApiResponse>) -> Self {
        Self::from_responder(Responder::Scripted(responses.into()))
    }

    /// Answer every request with `handler`
    pub(crate) fn handler<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    {
        Self::from_responder(Responder::Handler(Box::new(handler)))
    }

    fn from_responder(responder: Responder) -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState {
                responder,
                requests: Vec::new(),
            })),
        }
    }

    /// Client sharing this stub
    pub(crate) fn client(&self, retry: RetryPolicy) -> ApiClient {
        ApiClient::with_backend(Arc::new(self.clone()), retry)
    }

    /// Requests seen so far
    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().requests.clone()
    }
}

#[async_trait]
impl HttpBackend for StubBackend {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        let response = match &mut state.responder {
            Responder::Scripted(queue) => queue
                .pop_front()
                .unwrap_or_else(|| ApiResponse::new(500, "script exhausted")),
            Responder::Handler(handler) => handler(request),
        };
        Ok(response)
    }
}
