//! Mock remote client for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::remote::{ApiRequest, RemoteClient, RemoteError};

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request that was made.
    pub request: ApiRequest,
    /// When the request was made (tokio clock, so paused-time tests can
    /// measure delays between attempts).
    pub timestamp: Instant,
}

/// A handler that produces a response for every request to one path.
type PathHandler = Box<dyn Fn(&ApiRequest) -> Result<Value, RemoteError> + Send + Sync>;

/// Mock implementation of the RemoteClient trait.
///
/// Responses are looked up by request path:
/// - scripted responses queued with `push_response` are served first, in order
/// - otherwise the handler registered with `set_handler` answers
/// - otherwise the request fails with HTTP 404
///
/// # Example
///
/// ```rust,ignore
/// use kyhunt_core::testing::{fixtures, MockRemoteClient};
///
/// let client = MockRemoteClient::new();
/// client.push_response("qualityprofile", Ok(json!([]))).await;
/// client
///     .set_handler("wanted/cutoff", fixtures::paged_listing(movies))
///     .await;
///
/// // ... run discovery ...
///
/// assert_eq!(client.request_count("wanted/cutoff").await, 3);
/// ```
pub struct MockRemoteClient {
    /// Per-path scripted responses.
    scripted: Arc<Mutex<HashMap<String, VecDeque<Result<Value, RemoteError>>>>>,
    /// Per-path fallback handlers.
    handlers: Arc<RwLock<HashMap<String, PathHandler>>>,
    /// Recorded requests.
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl std::fmt::Debug for MockRemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRemoteClient")
            .field("scripted", &"<scripted>")
            .field("handlers", &"<handlers>")
            .field("requests", &"<requests>")
            .finish()
    }
}

impl Default for MockRemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteClient {
    /// Create a new mock client with no responses configured.
    pub fn new() -> Self {
        Self {
            scripted: Arc::new(Mutex::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a response for the next request to `path`.
    pub async fn push_response(&self, path: &str, response: Result<Value, RemoteError>) {
        self.scripted
            .lock()
            .await
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue several responses for `path`, served in order.
    pub async fn push_responses<I>(&self, path: &str, responses: I)
    where
        I: IntoIterator<Item = Result<Value, RemoteError>>,
    {
        let mut scripted = self.scripted.lock().await;
        let queue = scripted.entry(path.to_string()).or_default();
        queue.extend(responses);
    }

    /// Register a handler answering every unscripted request to `path`.
    pub async fn set_handler<F>(&self, path: &str, handler: F)
    where
        F: Fn(&ApiRequest) -> Result<Value, RemoteError> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .await
            .insert(path.to_string(), Box::new(handler));
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Get recorded requests made to `path`.
    pub async fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.request.path == path)
            .cloned()
            .collect()
    }

    /// Get the number of requests made to `path`.
    pub async fn request_count(&self, path: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.request.path == path)
            .count()
    }

    /// Clear recorded requests.
    pub async fn clear_recorded(&self) {
        self.requests.write().await.clear();
    }
}

#[async_trait]
impl RemoteClient for MockRemoteClient {
    async fn request(&self, request: ApiRequest) -> Result<Value, RemoteError> {
        self.requests.write().await.push(RecordedRequest {
            request: request.clone(),
            timestamp: Instant::now(),
        });

        let scripted = self
            .scripted
            .lock()
            .await
            .get_mut(&request.path)
            .and_then(|queue| queue.pop_front());
        if let Some(response) = scripted {
            return response;
        }

        let handlers = self.handlers.read().await;
        match handlers.get(&request.path) {
            Some(handler) => handler(&request),
            None => Err(RemoteError::HttpStatus {
                status: 404,
                message: format!("no mock response for {}", request.path),
            }),
        }
    }
}
