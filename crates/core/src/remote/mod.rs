//! Remote API abstraction.
//!
//! This module provides a `RemoteClient` trait for issuing authenticated
//! requests against a Radarr-style API. The discovery engine only depends on
//! this trait; `RadarrClient` is the reqwest-backed implementation.

mod radarr;
mod types;

pub use radarr::RadarrClient;
pub use types::*;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the remote API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Missing URL or API key. Never retried.
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Connection or other transport-level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The server answered with an empty body.
    #[error("Empty response body")]
    EmptyBody,

    /// The payload could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether the failure is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RemoteError::NotConfigured(_))
    }

    /// Whether the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Timeout)
    }
}

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// A single request against the remote API.
///
/// `path` is relative to the API root (e.g. `wanted/cutoff`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Create a POST request with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Append a query parameter.
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Look up a query parameter by name.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Trait for remote API clients.
///
/// Implementations perform exactly one request per call and classify
/// failures; retries are the caller's concern.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Perform an authenticated request and return the parsed JSON payload.
    async fn request(&self, request: ApiRequest) -> Result<Value, RemoteError>;
}

/// Decode a JSON payload into a typed value.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
}

/// Perform a request and decode the payload in one step.
pub async fn fetch<T: DeserializeOwned>(
    client: &dyn RemoteClient,
    request: ApiRequest,
) -> Result<T, RemoteError> {
    decode(client.request(request).await?)
}
