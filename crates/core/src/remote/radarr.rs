//! Radarr API client implementation.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RadarrConfig;

use super::{ApiRequest, Method, RemoteClient, RemoteError};

const USER_AGENT: &str = concat!("kyhunt/", env!("CARGO_PKG_VERSION"));

/// Radarr v3 API client.
///
/// Holds a single `reqwest::Client`, so clones of an `Arc<RadarrClient>`
/// share one connection pool.
pub struct RadarrClient {
    client: Client,
    config: RadarrConfig,
}

impl RadarrClient {
    /// Create a new Radarr client.
    ///
    /// Fails fast with `NotConfigured` when the URL or API key is missing.
    pub fn new(config: RadarrConfig) -> Result<Self, RemoteError> {
        if config.url.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(RemoteError::NotConfigured(
                "Radarr URL and API key are required".to_string(),
            ));
        }

        if !config.verify_ssl {
            debug!("SSL verification disabled by configuration");
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| RemoteError::NotConfigured(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Build the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v3/{}", self.base_url(), path.trim_start_matches('/'))
    }

    fn builder(&self, request: &ApiRequest) -> RequestBuilder {
        let url = self.api_url(&request.path);
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        let mut builder = builder
            .header("X-Api-Key", &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }

    /// Check that the Radarr instance is reachable with the configured key.
    pub async fn check_connection(&self) -> Result<(), RemoteError> {
        let url = self.config.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RemoteError::NotConfigured(format!(
                "Invalid URL format: {} - URL must start with http:// or https://",
                url
            )));
        }

        self.request(ApiRequest::get("system/status")).await?;
        debug!("Successfully connected to Radarr");
        Ok(())
    }
}

fn classify(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else if let Some(status) = e.status() {
        RemoteError::HttpStatus {
            status: status.as_u16(),
            message: e.to_string(),
        }
    } else {
        RemoteError::Transport(e.to_string())
    }
}

#[async_trait]
impl RemoteClient for RadarrClient {
    async fn request(&self, request: ApiRequest) -> Result<Value, RemoteError> {
        debug!(method = ?request.method, path = %request.path, "Radarr request");

        let response = self.builder(&request).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), path = %request.path, "Radarr request failed");
            return Err(RemoteError::HttpStatus {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let text = response.text().await.map_err(classify)?;
        if text.trim().is_empty() {
            return Err(RemoteError::EmptyBody);
        }

        serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}
