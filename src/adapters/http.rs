//! HTTP transport for an Oddworks-style content API.
//!
//! Endpoints:
//! - `GET /config`
//! - `GET /{type}s/{id}` for a single id, `GET /{type}s?id=a,b` for batches
//! - `GET /search?term=...`
//!
//! Auth: `x-access-token` header

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::{ResourceRequest, Transport, TransportError};
use crate::config::ResolvedConfig;

/// Header carrying the device access token
const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// reqwest-backed transport
pub struct HttpTransport {
    /// API base URL; endpoint segments are appended to its path
    base_url: Url,
    /// Device access token
    auth_token: Option<String>,
    /// Request timeout (reported in timeout errors)
    timeout: Duration,
    /// HTTP client
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new transport
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| TransportError::Request(format!("invalid base URL: {}", base_url)))?;

        Ok(Self {
            base_url,
            auth_token,
            timeout,
            client,
        })
    }

    /// Create from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, TransportError> {
        Self::new(
            config.base_url.clone(),
            config.auth_token.clone(),
            config.timeout,
        )
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Request(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build the URL for a resource request
    fn resource_url(&self, request: &ResourceRequest) -> Result<Url, TransportError> {
        let plural = request.resource_type.plural();
        match request.ids.as_slice() {
            [single] => self.endpoint(&[plural, single.as_str()]),
            _ => self.endpoint(&[plural]),
        }
    }

    /// Query parameters for a resource request
    fn resource_query(request: &ResourceRequest) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if request.ids.len() > 1 {
            query.push(("id", request.ids.join(",")));
        }
        if let Some(include) = request.include.as_deref().filter(|i| !i.is_empty()) {
            query.push(("include", include.to_string()));
        }
        query
    }

    /// GET a URL and return the body of a successful response
    async fn get(&self, url: Url, query: &[(&'static str, String)]) -> Result<String, TransportError> {
        debug!(%url, "GET");

        let mut builder = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .query(query);

        if let Some(token) = &self.auth_token {
            builder = builder.header(ACCESS_TOKEN_HEADER, token);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_config(&self) -> Result<String, TransportError> {
        let url = self.endpoint(&["config"])?;
        self.get(url, &[]).await
    }

    async fn fetch_resources(&self, request: &ResourceRequest) -> Result<String, TransportError> {
        let url = self.resource_url(request)?;
        self.get(url, &Self::resource_query(request)).await
    }

    async fn search(&self, term: &str) -> Result<String, TransportError> {
        let url = self.endpoint(&["search"])?;
        self.get(url, &[("term", term.to_string())]).await
    }
}
