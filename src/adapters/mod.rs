//! Transport interfaces for the content backend.
//!
//! The store never builds HTTP requests itself. It hands a `Transport` a
//! description of what it needs and gets back a raw JSON body, so the
//! engine can be driven by the real HTTP client or by an in-memory one.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ResourceType;

// Re-export the HTTP transport
pub use http::HttpTransport;

/// A batched request for resources of one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Type the caller expects
    pub resource_type: ResourceType,

    /// Ids to fetch, in caller order
    pub ids: Vec<String>,

    /// Comma-separated relationship names to side-load
    pub include: Option<String>,
}

impl ResourceRequest {
    pub fn new(resource_type: ResourceType, ids: Vec<String>, include: Option<String>) -> Self {
        Self {
            resource_type,
            ids,
            include,
        }
    }
}

/// Errors a transport can report; the store treats all of them alike
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0} is not supported by this transport")]
    Unsupported(&'static str),
}

/// Trait for content backends
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name
    fn name(&self) -> &str;

    /// Fetch the application config document
    async fn fetch_config(&self) -> Result<String, TransportError>;

    /// Fetch a batch of resources
    async fn fetch_resources(&self, request: &ResourceRequest) -> Result<String, TransportError>;

    /// Run a search query
    async fn search(&self, term: &str) -> Result<String, TransportError>;
}
