//! Decode and per-id error types.
//!
//! These errors never abort a batch: a `DecodeError` skips one resource,
//! a `PerIdError` is reported alongside the objects that did resolve.

use thiserror::Error;

use super::resource::ResourceType;

/// A resource (or whole document) could not be decoded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing required field `{0}`")]
    MissingRequiredField(&'static str),

    #[error("unknown resource type `{0}`")]
    UnknownType(String),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

/// A failure scoped to one id inside an otherwise successful fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PerIdError {
    #[error("{id} exists but is not of type {expected}")]
    TypeMismatch {
        id: String,
        expected: ResourceType,
        actual: ResourceType,
    },

    #[error("{0} was not found")]
    NotFound(String),

    #[error("failed to decode {}: {source}", .id.as_deref().unwrap_or("resource"))]
    Decode {
        id: Option<String>,
        source: DecodeError,
    },
}

impl PerIdError {
    /// The id this error is about, when known
    pub fn id(&self) -> Option<&str> {
        match self {
            PerIdError::TypeMismatch { id, .. } | PerIdError::NotFound(id) => Some(id),
            PerIdError::Decode { id, .. } => id.as_deref(),
        }
    }
}
