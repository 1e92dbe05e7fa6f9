//! Whole-operation errors.
//!
//! Per-id problems live in [`PerIdError`](crate::domain::PerIdError) and are
//! returned next to the objects; these variants mean nothing was returned.

use thiserror::Error;

use crate::adapters::TransportError;
use crate::domain::DecodeError;

use super::store::Lifecycle;

/// A fetch or search failed as a whole
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("response could not be decoded: {0}")]
    Document(DecodeError),

    #[error("content store is not ready (state: {0})")]
    NotReady(Lifecycle),

    #[error("no view named `{0}` in the app config")]
    UnknownView(String),
}

/// `ContentStore::initialize` failed; the store keeps its previous state
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to fetch config: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to decode config: {0}")]
    Decode(#[from] DecodeError),
}
