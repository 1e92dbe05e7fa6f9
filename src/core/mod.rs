//! Core store logic.
//!
//! This module contains:
//! - ContentStore: Lifecycle, session and the shared cache
//! - ContentCache: Id-keyed resource cache
//! - Engine: Batched fetch, include linking and type validation
//! - Search: Heterogeneous search results

pub mod cache;
mod document;
pub mod engine;
pub mod error;
pub mod inflight;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use cache::ContentCache;
pub use engine::{FetchOutcome, Include};
pub use error::{FetchError, InitError};
pub use inflight::InflightRegistry;
pub use search::SearchResults;
pub use store::{ContentStore, Lifecycle, Session};
