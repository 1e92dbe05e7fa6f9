//! contentstore - Client-side content graph store
//!
//! Fetches typed content resources (videos, collections, views, ...) from
//! a JSON backend, keeps them in an id-keyed cache for the session and
//! resolves the relationships between them on demand.
//!
//! # Architecture
//!
//! - Resources are decoded once and shared as `Arc<Resource>`
//! - Relationship nodes start as ids and get objects attached either by an
//!   `include` directive or by lazy resolution
//! - A fetch serves cached ids locally and batches the rest into one request
//!
//! # Modules
//!
//! - `adapters`: Transports to the backend (HTTP)
//! - `core`: Store, cache, fetch engine and search
//! - `domain`: Resource model and relationship nodes
//! - `config`: Configuration discovery and resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # List configured views
//! contentstore views
//!
//! # Fetch a view with side-loaded relationships
//! contentstore view homepage --include featuredMedia,featuredCollections
//!
//! # Resolve a relationship lazily
//! contentstore related collection ab2d92ee98b6309299e92024a487d4c0 entities
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{HttpTransport, ResourceRequest, Transport, TransportError};
pub use core::{ContentStore, FetchError, FetchOutcome, InitError, Lifecycle, SearchResults};
pub use domain::{AppConfig, PerIdError, RelationshipNode, Resource, ResourceType};
