//! Domain types for the content store.
//!
//! This module contains the object graph model:
//! - Resource: typed content items decoded from the wire
//! - RelationshipNode: named edges between resources
//! - AppConfig: the server's view table
//! - Errors: decode and per-id failures

pub mod app_config;
pub mod errors;
pub mod image;
pub mod relationship;
pub mod resource;
mod wire;

// Re-export commonly used types
pub use app_config::AppConfig;
pub use errors::{DecodeError, PerIdError};
pub use image::Image;
pub use relationship::{Cardinality, RelationshipNode, RelationshipTarget, Resolution};
pub use resource::{CommonAttributes, Resource, ResourceKind, ResourceType};
