//! Id-keyed cache of every resource fetched in the current session.
//!
//! Ids are unique across the whole backend, so the cache is keyed by id
//! alone. Inserting an id that is already present replaces the entry.
//!
//! Relationship nodes hold their targets strongly, so reset detaches the
//! nodes of every removed resource to break parent/target cycles.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::domain::{Resource, ResourceType};

/// Shared content cache
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: RwLock<HashMap<String, Arc<Resource>>>,
}

impl ContentCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Resource>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Resource>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a resource by id
    pub fn get(&self, id: &str) -> Option<Arc<Resource>> {
        self.read().get(id).cloned()
    }

    /// Check whether an id is cached
    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Insert or replace a resource, returning the entry it replaced
    pub fn put(&self, resource: impl Into<Arc<Resource>>) -> Option<Arc<Resource>> {
        let resource = resource.into();
        self.write().insert(resource.id().to_string(), resource)
    }

    /// Insert or replace a batch under one write lock.
    ///
    /// Readers see either none or all of the batch. Returns the number of
    /// entries that were new.
    pub fn put_all<I>(&self, resources: I) -> usize
    where
        I: IntoIterator<Item = Arc<Resource>>,
    {
        let mut entries = self.write();
        resources
            .into_iter()
            .filter(|resource| {
                entries
                    .insert(resource.id().to_string(), Arc::clone(resource))
                    .is_none()
            })
            .count()
    }

    /// Snapshot of every cached resource
    pub fn all(&self) -> Vec<Arc<Resource>> {
        self.read().values().cloned().collect()
    }

    /// Snapshot of cached resources of one type
    pub fn of_type(&self, resource_type: ResourceType) -> Vec<Arc<Resource>> {
        self.read()
            .values()
            .filter(|resource| resource.resource_type() == resource_type)
            .cloned()
            .collect()
    }

    /// Get the number of cached resources
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every entry, returning how many were removed
    pub fn reset(&self) -> usize {
        let drained: Vec<Arc<Resource>> = self.write().drain().map(|(_, resource)| resource).collect();

        let detached: usize = drained.iter().map(|resource| resource.detach_relationships()).sum();
        debug!(removed = drained.len(), detached, "Cache reset");

        drained.len()
    }
}
