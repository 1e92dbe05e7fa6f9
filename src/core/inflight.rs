//! Registry of ids with a fetch currently in progress.
//!
//! A fetch claims the ids it is about to request. A second fetch that wants
//! one of those ids (same type and include directive) waits for the first to
//! settle instead of issuing its own request. Claims are released when the
//! owning guard drops, which also covers failed and cancelled fetches.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use crate::domain::ResourceType;

type Key = (ResourceType, String, String);

fn key(resource_type: ResourceType, include: &str, id: &str) -> Key {
    (resource_type, include.to_string(), id.to_string())
}

/// Ids currently being fetched
#[derive(Debug, Default)]
pub struct InflightRegistry {
    pending: Mutex<HashMap<Key, watch::Receiver<bool>>>,
}

/// Result of claiming a set of ids
pub(crate) struct Claim<'a> {
    /// Ids this caller must fetch itself
    pub owned: Vec<String>,

    /// Ids another fetch is already working on
    pub awaiting: Vec<Waiter>,

    /// Releases `owned` when dropped
    pub guard: InflightGuard<'a>,
}

/// Handle for an id owned by another fetch
pub(crate) struct Waiter {
    pub id: String,
    done: watch::Receiver<bool>,
}

impl Waiter {
    /// Wait until the owning fetch settles (successfully or not)
    pub async fn settled(mut self) -> String {
        // A closed channel also means the owner is gone
        let _ = self.done.wait_for(|done| *done).await;
        self.id
    }
}

/// Releases claimed ids and wakes waiters on drop
pub(crate) struct InflightGuard<'a> {
    registry: &'a InflightRegistry,
    keys: Vec<Key>,
    done: watch::Sender<bool>,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        if self.keys.is_empty() {
            return;
        }
        let mut pending = self
            .registry
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for key in self.keys.drain(..) {
            pending.remove(&key);
        }
        let _ = self.done.send(true);
    }
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `ids` into ones to fetch now and ones already in flight
    pub(crate) fn claim(
        &self,
        resource_type: ResourceType,
        include: &str,
        ids: &[String],
    ) -> Claim<'_> {
        let (sender, receiver) = watch::channel(false);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        let mut owned = Vec::new();
        let mut awaiting = Vec::new();
        let mut keys = Vec::new();

        for id in ids {
            let key = key(resource_type, include, id);
            match pending.get(&key) {
                Some(done) => awaiting.push(Waiter {
                    id: id.clone(),
                    done: done.clone(),
                }),
                None => {
                    pending.insert(key.clone(), receiver.clone());
                    keys.push(key);
                    owned.push(id.clone());
                }
            }
        }

        Claim {
            owned,
            awaiting,
            guard: InflightGuard {
                registry: self,
                keys,
                done: sender,
            },
        }
    }

    /// Number of ids currently in flight
    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
