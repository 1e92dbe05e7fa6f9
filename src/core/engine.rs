//! Fetch/resolve engine.
//!
//! Turns "give me these ids as this type" into cache hits plus at most one
//! batched request for the gap, then decodes, links and commits the
//! response. Included targets that neither the cache nor the response
//! could supply are fetched afterwards, one batch per declared type.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::adapters::ResourceRequest;
use crate::domain::{PerIdError, Resource, ResourceType};

use super::document::DecodedDocument;
use super::error::FetchError;
use super::store::ContentStore;

/// Objects resolved by a fetch plus the ids that failed
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Resources for the requested ids, in request order
    pub objects: Vec<Arc<Resource>>,

    /// Per-id failures; an id listed here is absent from `objects`
    pub errors: Vec<PerIdError>,
}

impl FetchOutcome {
    pub fn new(objects: Vec<Arc<Resource>>, errors: Vec<PerIdError>) -> Self {
        Self { objects, errors }
    }

    pub fn first(&self) -> Option<&Arc<Resource>> {
        self.objects.first()
    }

    /// True when every requested id resolved
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Ids of the returned objects, in order
    pub fn ids(&self) -> Vec<&str> {
        self.objects.iter().map(|object| object.id()).collect()
    }
}

/// Relationship names the backend should side-load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Include {
    names: Vec<String>,
}

impl Include {
    /// Parse a comma-separated directive; blank entries are ignored
    pub fn parse(raw: Option<&str>) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in raw.unwrap_or_default().split(',').map(str::trim) {
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The directive as sent on the wire
    pub fn to_param(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.names.join(","))
    }

    /// Link the included relationships of `resource` from `lookup`
    fn link<F>(&self, resource: &Resource, lookup: F) -> usize
    where
        F: Fn(&str) -> Option<Arc<Resource>>,
    {
        self.names
            .iter()
            .filter_map(|name| resource.relationship(name))
            .map(|node| node.attach(&lookup))
            .sum()
    }
}

/// Remove duplicate ids, keeping the first occurrence
fn dedupe<S: AsRef<str>>(ids: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.as_ref())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

impl ContentStore {
    /// Fetch objects of `resource_type` by id.
    ///
    /// Cached ids are served from the cache; the rest are fetched in one
    /// batch, optionally side-loading the relationships named by `include`.
    /// Objects come back in the order of `ids`. Ids that could not be
    /// served are reported in `errors` rather than failing the call; only a
    /// transport failure or an undecodable response fails it.
    #[instrument(skip(self, ids, include), fields(resource_type = %resource_type, requested = ids.len()))]
    pub async fn objects_of_type<S: AsRef<str>>(
        &self,
        resource_type: ResourceType,
        ids: &[S],
        include: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let session = self.ensure_ready()?;
        let include = Include::parse(include);
        let requested = dedupe(ids);

        let mut found: HashMap<String, Arc<Resource>> = HashMap::new();
        let mut missing = Vec::new();
        for id in &requested {
            match self.cache().get(id) {
                Some(resource) => {
                    found.insert(id.clone(), resource);
                }
                None => missing.push(id.clone()),
            }
        }

        debug!(
            cached = found.len(),
            missing = missing.len(),
            "Partitioned requested ids"
        );

        let mut errors = Vec::new();
        if !missing.is_empty() {
            self.fetch_missing(session, resource_type, &missing, &include, &mut found, &mut errors)
                .await?;
        }

        if !include.is_empty() {
            let parents: Vec<Arc<Resource>> = found.values().cloned().collect();
            self.resolve_included(session, &include, &parents).await?;
        }

        let mut objects = Vec::with_capacity(requested.len());
        for id in &requested {
            let Some(resource) = found.remove(id) else {
                continue;
            };
            let actual = resource.resource_type();
            if actual == resource_type {
                objects.push(resource);
            } else {
                debug!(%id, expected = %resource_type, %actual, "Type mismatch");
                errors.push(PerIdError::TypeMismatch {
                    id: id.clone(),
                    expected: resource_type,
                    actual,
                });
            }
        }

        Ok(FetchOutcome::new(objects, errors))
    }

    /// Fetch ids missing from the cache, deferring to in-flight requests
    async fn fetch_missing(
        &self,
        session: uuid::Uuid,
        resource_type: ResourceType,
        missing: &[String],
        include: &Include,
        found: &mut HashMap<String, Arc<Resource>>,
        errors: &mut Vec<PerIdError>,
    ) -> Result<(), FetchError> {
        let key = include.to_param().unwrap_or_default();
        let claim = self.inflight().claim(resource_type, &key, missing);

        if !claim.owned.is_empty() {
            self.fetch_batch(session, resource_type, &claim.owned, include, found, errors)
                .await?;
        }
        // Release our own ids before waiting on anyone else's
        drop(claim.guard);

        let mut leftovers = Vec::new();
        for waiter in claim.awaiting {
            let id = waiter.settled().await;
            match self.cache().get(&id) {
                Some(resource) => {
                    found.insert(id, resource);
                }
                None => leftovers.push(id),
            }
        }

        if !leftovers.is_empty() {
            debug!(count = leftovers.len(), "In-flight fetch did not produce ids, fetching directly");
            self.fetch_batch(session, resource_type, &leftovers, include, found, errors)
                .await?;
        }

        Ok(())
    }

    /// Attach the included relationships of `parents`.
    ///
    /// Targets are linked from the cache first; whatever is still pending is
    /// fetched with one batch per declared type. Failures for individual
    /// targets leave their slots empty and are not reported to the caller.
    async fn resolve_included(
        &self,
        session: uuid::Uuid,
        include: &Include,
        parents: &[Arc<Resource>],
    ) -> Result<(), FetchError> {
        let mut groups: Vec<(ResourceType, Vec<String>)> = Vec::new();
        for parent in parents {
            include.link(parent, |target| self.cache().get(target));

            let pending = include
                .names
                .iter()
                .filter_map(|name| parent.relationship(name))
                .flat_map(|node| node.pending_targets());
            for target in pending {
                let Some(resource_type) = target.declared_type else {
                    debug!(id = %target.id, "Included target has no type, leaving it unresolved");
                    continue;
                };
                match groups.iter_mut().find(|(t, _)| *t == resource_type) {
                    Some((_, ids)) if ids.contains(&target.id) => {}
                    Some((_, ids)) => ids.push(target.id.clone()),
                    None => groups.push((resource_type, vec![target.id.clone()])),
                }
            }
        }

        if groups.is_empty() {
            return Ok(());
        }

        let mut fetched = HashMap::new();
        let mut unresolved = Vec::new();
        for (resource_type, ids) in &groups {
            self.fetch_missing(
                session,
                *resource_type,
                ids,
                &Include::default(),
                &mut fetched,
                &mut unresolved,
            )
            .await?;
        }

        let linked: usize = parents
            .iter()
            .map(|parent| {
                include.link(parent, |target| {
                    fetched.get(target).cloned().or_else(|| self.cache().get(target))
                })
            })
            .sum();

        debug!(
            batches = groups.len(),
            linked,
            unresolved = unresolved.len(),
            "Fetched included targets missing from cache"
        );

        Ok(())
    }

    /// One network round trip: request, decode, link, commit
    async fn fetch_batch(
        &self,
        session: uuid::Uuid,
        resource_type: ResourceType,
        ids: &[String],
        include: &Include,
        found: &mut HashMap<String, Arc<Resource>>,
        errors: &mut Vec<PerIdError>,
    ) -> Result<(), FetchError> {
        let request = ResourceRequest::new(resource_type, ids.to_vec(), include.to_param());

        let body = self
            .transport()
            .fetch_resources(&request)
            .await
            .map_err(|e| {
                warn!(error = %e, count = ids.len(), "Batch fetch failed");
                FetchError::Transport(e)
            })?;

        let document = DecodedDocument::parse(&body).map_err(FetchError::Document)?;
        let by_id = document.by_id();

        let mut linked = 0;
        for resource in &document.primary {
            linked += include.link(resource, |target| by_id.get(target).cloned());
        }

        for id in ids {
            match by_id.get(id) {
                Some(resource) => {
                    found.insert(id.clone(), Arc::clone(resource));
                }
                // Already reported as a decode error
                None if document.failed_to_decode(id) => {}
                None => errors.push(PerIdError::NotFound(id.clone())),
            }
        }

        let decoded = document.len();
        errors.extend(document.errors.iter().cloned());
        let added = self.commit(session, document.into_resources());

        info!(
            requested = ids.len(),
            decoded,
            linked,
            added,
            "Fetched batch"
        );

        Ok(())
    }
}
