//! Named relationship edges between resources.
//!
//! A node is built from the wire shape of one `relationships` entry. Its
//! target ids are fixed at creation; what changes over time is whether the
//! targets have been attached as in-memory objects.
//!
//! Once a target is attached it stays attached, even if a later fetch
//! replaces the cache entry. Parents and targets can point at each other,
//! so the cache detaches every node it holds when it is reset.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::core::{ContentStore, FetchError, FetchOutcome};

use super::errors::PerIdError;
use super::resource::{Resource, ResourceType};

/// Whether the wire carried a single reference or a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Plural,
}

/// Resolution state of a relationship node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Targets known only by id
    IdsOnly,
    /// Every target is attached as an object
    ObjectsAttached,
}

/// One `{id, type}` reference on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipTarget {
    pub id: String,

    /// Type the parent claims the target has; `None` if absent or unknown
    pub declared_type: Option<ResourceType>,
}

impl RelationshipTarget {
    pub fn new(id: impl Into<String>, declared_type: Option<ResourceType>) -> Self {
        Self {
            id: id.into(),
            declared_type,
        }
    }

    fn decode(json: &Value) -> Option<Self> {
        let object = json.as_object()?;
        let id = object.get("id").and_then(Value::as_str)?;
        let declared_type = object
            .get("type")
            .and_then(Value::as_str)
            .and_then(|t| t.parse().ok());
        Some(Self::new(id, declared_type))
    }
}

/// A named, ordered edge from a parent resource to its targets
pub struct RelationshipNode {
    name: String,
    cardinality: Cardinality,
    targets: Vec<RelationshipTarget>,
    /// One slot per target; `None` until attached
    attached: RwLock<Vec<Option<Arc<Resource>>>>,
}

// Attached objects can point back at the parent, so only ids are printed
impl fmt::Debug for RelationshipNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attached = self.slots().iter().filter(|slot| slot.is_some()).count();
        f.debug_struct("RelationshipNode")
            .field("name", &self.name)
            .field("cardinality", &self.cardinality)
            .field("targets", &self.targets)
            .field("attached", &attached)
            .finish()
    }
}

impl RelationshipNode {
    /// Create an unresolved node
    pub fn new(
        name: impl Into<String>,
        cardinality: Cardinality,
        targets: Vec<RelationshipTarget>,
    ) -> Self {
        let attached = vec![None; targets.len()];
        Self {
            name: name.into(),
            cardinality,
            targets,
            attached: RwLock::new(attached),
        }
    }

    /// Build a node from a `relationships` entry.
    ///
    /// Accepts a bare reference, an array of references, or either wrapped
    /// in `{ "data": ... }`. References without an id are dropped.
    pub fn decode(name: &str, json: &Value) -> Self {
        let data = match json.as_object().and_then(|object| object.get("data")) {
            Some(data) => data,
            None => json,
        };

        match data {
            Value::Array(entries) => Self::new(
                name,
                Cardinality::Plural,
                entries.iter().filter_map(RelationshipTarget::decode).collect(),
            ),
            other => Self::new(
                name,
                Cardinality::Singular,
                RelationshipTarget::decode(other).into_iter().collect(),
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_plural(&self) -> bool {
        self.cardinality == Cardinality::Plural
    }

    pub fn targets(&self) -> &[RelationshipTarget] {
        &self.targets
    }

    /// Target ids in wire order
    pub fn all_ids(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn number_of_relationships(&self) -> usize {
        self.targets.len()
    }

    /// The declared target type when every target agrees on one
    pub fn target_type(&self) -> Option<ResourceType> {
        let first = self.targets.first()?.declared_type?;
        self.targets
            .iter()
            .all(|t| t.declared_type == Some(first))
            .then_some(first)
    }

    pub fn resolution(&self) -> Resolution {
        if self.slots().iter().all(Option::is_some) {
            Resolution::ObjectsAttached
        } else {
            Resolution::IdsOnly
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution() == Resolution::ObjectsAttached
    }

    /// Attached objects in target order, if the node is fully resolved
    pub fn objects(&self) -> Option<Vec<Arc<Resource>>> {
        self.slots().into_iter().collect()
    }

    /// Ids of targets of type `resource_type`.
    ///
    /// Filtering uses the attached objects, so it is only accurate once the
    /// node is resolved. An unresolved node returns every target id in wire
    /// order, unfiltered; call [`get_all_objects`](Self::get_all_objects)
    /// first when the filter matters.
    pub fn ids_of_type(&self, resource_type: ResourceType) -> Vec<String> {
        match self.objects() {
            Some(objects) => objects
                .iter()
                .filter(|object| object.resource_type() == resource_type)
                .map(|object| object.id().to_string())
                .collect(),
            None => self.targets.iter().map(|t| t.id.clone()).collect(),
        }
    }

    /// Attach every unattached target that `lookup` can supply.
    ///
    /// Returns how many slots were newly attached.
    pub(crate) fn attach<F>(&self, lookup: F) -> usize
    where
        F: Fn(&str) -> Option<Arc<Resource>>,
    {
        let mut slots = self.attached.write().unwrap_or_else(PoisonError::into_inner);
        let mut attached = 0;

        for (target, slot) in self.targets.iter().zip(slots.iter_mut()) {
            if slot.is_some() {
                continue;
            }
            if let Some(object) = lookup(&target.id) {
                *slot = Some(object);
                attached += 1;
            }
        }

        attached
    }

    /// Targets not attached yet, in wire order
    pub(crate) fn pending_targets(&self) -> Vec<&RelationshipTarget> {
        self.targets
            .iter()
            .zip(self.slots())
            .filter(|(_, slot)| slot.is_none())
            .map(|(target, _)| target)
            .collect()
    }

    /// Clear every slot, returning how many were attached
    pub(crate) fn detach(&self) -> usize {
        let mut slots = self.attached.write().unwrap_or_else(PoisonError::into_inner);
        slots.iter_mut().filter_map(Option::take).count()
    }

    /// Resolve every target to an object, in target order.
    ///
    /// Already attached targets are served without touching the network.
    /// Unresolved targets go through the store grouped by declared type, so
    /// a homogeneous node costs one fetch at most. Targets with no declared
    /// type can only be served from the cache.
    pub async fn get_all_objects(&self, store: &ContentStore) -> Result<FetchOutcome, FetchError> {
        let slots = self.slots();
        let mut errors = Vec::new();
        let mut groups: Vec<(ResourceType, Vec<String>)> = Vec::new();
        let mut fetched: HashMap<String, Arc<Resource>> = HashMap::new();

        for (target, slot) in self.targets.iter().zip(&slots) {
            if slot.is_some() {
                continue;
            }
            match target.declared_type {
                Some(resource_type) => {
                    match groups.iter_mut().find(|(t, _)| *t == resource_type) {
                        Some((_, ids)) => ids.push(target.id.clone()),
                        None => groups.push((resource_type, vec![target.id.clone()])),
                    }
                }
                None => match store.cache().get(&target.id) {
                    Some(object) => {
                        fetched.insert(target.id.clone(), object);
                    }
                    None => errors.push(PerIdError::NotFound(target.id.clone())),
                },
            }
        }

        if groups.is_empty() && fetched.is_empty() {
            return Ok(FetchOutcome::new(slots.into_iter().flatten().collect(), errors));
        }

        debug!(
            relationship = %self.name,
            groups = groups.len(),
            "Resolving relationship targets"
        );

        for (resource_type, ids) in groups {
            let outcome = store.objects_of_type(resource_type, ids.as_slice(), None).await?;
            errors.extend(outcome.errors);
            fetched.extend(
                outcome
                    .objects
                    .into_iter()
                    .map(|object| (object.id().to_string(), object)),
            );
        }

        self.attach(|id| fetched.get(id).cloned());

        // Merge: previously attached slots keep their object, new ones come
        // from this round; anything still missing is reported in `errors`.
        let objects = self
            .targets
            .iter()
            .zip(slots)
            .filter_map(|(target, slot)| slot.or_else(|| fetched.get(&target.id).cloned()))
            .collect();

        Ok(FetchOutcome::new(objects, errors))
    }

    fn slots(&self) -> Vec<Option<Arc<Resource>>> {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
