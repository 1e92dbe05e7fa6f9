//! Typed content resources.
//!
//! A resource is decoded from one JSON object of the wire format:
//!
//! ```json
//! {
//!   "id": "42baaa6e1e9ce2bb6d96d53007656f02",
//!   "type": "video",
//!   "attributes": { "title": "...", "url": "...", "duration": 13000000 },
//!   "relationships": { "related": { "data": [{ "id": "...", "type": "video" }] } }
//! }
//! ```
//!
//! `id` and `type` are mandatory. Everything else is decoded best-effort:
//! a missing or wrongly typed attribute becomes `None`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DecodeError;
use super::image::Image;
use super::relationship::RelationshipNode;
use super::wire::{lenient, lenient_millis};

/// Kind of content resource served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Video,
    Collection,
    View,
    Promotion,
    Article,
    Event,
    External,
}

impl ResourceType {
    /// Every resource type, in declaration order
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Video,
        ResourceType::Collection,
        ResourceType::View,
        ResourceType::Promotion,
        ResourceType::Article,
        ResourceType::Event,
        ResourceType::External,
    ];

    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "video",
            ResourceType::Collection => "collection",
            ResourceType::View => "view",
            ResourceType::Promotion => "promotion",
            ResourceType::Article => "article",
            ResourceType::Event => "event",
            ResourceType::External => "external",
        }
    }

    /// Collection path segment used by the REST API
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceType::Video => "videos",
            ResourceType::Collection => "collections",
            ResourceType::View => "views",
            ResourceType::Promotion => "promotions",
            ResourceType::Article => "articles",
            ResourceType::Event => "events",
            ResourceType::External => "externals",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower || t.plural() == lower)
            .ok_or_else(|| DecodeError::UnknownType(s.to_string()))
    }
}

/// Attributes every resource kind may carry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonAttributes {
    pub title: Option<String>,

    /// Free-form description, often HTML
    pub description: Option<String>,

    pub thumbnail_link: Option<String>,

    pub images: Vec<Image>,
}

/// Per-kind payload; the variant is the resource's type tag
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceKind {
    Video {
        url: Option<String>,
        /// Duration in milliseconds
        duration: Option<u64>,
    },
    Collection,
    View,
    Promotion {
        url: Option<String>,
    },
    Article {
        url: Option<String>,
    },
    Event {
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    },
    External {
        url: Option<String>,
    },
}

impl ResourceKind {
    /// Type tag of this kind
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceKind::Video { .. } => ResourceType::Video,
            ResourceKind::Collection => ResourceType::Collection,
            ResourceKind::View => ResourceType::View,
            ResourceKind::Promotion { .. } => ResourceType::Promotion,
            ResourceKind::Article { .. } => ResourceType::Article,
            ResourceKind::Event { .. } => ResourceType::Event,
            ResourceKind::External { .. } => ResourceType::External,
        }
    }

    fn decode(resource_type: ResourceType, attrs: &WireAttributes) -> Self {
        match resource_type {
            ResourceType::Video => ResourceKind::Video {
                url: attrs.url.clone(),
                duration: attrs.duration,
            },
            ResourceType::Collection => ResourceKind::Collection,
            ResourceType::View => ResourceKind::View,
            ResourceType::Promotion => ResourceKind::Promotion {
                url: attrs.url.clone(),
            },
            ResourceType::Article => ResourceKind::Article {
                url: attrs.url.clone(),
            },
            ResourceType::Event => ResourceKind::Event {
                starts_at: attrs.starts_at,
                ends_at: attrs.ends_at,
            },
            ResourceType::External => ResourceKind::External {
                url: attrs.url.clone(),
            },
        }
    }
}

/// Wire shape of one resource object
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireResource {
    #[serde(deserialize_with = "lenient")]
    id: Option<String>,

    #[serde(rename = "type", deserialize_with = "lenient")]
    resource_type: Option<String>,

    #[serde(deserialize_with = "lenient")]
    attributes: Option<WireAttributes>,

    #[serde(deserialize_with = "lenient")]
    relationships: Option<Map<String, Value>>,
}

/// Wire shape of `attributes`; every field is optional and lenient
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WireAttributes {
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,

    #[serde(deserialize_with = "lenient")]
    description: Option<String>,

    #[serde(deserialize_with = "lenient")]
    thumbnail_link: Option<String>,

    images: Option<Value>,

    #[serde(deserialize_with = "lenient")]
    url: Option<String>,

    #[serde(deserialize_with = "lenient_millis")]
    duration: Option<u64>,

    #[serde(deserialize_with = "lenient")]
    starts_at: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient")]
    ends_at: Option<DateTime<Utc>>,
}

/// A decoded content resource
///
/// Immutable once built, apart from the resolution state of its
/// relationship nodes.
#[derive(Debug)]
pub struct Resource {
    id: String,
    kind: ResourceKind,
    attributes: CommonAttributes,
    relationships: HashMap<String, RelationshipNode>,
    fetched_at: DateTime<Utc>,
}

impl Resource {
    /// Decode a resource object from its JSON representation
    pub fn decode(json: &Value) -> Result<Self, DecodeError> {
        if !json.is_object() {
            return Err(DecodeError::NotAnObject);
        }
        let wire = WireResource::deserialize(json)
            .map_err(|e| DecodeError::MalformedDocument(e.to_string()))?;

        let id = wire
            .id
            .filter(|id| !id.is_empty())
            .ok_or(DecodeError::MissingRequiredField("id"))?;
        let resource_type: ResourceType = wire
            .resource_type
            .filter(|t| !t.is_empty())
            .ok_or(DecodeError::MissingRequiredField("type"))?
            .parse()?;

        let attrs = wire.attributes.unwrap_or_default();
        let kind = ResourceKind::decode(resource_type, &attrs);
        let images = Image::decode_all(attrs.images.as_ref());
        let thumbnail_link = attrs
            .thumbnail_link
            .or_else(|| images.first().map(|image| image.url.clone()));

        let attributes = CommonAttributes {
            title: attrs.title,
            description: attrs.description,
            thumbnail_link,
            images,
        };

        let relationships = wire
            .relationships
            .unwrap_or_default()
            .iter()
            .map(|(name, value)| (name.clone(), RelationshipNode::decode(name, value)))
            .collect();

        Ok(Self {
            id,
            kind,
            attributes,
            relationships,
            fetched_at: Utc::now(),
        })
    }

    /// Best-effort id of an undecodable resource, for error reporting
    pub fn peek_id(json: &Value) -> Option<String> {
        json.get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resource_type(&self) -> ResourceType {
        self.kind.resource_type()
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    pub fn attributes(&self) -> &CommonAttributes {
        &self.attributes
    }

    pub fn title(&self) -> Option<&str> {
        self.attributes.title.as_deref()
    }

    /// Description text (the "notes" of a video)
    pub fn description(&self) -> Option<&str> {
        self.attributes.description.as_deref()
    }

    pub fn thumbnail_link(&self) -> Option<&str> {
        self.attributes.thumbnail_link.as_deref()
    }

    pub fn images(&self) -> &[Image] {
        &self.attributes.images
    }

    /// Playback or target URL for kinds that have one
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::Video { url, .. }
            | ResourceKind::Promotion { url }
            | ResourceKind::Article { url }
            | ResourceKind::External { url } => url.as_deref(),
            ResourceKind::Collection | ResourceKind::View | ResourceKind::Event { .. } => None,
        }
    }

    /// Video duration in milliseconds
    pub fn duration(&self) -> Option<u64> {
        match self.kind {
            ResourceKind::Video { duration, .. } => duration,
            _ => None,
        }
    }

    /// When this resource was decoded (its cache time)
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Look up a relationship node by name
    pub fn relationship(&self, name: &str) -> Option<&RelationshipNode> {
        self.relationships.get(name)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipNode> {
        self.relationships.values()
    }

    /// Drop every attached object, returning how many slots were cleared
    pub(crate) fn detach_relationships(&self) -> usize {
        self.relationships.values().map(RelationshipNode::detach).sum()
    }

    /// Relationship names, sorted
    pub fn relationship_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.relationships.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
