//! Response document decoding.
//!
//! A response carries a primary `data` section (one object, an array, or
//! null) and an optional `included` array of side-loaded resources. Each
//! resource is decoded independently so one malformed entry never takes
//! down its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::domain::{DecodeError, PerIdError, Resource};

/// Resources decoded from one response
#[derive(Debug, Default)]
pub(crate) struct DecodedDocument {
    /// Resources from `data`, in response order
    pub primary: Vec<Arc<Resource>>,

    /// Resources from `included`, in response order
    pub included: Vec<Arc<Resource>>,

    /// One entry per resource that failed to decode
    pub errors: Vec<PerIdError>,
}

impl DecodedDocument {
    /// Parse and decode a response body.
    ///
    /// Fails only when the body is not a JSON object with a `data` member.
    pub fn parse(body: &str) -> Result<Self, DecodeError> {
        let raw: Value =
            serde_json::from_str(body).map_err(|e| DecodeError::MalformedDocument(e.to_string()))?;
        let object = raw.as_object().ok_or(DecodeError::NotAnObject)?;

        let primary = match object.get("data") {
            None => return Err(DecodeError::MissingRequiredField("data")),
            Some(Value::Null) => &[][..],
            Some(Value::Array(entries)) => entries.as_slice(),
            Some(single) => std::slice::from_ref(single),
        };
        let included = object
            .get("included")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut decoded = Self::default();
        decoded.primary = decoded.decode_section(primary);
        decoded.included = decoded.decode_section(included);
        Ok(decoded)
    }

    fn decode_section(&mut self, entries: &[Value]) -> Vec<Arc<Resource>> {
        let mut resources = Vec::with_capacity(entries.len());
        for entry in entries {
            match Resource::decode(entry) {
                Ok(resource) => resources.push(Arc::new(resource)),
                Err(source) => {
                    let id = Resource::peek_id(entry);
                    warn!(id = id.as_deref().unwrap_or("?"), error = %source, "Skipping malformed resource");
                    self.errors.push(PerIdError::Decode { id, source });
                }
            }
        }
        resources
    }

    /// Every decoded resource by id; a primary entry wins over an included
    /// one with the same id
    pub fn by_id(&self) -> HashMap<String, Arc<Resource>> {
        self.included
            .iter()
            .chain(&self.primary)
            .map(|resource| (resource.id().to_string(), Arc::clone(resource)))
            .collect()
    }

    /// Whether `id` appeared in the response but could not be decoded
    pub fn failed_to_decode(&self, id: &str) -> bool {
        self.errors.iter().any(|error| error.id() == Some(id))
    }

    /// All resources in commit order (included first, so primary wins)
    pub fn into_resources(self) -> impl Iterator<Item = Arc<Resource>> {
        self.included.into_iter().chain(self.primary)
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.included.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;

    #[test]
    fn test_single_object_data() {
        let doc = DecodedDocument::parse(r#"{ "data": { "id": "homepage", "type": "view" } }"#).unwrap();
        assert_eq!(doc.primary.len(), 1);
        assert!(doc.included.is_empty());
        assert_eq!(doc.primary[0].resource_type(), ResourceType::View);
    }

    #[test]
    fn test_array_with_included_and_bad_entry() {
        let body = r#"{
            "data": [
                { "id": "c1", "type": "collection" },
                { "id": "broken", "type": "hologram" },
                { "type": "video" }
            ],
            "included": [{ "id": "v1", "type": "video" }]
        }"#;

        let doc = DecodedDocument::parse(body).unwrap();
        assert_eq!(doc.primary.len(), 1);
        assert_eq!(doc.included.len(), 1);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.errors.len(), 2);
        assert!(doc.failed_to_decode("broken"));
        assert!(!doc.failed_to_decode("c1"));
        assert!(doc.by_id().contains_key("v1"));
    }

    #[test]
    fn test_null_data_is_empty() {
        let doc = DecodedDocument::parse(r#"{ "data": null, "included": null }"#).unwrap();
        assert_eq!(doc.len(), 0);
    }

    #[test]
    fn test_missing_data_is_an_error() {
        assert_eq!(
            DecodedDocument::parse(r#"{ "errors": [] }"#).unwrap_err(),
            DecodeError::MissingRequiredField("data")
        );
        assert!(matches!(
            DecodedDocument::parse("<html>"),
            Err(DecodeError::MalformedDocument(_))
        ));
    }
}
