//! Image metadata attached to content resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::wire::lenient;

/// One image rendition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Where the image lives
    pub url: String,

    /// Label describing the rendition (e.g. "aspect16x9")
    pub label: String,

    #[serde(default, deserialize_with = "lenient")]
    pub mime_type: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub width: Option<u32>,

    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<u32>,
}

impl Image {
    /// Decode a single image entry, `None` if `url` or `label` is missing.
    ///
    /// Optional fields of the wrong type decode as absent.
    pub fn decode(json: &Value) -> Option<Self> {
        serde_json::from_value(json.clone()).ok()
    }

    /// Decode every valid entry of an `images` array, skipping the rest
    pub fn decode_all(json: Option<&Value>) -> Vec<Self> {
        json.and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(Self::decode).collect())
            .unwrap_or_default()
    }
}
