//! Server-provided application config.
//!
//! Fetched once by `ContentStore::initialize`. The only part the store
//! reads is the view table mapping view names (e.g. "homepage") to view ids.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::errors::DecodeError;

/// Application config served by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    views: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    data: Option<Value>,
}

impl AppConfig {
    /// Build a config from (view name, view id) pairs
    pub fn from_views<I, K, V>(views: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            views: views
                .into_iter()
                .map(|(name, id)| (name.into(), id.into()))
                .collect(),
        }
    }

    /// Decode the config response body.
    ///
    /// View entries whose id is not a string are skipped.
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        let document: ConfigDocument = serde_json::from_str(body)
            .map_err(|e| DecodeError::MalformedDocument(e.to_string()))?;
        let data = document
            .data
            .ok_or(DecodeError::MissingRequiredField("data"))?;
        let object = data.as_object().ok_or(DecodeError::NotAnObject)?;

        let views = object
            .get("attributes")
            .and_then(|attrs| attrs.get("views"))
            .and_then(Value::as_object)
            .map(|views| {
                views
                    .iter()
                    .filter_map(|(name, id)| id.as_str().map(|id| (name.clone(), id.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { views })
    }

    /// Names of every configured view, sorted
    pub fn view_names(&self) -> Vec<&str> {
        self.views.keys().map(String::as_str).collect()
    }

    /// Id of the view registered under `name`
    pub fn id_for_view_name(&self, name: &str) -> Option<&str> {
        self.views.get(name).map(String::as_str)
    }
}
