//! Search merge: one query, results of mixed type.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::{PerIdError, Resource, ResourceType};

use super::document::DecodedDocument;
use super::error::FetchError;
use super::store::ContentStore;

/// Typed search results in response order
#[derive(Debug, Default)]
pub struct SearchResults {
    pub videos: Vec<Arc<Resource>>,
    pub collections: Vec<Arc<Resource>>,

    /// Result entries that failed to decode
    pub errors: Vec<PerIdError>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.videos.len() + self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentStore {
    /// Search the backend.
    ///
    /// Every returned resource is cached, including side-loaded ones and
    /// result types other than video and collection. A blank term returns
    /// no results without a request.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<SearchResults, FetchError> {
        let session = self.ensure_ready()?;

        let term = term.trim();
        if term.is_empty() {
            debug!("Blank search term, skipping request");
            return Ok(SearchResults::default());
        }

        let body = self.transport().search(term).await?;
        let document = DecodedDocument::parse(&body).map_err(FetchError::Document)?;

        let mut results = SearchResults {
            errors: document.errors.clone(),
            ..SearchResults::default()
        };
        for resource in &document.primary {
            match resource.resource_type() {
                ResourceType::Video => results.videos.push(Arc::clone(resource)),
                ResourceType::Collection => results.collections.push(Arc::clone(resource)),
                other => debug!(id = %resource.id(), resource_type = %other, "Ignoring search result"),
            }
        }

        let added = self.commit(session, document.into_resources());
        info!(
            videos = results.videos.len(),
            collections = results.collections.len(),
            added,
            "Search complete"
        );

        Ok(results)
    }
}
