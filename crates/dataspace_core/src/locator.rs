//! Catalog location: type index lookup with a deterministic fallback.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::identity::{resolve_against, WebId};
use crate::store::DocumentStore;
use crate::vocab::{dcat, solid};

#[derive(Debug, Clone)]
pub struct CatalogLocator {
    store: Arc<dyn DocumentStore>,
    max_concurrent: usize,
}

impl CatalogLocator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            max_concurrent: crate::DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Catalog resource URL for `owner`. Always returns a URL.
    ///
    /// Follows the profile's public type index to a `dcat:Catalog` registration;
    /// any miss along the way falls back to the default catalog location.
    pub async fn locate_catalog(&self, owner: &WebId) -> String {
        match self.lookup_type_index(owner).await {
            Some(url) => {
                tracing::debug!(owner = %owner, catalog_url = %url, "catalog found via type index");
                url
            }
            None => {
                let url = owner.default_catalog_url();
                tracing::debug!(owner = %owner, catalog_url = %url, "using default catalog location");
                url
            }
        }
    }

    /// Locate catalogs for many owners concurrently. Deduplicated, sorted.
    pub async fn locate_all(&self, owners: &[WebId]) -> Vec<String> {
        let mut urls: Vec<String> = stream::iter(owners)
            .map(|owner| self.locate_catalog(owner))
            .buffered(self.max_concurrent)
            .collect()
            .await;
        urls.sort();
        urls.dedup();
        urls
    }

    async fn lookup_type_index(&self, owner: &WebId) -> Option<String> {
        let profile_doc = owner.document_url();
        let profile = match self.store.fetch_document(&profile_doc).await {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "profile unavailable");
                return None;
            }
        };

        let index_ref = profile
            .first_iri(owner.as_str(), solid::PUBLIC_TYPE_INDEX)
            .or_else(|| {
                profile
                    .objects_any(solid::PUBLIC_TYPE_INDEX)
                    .into_iter()
                    .find_map(|term| term.as_iri())
            })?;
        let index_url = resolve_against(&profile_doc, index_ref)?;

        let index = match self.store.fetch_document(&index_url).await {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!(owner = %owner, type_index = %index_url, error = %e, "type index unavailable");
                return None;
            }
        };

        let registration = index
            .subjects()
            .into_iter()
            .find(|subject| {
                index
                    .iris(subject, solid::FOR_CLASS)
                    .contains(&dcat::CATALOG)
            })?;
        let Some(instance) = index.first_iri(registration, solid::INSTANCE) else {
            tracing::warn!(owner = %owner, type_index = %index_url, "catalog registration has no instance");
            return None;
        };
        resolve_against(&index_url, instance)
    }
}
