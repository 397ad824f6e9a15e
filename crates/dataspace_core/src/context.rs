//! Everything one process needs, built once from configuration.
//!
//! The cache is shared by the aggregator and the writer so a write invalidates
//! exactly what the next aggregation would otherwise serve.

use std::sync::Arc;

use crate::aggregator::{Aggregation, Aggregator};
use crate::cache::AggregationCache;
use crate::config::DataspaceConfig;
use crate::identity::WebId;
use crate::store::{DocumentStore, TimeoutStore};
use crate::writer::CatalogWriter;
use crate::Result;

#[derive(Debug, Clone)]
pub struct DataspaceContext {
    config: DataspaceConfig,
    store: Arc<dyn DocumentStore>,
    cache: Arc<AggregationCache>,
    aggregator: Aggregator,
}

impl DataspaceContext {
    /// Talk to real pods over HTTP, authenticated when a token is configured.
    #[cfg(feature = "http")]
    pub async fn connect(config: DataspaceConfig) -> Result<Self> {
        let mut store = crate::store::HttpStore::new(
            config.network.fetch_timeout(),
            config.network.connect_timeout(),
        )?;
        if let Some(token) = config.access_token() {
            store = store.with_access_token(token);
        }
        if let Some(web_id) = &config.identity.web_id {
            store = store.with_owner(web_id.clone());
        }
        Ok(Self::with_store(config, Arc::new(store)).await)
    }

    /// Build on any store. Every call through the context is time-bounded.
    pub async fn with_store(config: DataspaceConfig, store: Arc<dyn DocumentStore>) -> Self {
        let store: Arc<dyn DocumentStore> =
            Arc::new(TimeoutStore::new(store, config.network.fetch_timeout()));

        let policy = config.cache.policy();
        let cache = match &config.cache.path {
            Some(path) => AggregationCache::open(path, policy).await,
            None => AggregationCache::in_memory(policy),
        };
        let cache = Arc::new(cache);

        let aggregator = Aggregator::new(
            store.clone(),
            cache.clone(),
            Some(config.registry.url.clone()).filter(|url| !url.trim().is_empty()),
        )
        .with_max_concurrent(config.network.max_concurrent_fetches);

        Self {
            config,
            store,
            cache,
            aggregator,
        }
    }

    pub fn config(&self) -> &DataspaceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<AggregationCache> {
        &self.cache
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn web_id(&self) -> Result<&WebId> {
        self.config.web_id()
    }

    /// Aggregate from the configured identity's point of view.
    pub async fn aggregate(&self) -> Result<Aggregation> {
        let web_id = self.web_id()?;
        Ok(self.aggregator.aggregate(web_id).await)
    }

    /// Writer for the configured owner's own catalog, located the same way
    /// readers locate it.
    pub async fn writer(&self) -> Result<CatalogWriter> {
        let owner = self.web_id()?.clone();
        let catalog_url = self.aggregator.locator().locate_catalog(&owner).await;
        Ok(
            CatalogWriter::new(self.store.clone(), self.cache.clone(), owner)
                .with_catalog_url(catalog_url),
        )
    }
}
