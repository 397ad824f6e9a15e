//! Aggregation across every participating owner's catalog
//!
//! Registry -> locate (one per owner) -> load (one per catalog, cache-aware) ->
//! annotate -> merge. A failing or slow pod only ever degrades its own owner's
//! contribution to cached or empty; it never fails the whole call.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::cache::{AggregationCache, Freshness};
use crate::dataset::Dataset;
use crate::identity::WebId;
use crate::loader::CatalogLoader;
use crate::locator::CatalogLocator;
use crate::registry::RegistryResolver;
use crate::store::DocumentStore;

/// Where one catalog's contribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// Loaded from the pod in this call
    Fresh,
    /// Served from a cache entry young enough to skip fetching
    Cached,
    /// The load failed; an older cache entry stood in
    Fallback,
    /// The load failed and nothing was cached
    Empty,
    /// Only an expired cache entry was left, so nothing was served
    Expired,
}

impl CatalogSource {
    pub fn is_degraded(self) -> bool {
        matches!(
            self,
            CatalogSource::Fallback | CatalogSource::Empty | CatalogSource::Expired
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStatus {
    pub catalog_url: String,
    pub source: CatalogSource,
    pub last_success: Option<DateTime<Utc>>,
    pub dataset_count: usize,
}

/// Result of one aggregation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Merged datasets, one per identifier, sorted by identifier
    pub datasets: Vec<Dataset>,
    /// Every catalog considered, sorted
    pub catalogs: Vec<String>,
    pub statuses: Vec<CatalogStatus>,
    /// Served entirely from cache without touching any catalog
    pub from_cache: bool,
}

/// One catalog's settled contribution, before annotation.
struct CatalogResult {
    catalog_url: String,
    datasets: Vec<Dataset>,
    last_success: Option<DateTime<Utc>>,
    source: CatalogSource,
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: RegistryResolver,
    locator: CatalogLocator,
    loader: CatalogLoader,
    cache: Arc<AggregationCache>,
    max_concurrent: usize,
}

impl Aggregator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<AggregationCache>,
        registry_url: Option<String>,
    ) -> Self {
        Self {
            registry: RegistryResolver::new(store.clone(), registry_url),
            locator: CatalogLocator::new(store.clone()),
            loader: CatalogLoader::new(store),
            cache,
            max_concurrent: crate::DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    /// Cap on outstanding fetches at each fan-out stage.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        let max = max.max(1);
        self.registry = self.registry.with_max_concurrent(max);
        self.locator = self.locator.with_max_concurrent(max);
        self.loader = self.loader.with_max_concurrent(max);
        self.max_concurrent = max;
        self
    }

    pub fn cache(&self) -> &Arc<AggregationCache> {
        &self.cache
    }

    pub fn locator(&self) -> &CatalogLocator {
        &self.locator
    }

    pub async fn aggregate(&self, self_id: &WebId) -> Aggregation {
        self.aggregate_at(self_id, Utc::now()).await
    }

    /// Aggregate as of `now`.
    pub async fn aggregate_at(&self, self_id: &WebId, now: DateTime<Utc>) -> Aggregation {
        let members = self.registry.resolve_members(self_id).await;
        let catalogs = self.locator.locate_all(&members).await;

        if let Some(results) = self.fast_path(&catalogs, now) {
            tracing::info!(
                owner = %self_id,
                catalogs = catalogs.len(),
                "serving aggregation from cache"
            );
            return finish(catalogs, results, self.cache.as_ref(), now, true);
        }

        let results: Vec<CatalogResult> = stream::iter(&catalogs)
            .map(|catalog_url| self.collect_catalog(catalog_url, now))
            .buffered(self.max_concurrent)
            .collect()
            .await;

        self.cache.mark_aggregated(now);
        let pruned = self.cache.prune(now);
        if pruned > 0 {
            tracing::debug!(pruned, "dropped expired cache entries");
        }
        if let Err(e) = self.cache.persist().await {
            tracing::warn!(error = %e, "failed to persist aggregation cache");
        }

        let aggregation = finish(catalogs, results, self.cache.as_ref(), now, false);
        let degraded = aggregation
            .statuses
            .iter()
            .filter(|s| s.source.is_degraded())
            .count();
        tracing::info!(
            owner = %self_id,
            catalogs = aggregation.catalogs.len(),
            datasets = aggregation.datasets.len(),
            degraded,
            "aggregation complete"
        );
        aggregation
    }

    /// Cached results for every catalog, if the last aggregation is inside the TTL
    /// window and each catalog has a servable entry.
    fn fast_path(&self, catalogs: &[String], now: DateTime<Utc>) -> Option<Vec<CatalogResult>> {
        let last = self.cache.last_aggregated()?;
        if !self.cache.policy().within_ttl(last, now) {
            return None;
        }
        catalogs
            .iter()
            .map(|catalog_url| {
                let entry = self.cache.peek(catalog_url)?;
                if self.cache.is_expired(&entry, now) {
                    return None;
                }
                Some(CatalogResult {
                    catalog_url: catalog_url.clone(),
                    datasets: entry.datasets,
                    last_success: Some(entry.last_success),
                    source: CatalogSource::Cached,
                })
            })
            .collect()
    }

    async fn collect_catalog(&self, catalog_url: &str, now: DateTime<Utc>) -> CatalogResult {
        let cached = self.cache.peek(catalog_url);
        if let Some(entry) = &cached {
            if self.cache.is_fresh_enough(entry, now) {
                tracing::debug!(catalog_url, "cache entry fresh, skipping fetch");
                return CatalogResult {
                    catalog_url: catalog_url.to_string(),
                    datasets: entry.datasets.clone(),
                    last_success: Some(entry.last_success),
                    source: CatalogSource::Cached,
                };
            }
        }

        match self.loader.load_catalog(catalog_url).await {
            Ok(datasets) => {
                self.cache.put_at(catalog_url, datasets.clone(), now);
                CatalogResult {
                    catalog_url: catalog_url.to_string(),
                    datasets,
                    last_success: Some(now),
                    source: CatalogSource::Fresh,
                }
            }
            Err(e) => {
                tracing::warn!(catalog_url, error = %e.store_error(), "catalog load failed");
                match cached {
                    Some(entry) => CatalogResult {
                        catalog_url: catalog_url.to_string(),
                        datasets: entry.datasets,
                        last_success: Some(entry.last_success),
                        source: CatalogSource::Fallback,
                    },
                    None => CatalogResult {
                        catalog_url: catalog_url.to_string(),
                        datasets: Vec::new(),
                        last_success: None,
                        source: CatalogSource::Empty,
                    },
                }
            }
        }
    }
}

/// Drop expired contributions, annotate the rest, and merge.
fn finish(
    catalogs: Vec<String>,
    results: Vec<CatalogResult>,
    cache: &AggregationCache,
    now: DateTime<Utc>,
    from_cache: bool,
) -> Aggregation {
    let mut statuses = Vec::with_capacity(results.len());
    let mut annotated = Vec::new();

    for result in results {
        let freshness = result
            .last_success
            .map(|at| cache.policy().classify(at, now));
        let (source, datasets) = match freshness {
            Some(Freshness::Expired) => (CatalogSource::Expired, Vec::new()),
            _ => (result.source, result.datasets),
        };
        let is_stale = freshness.is_some_and(Freshness::is_stale);

        statuses.push(CatalogStatus {
            catalog_url: result.catalog_url,
            source,
            last_success: result.last_success,
            dataset_count: datasets.len(),
        });
        annotated.extend(datasets.into_iter().map(|mut dataset| {
            dataset.last_seen_at = result.last_success;
            dataset.is_stale = is_stale;
            dataset
        }));
    }

    Aggregation {
        datasets: merge_datasets(annotated),
        catalogs,
        statuses,
        from_cache,
    }
}

/// Collapse records sharing an identifier, keeping the latest `modified`.
///
/// Ties keep the record seen first; a missing `modified` is older than any
/// timestamp. Output is sorted by identifier.
pub fn merge_datasets(datasets: impl IntoIterator<Item = Dataset>) -> Vec<Dataset> {
    let mut merged: BTreeMap<String, Dataset> = BTreeMap::new();
    for dataset in datasets {
        let key = if dataset.identifier.is_empty() {
            dataset.dataset_url.clone()
        } else {
            dataset.identifier.clone()
        };
        match merged.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(dataset);
            }
            Entry::Occupied(mut kept) => {
                if dataset.modified > kept.get().modified {
                    kept.insert(dataset);
                }
            }
        }
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(id: &str, modified: Option<(i32, u32, u32)>, source: &str) -> Dataset {
        Dataset {
            identifier: id.to_string(),
            dataset_url: format!("{source}ds/{id}.ttl#it"),
            source_catalog_url: format!("{source}cat.ttl#it"),
            modified: modified
                .map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_keeps_latest_modified() {
        let older = record("d1", Some((2024, 1, 1)), "https://a.example/");
        let newer = record("d1", Some((2024, 2, 1)), "https://b.example/");

        for input in [
            vec![older.clone(), newer.clone()],
            vec![newer.clone(), older.clone()],
        ] {
            let merged = merge_datasets(input);
            assert_eq!(merged, vec![newer.clone()]);
        }
    }

    #[test]
    fn test_merge_ties_keep_first_and_none_is_oldest() {
        let first = record("d1", Some((2024, 1, 1)), "https://a.example/");
        let second = record("d1", Some((2024, 1, 1)), "https://b.example/");
        assert_eq!(merge_datasets(vec![first.clone(), second]), vec![first]);

        let undated = record("d2", None, "https://a.example/");
        let dated = record("d2", Some((2020, 1, 1)), "https://b.example/");
        assert_eq!(
            merge_datasets(vec![dated.clone(), undated]),
            vec![dated]
        );
    }

    #[test]
    fn test_merge_output_sorted_by_identifier() {
        let merged = merge_datasets(vec![
            record("zeta", None, "https://a.example/"),
            record("alpha", None, "https://a.example/"),
        ]);
        let ids: Vec<&str> = merged.iter().map(|d| d.identifier.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = vec![
            record("d1", Some((2024, 1, 1)), "https://a.example/"),
            record("d1", Some((2024, 3, 1)), "https://b.example/"),
            record("d2", None, "https://a.example/"),
        ];
        let once = merge_datasets(input.clone());
        assert_eq!(merge_datasets(once.clone()), once);
        assert_eq!(merge_datasets(input), once);
    }
}
