//! Per-catalog aggregation cache
//!
//! Holds the last successfully loaded dataset list of every catalog, keyed by
//! catalog URL, and optionally mirrors it to a JSON file so the view survives
//! restarts. Construct one per process and share it behind an `Arc`.

mod file;
mod policy;

pub use file::{read_cache_file, write_cache_file, CacheFile, CACHE_SCHEMA_VERSION};
pub use policy::{
    CachePolicy, Freshness, DEFAULT_EXPIRE_AFTER, DEFAULT_STALE_AFTER, DEFAULT_TTL,
};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::CacheError;

/// The last successful load of one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub datasets: Vec<Dataset>,
    pub last_success: DateTime<Utc>,
}

#[derive(Debug)]
pub struct AggregationCache {
    /// Cached loads: catalog url -> entry
    entries: DashMap<String, CacheEntry>,

    policy: CachePolicy,

    /// Backing file, if durable
    path: Option<PathBuf>,

    /// When a whole aggregation last completed
    last_aggregated: Mutex<Option<DateTime<Utc>>>,

    /// Serializes file writes
    persist_lock: tokio::sync::Mutex<()>,
}

impl AggregationCache {
    /// A cache that lives only as long as the process.
    pub fn in_memory(policy: CachePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
            path: None,
            last_aggregated: Mutex::new(None),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// A cache backed by `path`, seeded from it when a valid file exists.
    ///
    /// An unusable file is logged and ignored; this never fails.
    pub async fn open(path: impl Into<PathBuf>, policy: CachePolicy) -> Self {
        let path = path.into();
        let mut cache = Self::in_memory(policy);
        if let Some(file) = read_cache_file(&path).await {
            tracing::debug!(
                path = %path.display(),
                catalogs = file.catalogs.len(),
                "loaded aggregation cache"
            );
            cache.entries.extend(file.catalogs);
            *cache.last_aggregated.get_mut() = file.last_aggregated;
        }
        cache.path = Some(path);
        cache
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ========== Entry access ==========

    /// The entry for `catalog_url`, unless missing or expired.
    pub fn get(&self, catalog_url: &str) -> Option<CacheEntry> {
        self.get_at(catalog_url, Utc::now())
    }

    /// Like [`get`](Self::get) at an explicit time. Expired entries are removed.
    pub fn get_at(&self, catalog_url: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entry = self.peek(catalog_url)?;
        if self.is_expired(&entry, now) {
            self.entries
                .remove_if(catalog_url, |_, e| self.is_expired(e, now));
            return None;
        }
        Some(entry)
    }

    /// The raw entry regardless of age.
    pub fn peek(&self, catalog_url: &str) -> Option<CacheEntry> {
        self.entries.get(catalog_url).map(|e| e.value().clone())
    }

    /// Store a successful load stamped now.
    pub fn put(&self, catalog_url: &str, datasets: Vec<Dataset>) -> bool {
        self.put_at(catalog_url, datasets, Utc::now())
    }

    /// Store a load that succeeded at `at`.
    ///
    /// Ignored, returning false, when the current entry is newer; a slow
    /// aggregation finishing late never clobbers a fresher result.
    pub fn put_at(&self, catalog_url: &str, datasets: Vec<Dataset>, at: DateTime<Utc>) -> bool {
        let fresh = CacheEntry {
            datasets,
            last_success: at,
        };
        match self.entries.entry(catalog_url.to_string()) {
            Entry::Occupied(mut existing) => {
                if existing.get().last_success > at {
                    tracing::debug!(catalog_url, "kept newer cache entry");
                    return false;
                }
                existing.insert(fresh);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                true
            }
        }
    }

    /// Forget one catalog. The next aggregation refetches it instead of
    /// serving the whole view from cache.
    pub fn invalidate(&self, catalog_url: &str) -> bool {
        *self.last_aggregated.lock() = None;
        self.entries.remove(catalog_url).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
        *self.last_aggregated.lock() = None;
    }

    /// Drop every expired entry, returning how many went.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry, now));
        before.saturating_sub(self.entries.len())
    }

    // ========== Policy ==========

    pub fn freshness(&self, entry: &CacheEntry, now: DateTime<Utc>) -> Freshness {
        self.policy.classify(entry.last_success, now)
    }

    pub fn is_fresh_enough(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        self.freshness(entry, now) == Freshness::Fresh
    }

    pub fn is_stale(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        self.freshness(entry, now).is_stale()
    }

    pub fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        !self.freshness(entry, now).is_servable()
    }

    // ========== Whole-aggregation bookkeeping ==========

    pub fn mark_aggregated(&self, now: DateTime<Utc>) {
        let mut last = self.last_aggregated.lock();
        if last.map_or(true, |prev| prev < now) {
            *last = Some(now);
        }
    }

    pub fn last_aggregated(&self) -> Option<DateTime<Utc>> {
        *self.last_aggregated.lock()
    }

    // ========== Durability ==========

    /// Write the current entries to the backing file. A no-op for in-memory caches.
    pub async fn persist(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;

        let catalogs: BTreeMap<String, CacheEntry> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let file = CacheFile::new(Utc::now(), catalogs).with_last_aggregated(self.last_aggregated());
        write_cache_file(path, &file).await?;
        tracing::debug!(path = %path.display(), "persisted aggregation cache");
        Ok(())
    }
}

impl Default for AggregationCache {
    fn default() -> Self {
        Self::in_memory(CachePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn dataset(id: &str) -> Dataset {
        Dataset {
            identifier: id.to_string(),
            dataset_url: format!("https://a.example/catalog/ds/{id}.ttl#it"),
            source_catalog_url: "https://a.example/catalog/cat.ttl#it".into(),
            ..Default::default()
        }
    }

    const CAT: &str = "https://a.example/catalog/cat.ttl#it";

    #[test]
    fn test_put_keeps_newer_entry() {
        let cache = AggregationCache::default();
        let now = Utc::now();
        assert!(cache.put_at(CAT, vec![dataset("new")], now));
        assert!(!cache.put_at(CAT, vec![dataset("old")], now - TimeDelta::minutes(1)));
        assert_eq!(cache.peek(CAT).unwrap().datasets, vec![dataset("new")]);

        assert!(cache.put_at(CAT, vec![dataset("newer")], now + TimeDelta::seconds(1)));
        assert_eq!(cache.peek(CAT).unwrap().datasets[0].identifier, "newer");
    }

    #[test]
    fn test_expired_entries_read_as_absent() {
        let cache = AggregationCache::default();
        let now = Utc::now();
        cache.put_at(CAT, vec![dataset("d1")], now - TimeDelta::days(31));

        assert!(cache.peek(CAT).is_some());
        assert!(cache.get_at(CAT, now).is_none());
        assert!(cache.peek(CAT).is_none());
    }

    #[test]
    fn test_policy_predicates() {
        let cache = AggregationCache::default();
        let now = Utc::now();
        let entry = |age: TimeDelta| CacheEntry {
            datasets: vec![],
            last_success: now - age,
        };
        assert!(cache.is_fresh_enough(&entry(TimeDelta::minutes(5)), now));
        assert!(!cache.is_fresh_enough(&entry(TimeDelta::minutes(15)), now));
        assert!(cache.is_stale(&entry(TimeDelta::days(20)), now));
        assert!(!cache.is_stale(&entry(TimeDelta::days(2)), now));
        assert!(cache.is_expired(&entry(TimeDelta::days(31)), now));
    }

    #[test]
    fn test_prune_and_clear() {
        let cache = AggregationCache::default();
        let now = Utc::now();
        cache.put_at("https://a.example/cat.ttl#it", vec![], now - TimeDelta::days(40));
        cache.put_at("https://b.example/cat.ttl#it", vec![], now);
        assert_eq!(cache.prune(now), 1);
        assert_eq!(cache.len(), 1);

        cache.mark_aggregated(now);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.last_aggregated(), None);
    }

    #[tokio::test]
    async fn test_persist_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let now = Utc::now();

        let cache = AggregationCache::open(&path, CachePolicy::default()).await;
        assert!(cache.is_empty());
        cache.put_at(CAT, vec![dataset("d1")], now);
        cache.mark_aggregated(now);
        cache.persist().await.unwrap();

        let reopened = AggregationCache::open(&path, CachePolicy::default()).await;
        assert_eq!(reopened.peek(CAT), cache.peek(CAT));
        assert_eq!(reopened.last_aggregated(), Some(now));
    }

    #[tokio::test]
    async fn test_invalidation_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let now = Utc::now();
        let other = "https://b.example/catalog/cat.ttl#it";

        let cache = AggregationCache::open(&path, CachePolicy::default()).await;
        cache.put_at(CAT, vec![dataset("d1")], now);
        cache.put_at(other, vec![], now);
        cache.mark_aggregated(now);
        cache.persist().await.unwrap();

        let writer_side = AggregationCache::open(&path, CachePolicy::default()).await;
        assert!(writer_side.invalidate(CAT));
        assert_eq!(writer_side.last_aggregated(), None);
        writer_side.persist().await.unwrap();

        let reopened = AggregationCache::open(&path, CachePolicy::default()).await;
        assert!(reopened.peek(CAT).is_none());
        assert!(reopened.peek(other).is_some());
        assert_eq!(reopened.last_aggregated(), None);
    }

    #[tokio::test]
    async fn test_in_memory_persist_is_noop() {
        let cache = AggregationCache::default();
        cache.put(CAT, vec![dataset("d1")]);
        cache.persist().await.unwrap();
        assert!(cache.path().is_none());
    }
}
