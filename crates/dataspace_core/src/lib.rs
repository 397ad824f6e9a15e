//! Dataspace Core - catalog aggregation for Solid pods
//!
//! Discovers participating owners through a shared registry, locates each
//! owner's catalog through their public type index, loads and merges every
//! catalog into one view, and keeps that view usable through a TTL-governed
//! cache when pods are unreachable. The write side maintains an owner's own
//! catalog, dataset and audit-record documents.

pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod export;
pub mod identity;
pub mod loader;
pub mod locator;
pub mod rdf;
pub mod registry;
pub mod search;
pub mod store;
pub mod vocab;
pub mod writer;

#[cfg(test)]
pub mod test_helpers;

/// Default cap on outstanding fetches at each fan-out stage.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 24;

pub use aggregator::{merge_datasets, Aggregation, Aggregator, CatalogSource, CatalogStatus};
pub use cache::{AggregationCache, CacheEntry, CachePolicy, Freshness};
pub use catalog::Catalog;
pub use config::DataspaceConfig;
pub use context::DataspaceContext;
pub use dataset::{CreatedDataset, Dataset, DatasetInput, DatasetKind};
pub use error::{CoreError, LoadError, Result, StoreError, WriteError};
pub use identity::WebId;
pub use loader::CatalogLoader;
pub use locator::CatalogLocator;
pub use registry::RegistryResolver;
pub use search::DatasetFilter;
#[cfg(feature = "http")]
pub use store::HttpStore;
pub use store::{DocumentStore, MemoryStore, StoreOp, TimeoutStore};
pub use writer::CatalogWriter;
