//! DocumentStore trait - the seam between the engine and pod storage
//!
//! Everything that reads or writes pod documents goes through this trait, so the
//! aggregation and write paths run unchanged against real pods ([`HttpStore`]) and
//! against the in-memory store the tests use ([`MemoryStore`]).

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::rdf::Graph;

#[cfg(feature = "http")]
mod http;
mod memory;

#[cfg(feature = "http")]
pub use http::HttpStore;
pub use memory::MemoryStore;

/// Operations a store performs, used to target injected failures and delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Fetch,
    Write,
    CreateContainer,
    SetPublicRead,
    Delete,
}

/// Read and write RDF documents addressed by URL.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    // ========== Reads ==========

    /// Fetch a document as a set of statements.
    ///
    /// `url` may carry a fragment; the whole document is returned regardless.
    async fn fetch_document(&self, url: &str) -> StoreResult<Graph>;

    // ========== Writes ==========

    /// Replace the document at `url` with `graph`.
    async fn write_document(&self, url: &str, graph: &Graph) -> StoreResult<()>;

    /// Create a container. Returns [`StoreError::AlreadyExists`] if it is already there.
    async fn create_container(&self, url: &str) -> StoreResult<()>;

    /// Grant anonymous read access to a document or container.
    async fn set_public_read(&self, url: &str) -> StoreResult<()>;

    /// Delete a document.
    async fn delete_document(&self, url: &str) -> StoreResult<()>;
}

/// Bounds every call on an inner store by a fixed timeout.
///
/// A call that runs past the limit is dropped and reported as
/// [`StoreError::Timeout`]; nothing it had received is kept.
#[derive(Debug, Clone)]
pub struct TimeoutStore {
    inner: Arc<dyn DocumentStore>,
    limit: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn DocumentStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    async fn bounded<T>(
        &self,
        url: &str,
        fut: impl std::future::Future<Output = StoreResult<T>> + Send,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(url, limit_ms = self.limit.as_millis() as u64, "store call timed out");
                Err(StoreError::Timeout {
                    url: url.to_string(),
                    secs: self.limit.as_secs(),
                })
            }
        }
    }
}

#[async_trait]
impl DocumentStore for TimeoutStore {
    async fn fetch_document(&self, url: &str) -> StoreResult<Graph> {
        self.bounded(url, self.inner.fetch_document(url)).await
    }

    async fn write_document(&self, url: &str, graph: &Graph) -> StoreResult<()> {
        self.bounded(url, self.inner.write_document(url, graph)).await
    }

    async fn create_container(&self, url: &str) -> StoreResult<()> {
        self.bounded(url, self.inner.create_container(url)).await
    }

    async fn set_public_read(&self, url: &str) -> StoreResult<()> {
        self.bounded(url, self.inner.set_public_read(url)).await
    }

    async fn delete_document(&self, url: &str) -> StoreResult<()> {
        self.bounded(url, self.inner.delete_document(url)).await
    }
}
