//! In-memory document store
//!
//! Holds documents as graphs keyed by document URL. Failures and latency can be
//! injected per operation and URL, and every fetch is counted, which is what the
//! cache and fallback tests lean on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use super::{DocumentStore, StoreOp};
use crate::error::{StoreError, StoreResult};
use crate::identity::document_url;
use crate::rdf::{turtle, Graph};
use crate::vocab::{ldp, rdf};

#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Documents: document url -> statements
    documents: DashMap<String, Graph>,

    /// Explicitly created containers (slash-terminated)
    containers: DashSet<String>,

    /// Resources granted anonymous read
    public: DashSet<String>,

    failures: DashMap<(StoreOp, String), StoreError>,
    delays: DashMap<(StoreOp, String), Duration>,

    fetch_counts: DashMap<String, usize>,
    total_fetches: AtomicUsize,
    total_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Seeding & inspection ==========

    /// Put a document in place without counting it as a write.
    pub fn insert_document(&self, url: &str, graph: Graph) {
        self.documents.insert(document_url(url), graph);
    }

    /// Parse Turtle against the document URL and store the result.
    pub fn insert_turtle(&self, url: &str, body: &str) -> StoreResult<()> {
        let doc = document_url(url);
        let graph = turtle::parse(&doc, body)?;
        self.documents.insert(doc, graph);
        Ok(())
    }

    /// Copy of a stored document, if present.
    pub fn document(&self, url: &str) -> Option<Graph> {
        self.documents
            .get(&document_url(url))
            .map(|entry| entry.value().clone())
    }

    pub fn contains_document(&self, url: &str) -> bool {
        self.documents.contains_key(&document_url(url))
    }

    pub fn is_container(&self, url: &str) -> bool {
        self.containers.contains(&container_key(url))
    }

    pub fn is_public(&self, url: &str) -> bool {
        self.public.contains(&document_url(url))
    }

    /// Fetches issued for one document, failed ones included.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetch_counts
            .get(&document_url(url))
            .map(|count| *count)
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.total_fetches.load(Ordering::SeqCst)
    }

    pub fn total_writes(&self) -> usize {
        self.total_writes.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.fetch_counts.clear();
        self.total_fetches.store(0, Ordering::SeqCst);
        self.total_writes.store(0, Ordering::SeqCst);
    }

    // ========== Fault injection ==========

    /// Make every fetch of `url` fail with `error`.
    pub fn fail_with(&self, url: &str, error: StoreError) {
        self.fail_op(StoreOp::Fetch, url, error);
    }

    pub fn fail_op(&self, op: StoreOp, url: &str, error: StoreError) {
        self.failures.insert((op, document_url(url)), error);
    }

    pub fn clear_failure(&self, op: StoreOp, url: &str) {
        self.failures.remove(&(op, document_url(url)));
    }

    /// Sleep for `latency` before serving `op` on `url`.
    pub fn delay(&self, op: StoreOp, url: &str, latency: Duration) {
        self.delays.insert((op, document_url(url)), latency);
    }

    async fn before(&self, op: StoreOp, doc: &str) -> StoreResult<()> {
        let key = (op, doc.to_string());
        // Copy out before sleeping so no shard lock is held across the await.
        let latency = self.delays.get(&key).map(|d| *d);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.failures.get(&key) {
            Some(error) => Err(error.value().clone()),
            None => Ok(()),
        }
    }

    /// `ldp:contains` statements for the direct children of a container.
    fn container_listing(&self, container: &str) -> Graph {
        let mut children: Vec<String> = Vec::new();
        let stored = self
            .documents
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.containers.iter().map(|c| c.key().clone()));
        for url in stored {
            let Some(rest) = url.strip_prefix(container) else {
                continue;
            };
            let rest = rest.strip_suffix('/').unwrap_or(rest);
            if rest.is_empty() || rest.contains('/') {
                continue;
            }
            if !children.contains(&url) {
                children.push(url);
            }
        }
        children.sort();

        let mut graph = Graph::new();
        graph.add_iri(container, rdf::TYPE, ldp::BASIC_CONTAINER);
        for child in &children {
            graph.add_iri(container, ldp::CONTAINS, child);
        }
        graph
    }
}

fn container_key(url: &str) -> String {
    let doc = document_url(url);
    if doc.ends_with('/') {
        doc
    } else {
        format!("{doc}/")
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_document(&self, url: &str) -> StoreResult<Graph> {
        let doc = document_url(url);
        *self.fetch_counts.entry(doc.clone()).or_insert(0) += 1;
        self.total_fetches.fetch_add(1, Ordering::SeqCst);
        self.before(StoreOp::Fetch, &doc).await?;

        let stored = self.documents.get(&doc).map(|g| g.value().clone());
        if doc.ends_with('/') {
            // Containers exist once created or once anything is stored below them.
            let mut listing = self.container_listing(&doc);
            let has_children = listing.len() > 1;
            if stored.is_some() || has_children || self.containers.contains(&doc) {
                if let Some(graph) = stored {
                    listing.extend(graph);
                }
                return Ok(listing);
            }
        }
        stored.ok_or_else(|| StoreError::not_found(&doc))
    }

    async fn write_document(&self, url: &str, graph: &Graph) -> StoreResult<()> {
        let doc = document_url(url);
        self.before(StoreOp::Write, &doc).await?;
        self.total_writes.fetch_add(1, Ordering::SeqCst);
        self.documents.insert(doc, graph.clone());
        Ok(())
    }

    async fn create_container(&self, url: &str) -> StoreResult<()> {
        let key = container_key(url);
        self.before(StoreOp::CreateContainer, &key).await?;
        if !self.containers.insert(key.clone()) {
            return Err(StoreError::already_exists(key));
        }
        Ok(())
    }

    async fn set_public_read(&self, url: &str) -> StoreResult<()> {
        let doc = document_url(url);
        self.before(StoreOp::SetPublicRead, &doc).await?;
        self.public.insert(doc);
        Ok(())
    }

    async fn delete_document(&self, url: &str) -> StoreResult<()> {
        let doc = document_url(url);
        self.before(StoreOp::Delete, &doc).await?;
        if self.documents.remove(&doc).is_none() {
            return Err(StoreError::not_found(doc));
        }
        self.public.remove(&doc);
        Ok(())
    }
}
