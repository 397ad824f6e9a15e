//! Registry resolution: which owners take part in aggregation.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::identity::{primary_resource, resolve_against, WebId};
use crate::rdf::Graph;
use crate::store::DocumentStore;
use crate::vocab::{foaf, ldp};

/// Public registry container of the shared dataspace.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://tmdt-solid-community-server.de/semanticdatacatalog/public/registry/";

#[derive(Debug, Clone)]
pub struct RegistryResolver {
    store: Arc<dyn DocumentStore>,
    registry_url: Option<String>,
    max_concurrent: usize,
}

impl RegistryResolver {
    pub fn new(store: Arc<dyn DocumentStore>, registry_url: Option<String>) -> Self {
        Self {
            store,
            registry_url,
            max_concurrent: crate::DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn registry_url(&self) -> Option<&str> {
        self.registry_url.as_deref()
    }

    /// Participating owners: `self_id` first, then every registered member in order.
    ///
    /// Never fails. An unreachable registry yields `self_id` alone.
    pub async fn resolve_members(&self, self_id: &WebId) -> Vec<WebId> {
        let mut members = BTreeSet::new();
        if let Some(registry_url) = &self.registry_url {
            match self.store.fetch_document(registry_url).await {
                Ok(graph) => {
                    members = self.collect_members(registry_url, &graph).await;
                }
                Err(e) => {
                    tracing::warn!(
                        registry = %registry_url,
                        error = %e,
                        "registry unavailable, aggregating own catalog only"
                    );
                }
            }
        }
        members.remove(self_id);

        let mut resolved = Vec::with_capacity(members.len() + 1);
        resolved.push(self_id.clone());
        resolved.extend(members);
        tracing::debug!(owner = %self_id, members = resolved.len(), "resolved registry");
        resolved
    }

    /// Members listed on the registry document plus those in its contained entries.
    async fn collect_members(&self, registry_url: &str, graph: &Graph) -> BTreeSet<WebId> {
        let mut members: BTreeSet<WebId> = graph
            .objects_any(foaf::MEMBER)
            .into_iter()
            .filter_map(|term| term.as_iri())
            .filter_map(|iri| parse_member(registry_url, iri))
            .collect();

        let entries: Vec<String> = graph
            .objects_any(ldp::CONTAINS)
            .into_iter()
            .filter_map(|term| term.as_iri())
            .filter_map(|iri| resolve_against(registry_url, iri))
            .collect();

        let from_entries: Vec<Option<WebId>> = stream::iter(entries)
            .map(|entry| async move { self.read_entry(&entry).await })
            .buffered(self.max_concurrent)
            .collect()
            .await;
        members.extend(from_entries.into_iter().flatten());
        members
    }

    /// One registry entry document: its `foaf:member` on `#it`, else on anything.
    async fn read_entry(&self, entry_url: &str) -> Option<WebId> {
        let graph = match self.store.fetch_document(entry_url).await {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!(entry = %entry_url, error = %e, "skipping registry entry");
                return None;
            }
        };
        let member = graph
            .first_iri(&primary_resource(entry_url), foaf::MEMBER)
            .or_else(|| {
                graph
                    .objects_any(foaf::MEMBER)
                    .into_iter()
                    .find_map(|term| term.as_iri())
            });
        match member {
            Some(iri) => parse_member(entry_url, iri),
            None => {
                tracing::warn!(entry = %entry_url, "registry entry names no member");
                None
            }
        }
    }
}

fn parse_member(base: &str, iri: &str) -> Option<WebId> {
    let absolute = resolve_against(base, iri)?;
    match WebId::parse(&absolute) {
        Ok(web_id) => Some(web_id),
        Err(e) => {
            tracing::warn!(member = %absolute, error = %e, "ignoring malformed registry member");
            None
        }
    }
}
