//! Catalog loading: one catalog document plus every dataset document it lists.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::catalog::Catalog;
use crate::dataset::{Dataset, DatasetKind};
use crate::error::{LoadError, StoreError};
use crate::identity::{document_url, primary_resource, resolve_against};
use crate::rdf::Graph;
use crate::store::DocumentStore;
use crate::vocab::{dcat, dcterms, foaf, vcard};

#[derive(Debug, Clone)]
pub struct CatalogLoader {
    store: Arc<dyn DocumentStore>,
    max_concurrent: usize,
}

impl CatalogLoader {
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

    /// Load every dataset listed by the catalog at `catalog_url`.
    ///
    /// Only the catalog document itself can fail the load, by being unreadable or
    /// by not describing the catalog. Member documents that are missing or
    /// hold no dataset are skipped.
    pub async fn load_catalog(&self, catalog_url: &str) -> Result<Vec<Dataset>, LoadError> {
        let doc = document_url(catalog_url);
        let graph = self
            .store
            .fetch_document(&doc)
            .await
            .map_err(|source| LoadError::Catalog {
                catalog_url: catalog_url.to_string(),
                source,
            })?;

        // A readable document without the catalog resource is as unusable as a
        // failed fetch; reporting it keeps the cached copy in play.
        let catalog = Catalog::from_graph(&graph, catalog_url).ok_or_else(|| LoadError::Catalog {
            catalog_url: catalog_url.to_string(),
            source: StoreError::parse(&doc, "document holds no catalog resource"),
        })?;

        let datasets: Vec<Option<Dataset>> = stream::iter(&catalog.dataset_urls)
            .map(|dataset_url| self.load_dataset(dataset_url, catalog_url))
            .buffered(self.max_concurrent)
            .collect()
            .await;
        let datasets: Vec<Dataset> = datasets.into_iter().flatten().collect();

        tracing::debug!(
            catalog_url,
            listed = catalog.dataset_urls.len(),
            loaded = datasets.len(),
            "loaded catalog"
        );
        Ok(datasets)
    }

    async fn load_dataset(&self, dataset_url: &str, catalog_url: &str) -> Option<Dataset> {
        let graph = match self.store.fetch_document(&document_url(dataset_url)).await {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!(catalog_url, dataset_url, error = %e, "skipping dataset");
                return None;
            }
        };
        let parsed = parse_dataset(&graph, dataset_url, catalog_url);
        if parsed.is_none() {
            tracing::warn!(catalog_url, dataset_url, "dataset document is empty, skipping");
        }
        parsed
    }
}

/// Normalize a dataset document into a [`Dataset`].
///
/// Returns `None` only when the document has no statements to read.
pub fn parse_dataset(graph: &Graph, dataset_url: &str, catalog_url: &str) -> Option<Dataset> {
    let doc = document_url(dataset_url);
    let subject = dataset_subject(graph, dataset_url)?;
    let subject = subject.as_str();

    let identifier = graph
        .first_literal(subject, dcterms::IDENTIFIER)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(dataset_url)
        .to_string();

    let literal = |predicate: &str| {
        graph
            .first_literal(subject, predicate)
            .unwrap_or_default()
            .to_string()
    };

    let (access_url_data, file_format, second_download) = distributions(graph, subject, &doc);
    let access_url_model = graph
        .first_iri(subject, dcterms::CONFORMS_TO)
        .or_else(|| graph.first_iri(subject, dcat::LEGACY_CONFORMS_TO))
        .and_then(|iri| resolve_against(&doc, iri))
        .or(second_download)
        .unwrap_or_default();

    let kind = if graph.has_type(subject, dcat::DATASET_SERIES) {
        let member_urls: BTreeSet<String> = [dcterms::HAS_PART, dcat::SERIES_MEMBER]
            .into_iter()
            .flat_map(|predicate| graph.iris(subject, predicate))
            .filter_map(|iri| resolve_against(&doc, iri))
            .collect();
        DatasetKind::Series { member_urls }
    } else {
        DatasetKind::Dataset
    };

    Some(Dataset {
        identifier,
        dataset_url: dataset_url.to_string(),
        title: literal(dcterms::TITLE),
        description: literal(dcterms::DESCRIPTION),
        theme: graph
            .first_value(subject, dcat::THEME)
            .unwrap_or_default()
            .to_string(),
        issued: graph.first_datetime(subject, dcterms::ISSUED),
        modified: graph.first_datetime(subject, dcterms::MODIFIED),
        publisher: publisher(graph, subject),
        contact_email: contact_email(graph, subject),
        access_url_data,
        access_url_model,
        file_format,
        is_public: graph
            .first_literal(subject, dcterms::ACCESS_RIGHTS)
            .is_some_and(|rights| rights.trim().eq_ignore_ascii_case("public")),
        owner_identity: graph
            .first_iri(subject, dcterms::CREATOR)
            .unwrap_or_default()
            .to_string(),
        source_catalog_url: catalog_url.to_string(),
        kind,
        last_seen_at: None,
        is_stale: false,
    })
}

/// The requested resource, `<doc>#it`, the first dataset-typed subject, or any subject.
fn dataset_subject(graph: &Graph, dataset_url: &str) -> Option<String> {
    [dataset_url.to_string(), primary_resource(dataset_url)]
        .into_iter()
        .find(|candidate| graph.has_subject(candidate))
        .or_else(|| {
            graph
                .subjects_of_type(&[dcat::DATASET, dcat::DATASET_SERIES])
                .first()
                .map(|s| s.to_string())
        })
        .or_else(|| graph.subjects().first().map(|s| s.to_string()))
}

/// Data download URL with its media type, plus a second download URL if one exists.
fn distributions(graph: &Graph, subject: &str, doc: &str) -> (String, String, Option<String>) {
    let mut downloads = graph
        .objects(subject, dcat::DISTRIBUTION_PROP)
        .into_iter()
        .filter_map(|term| term.node_key())
        .filter_map(|node| {
            let node = if node.starts_with("_:") {
                node
            } else {
                resolve_against(doc, &node)?
            };
            let download = graph
                .first_iri(&node, dcat::DOWNLOAD_URL)
                .or_else(|| graph.first_iri(&node, dcat::ACCESS_URL))
                .and_then(|iri| resolve_against(doc, iri))?;
            let media_type = graph
                .first_value(&node, dcat::MEDIA_TYPE)
                .or_else(|| graph.first_value(&node, dcterms::FORMAT))
                .unwrap_or_default()
                .to_string();
            Some((download, media_type))
        });

    match downloads.next() {
        Some((data, format)) => (data, format, downloads.next().map(|(url, _)| url)),
        None => (String::new(), String::new(), None),
    }
}

fn publisher(graph: &Graph, subject: &str) -> String {
    if let Some(name) = graph.first_literal(subject, dcterms::PUBLISHER) {
        return name.to_string();
    }
    graph
        .first_node(subject, dcterms::PUBLISHER)
        .and_then(|node| {
            [foaf::NAME, vcard::FN, dcterms::TITLE]
                .into_iter()
                .find_map(|predicate| graph.first_literal(&node, predicate))
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn contact_email(graph: &Graph, subject: &str) -> String {
    if let Some(literal) = graph.first_literal(subject, dcat::CONTACT_POINT) {
        return strip_mailto(literal);
    }
    let Some(node) = graph.first_node(subject, dcat::CONTACT_POINT) else {
        return String::new();
    };
    [vcard::HAS_EMAIL, vcard::VALUE, foaf::MBOX]
        .into_iter()
        .find_map(|predicate| graph.first_value(&node, predicate))
        .map(strip_mailto)
        .or_else(|| graph.first_literal(&node, vcard::FN).map(str::to_string))
        .unwrap_or_default()
}

fn strip_mailto(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix("mailto:")
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::rdf::turtle;
    use crate::store::MemoryStore;
    use crate::test_helpers::{catalog_turtle, dataset_turtle};
    use pretty_assertions::assert_eq;

    const DOC: &str = "https://a.example/catalog/ds/weather.ttl";
    const CAT: &str = "https://a.example/catalog/cat.ttl#it";

    #[test]
    fn test_parse_full_dataset_document() {
        let body = r#"
@prefix dcat: <http://www.w3.org/ns/dcat#>.
@prefix dcterms: <http://purl.org/dc/terms/>.
@prefix vcard: <http://www.w3.org/2006/vcard/ns#>.
@prefix xsd: <http://www.w3.org/2001/XMLSchema#>.

<#it> a dcat:Dataset ;
  dcterms:identifier "weather" ;
  dcterms:title "Weather"@en ;
  dcterms:modified "2024-02-01T00:00:00Z"^^xsd:dateTime ;
  dcterms:publisher "TMDT" ;
  dcterms:creator <https://a.example/profile/card#me> ;
  dcterms:accessRights "Public" ;
  dcterms:conformsTo <model.ttl> ;
  dcat:theme <https://w3id.org/solid-dataspace-manager/theme/climate> ;
  dcat:contactPoint <#contact> ;
  dcat:distribution <#dist> .
<#contact> vcard:fn "Ops" ; vcard:hasEmail <mailto:ops@a.example> .
<#dist> a dcat:Distribution ; dcat:downloadURL <../../data/weather.csv> ; dcat:mediaType "text/csv" .
"#;
        let graph = turtle::parse(DOC, body).unwrap();
        let dataset = parse_dataset(&graph, &format!("{DOC}#it"), CAT).unwrap();

        assert_eq!(dataset.identifier, "weather");
        assert_eq!(dataset.title, "Weather");
        assert_eq!(dataset.publisher, "TMDT");
        assert_eq!(dataset.contact_email, "ops@a.example");
        assert_eq!(dataset.access_url_data, "https://a.example/data/weather.csv");
        assert_eq!(dataset.file_format, "text/csv");
        assert_eq!(
            dataset.access_url_model,
            "https://a.example/catalog/ds/model.ttl"
        );
        assert_eq!(
            dataset.theme,
            "https://w3id.org/solid-dataspace-manager/theme/climate"
        );
        assert!(dataset.is_public);
        assert_eq!(dataset.owner_identity, "https://a.example/profile/card#me");
        assert_eq!(dataset.source_catalog_url, CAT);
        assert!(dataset.modified.is_some());
        assert!(!dataset.is_series());
    }

    #[test]
    fn test_identifier_defaults_to_dataset_url() {
        let graph = turtle::parse(DOC, "<#it> <http://purl.org/dc/terms/title> \"x\" .").unwrap();
        let dataset = parse_dataset(&graph, &format!("{DOC}#it"), CAT).unwrap();
        assert_eq!(dataset.identifier, format!("{DOC}#it"));
        assert!(!dataset.is_public);
    }

    #[test]
    fn test_series_members_resolved_and_sorted() {
        let body = r#"
@prefix dcat: <http://www.w3.org/ns/dcat#>.
@prefix dcterms: <http://purl.org/dc/terms/>.
<#it> a dcat:DatasetSeries ;
  dcterms:hasPart <../ds/b.ttl#it>, <../ds/a.ttl#it> ;
  dcat:seriesMember <../ds/a.ttl#it> .
"#;
        let doc = "https://a.example/catalog/series/s1.ttl";
        let graph = turtle::parse(doc, body).unwrap();
        let dataset = parse_dataset(&graph, &format!("{doc}#it"), CAT).unwrap();
        let members: Vec<&String> = dataset.member_urls().unwrap().iter().collect();
        assert_eq!(
            members,
            vec![
                "https://a.example/catalog/ds/a.ttl#it",
                "https://a.example/catalog/ds/b.ttl#it"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_member_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_turtle(
                "https://a.example/catalog/cat.ttl",
                &catalog_turtle(&["ds/d1.ttl#it", "ds/gone.ttl#it", "ds/bad.ttl#it"]),
            )
            .unwrap();
        store
            .insert_turtle(
                "https://a.example/catalog/ds/d1.ttl",
                &dataset_turtle("d1", "2024-01-01T00:00:00Z"),
            )
            .unwrap();
        store.fail_with(
            "https://a.example/catalog/ds/bad.ttl",
            StoreError::parse("https://a.example/catalog/ds/bad.ttl", "unexpected end"),
        );

        let loader = CatalogLoader::new(store.clone());
        let datasets = loader.load_catalog(CAT).await.unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].identifier, "d1");
    }

    #[tokio::test]
    async fn test_document_without_catalog_is_load_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_turtle(
                "https://a.example/catalog/cat.ttl",
                "<#other> <http://purl.org/dc/terms/title> \"Not a catalog\" .",
            )
            .unwrap();

        let err = CatalogLoader::new(store)
            .load_catalog(CAT)
            .await
            .unwrap_err();
        assert_eq!(err.catalog_url(), CAT);
        assert!(matches!(err.store_error(), StoreError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_load_error() {
        let store = Arc::new(MemoryStore::new());
        let loader = CatalogLoader::new(store);
        let err = loader.load_catalog(CAT).await.unwrap_err();
        assert_eq!(err.catalog_url(), CAT);
        assert!(matches!(
            err,
            LoadError::Catalog {
                source: StoreError::NotFound { .. },
                ..
            }
        ));
    }
}
