//! The owner-scoped catalog resource: a title, a timestamp and member references.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{document_url, primary_resource, relative_to, resolve_against};
use crate::rdf::{Graph, Term};
use crate::vocab::{dcat, dcterms, rdf};

/// Title written when the owner never chose one.
pub const DEFAULT_CATALOG_TITLE: &str = "Solid Dataspace Catalog";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Resource URL, usually `<doc>#it`
    pub url: String,
    pub title: String,
    pub description: String,
    pub modified: Option<DateTime<Utc>>,
    pub contact_point: Option<String>,
    /// Absolute member dataset URLs
    pub dataset_urls: BTreeSet<String>,
}

impl Catalog {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: DEFAULT_CATALOG_TITLE.to_string(),
            ..Default::default()
        }
    }

    pub fn document_url(&self) -> String {
        document_url(&self.url)
    }

    /// Read the catalog resource out of its document.
    ///
    /// Looks for `url` itself, then `<doc>#it`, then the first `dcat:Catalog`.
    /// Returns `None` when the document holds no catalog at all.
    pub fn from_graph(graph: &Graph, url: &str) -> Option<Self> {
        let doc = document_url(url);
        let subject = [url.to_string(), primary_resource(&doc)]
            .into_iter()
            .find(|candidate| graph.has_subject(candidate))
            .or_else(|| {
                graph
                    .subjects_of_type(&[dcat::CATALOG])
                    .first()
                    .map(|s| s.to_string())
            })?;

        let dataset_urls = graph
            .iris(&subject, dcat::DATASET_PROP)
            .into_iter()
            .filter_map(|reference| resolve_against(&doc, reference))
            .collect();

        Some(Self {
            title: graph
                .first_literal(&subject, dcterms::TITLE)
                .unwrap_or_default()
                .to_string(),
            description: graph
                .first_literal(&subject, dcterms::DESCRIPTION)
                .unwrap_or_default()
                .to_string(),
            modified: graph.first_datetime(&subject, dcterms::MODIFIED),
            contact_point: graph
                .first_iri(&subject, dcat::CONTACT_POINT)
                .map(str::to_string),
            dataset_urls,
            url: subject,
        })
    }

    /// Catalog document contents. Members under the catalog's directory are
    /// written as relative references.
    pub fn to_graph(&self) -> Graph {
        let mut graph = Graph::new();
        graph
            .add_iri(&self.url, rdf::TYPE, dcat::CATALOG)
            .add_literal(&self.url, dcterms::TITLE, &self.title)
            .add_literal(&self.url, dcterms::DESCRIPTION, &self.description);
        if let Some(contact) = &self.contact_point {
            graph.add_iri(&self.url, dcat::CONTACT_POINT, contact);
        }
        if let Some(modified) = self.modified {
            graph.add(&self.url, dcterms::MODIFIED, Term::datetime(modified));
        }
        for dataset in &self.dataset_urls {
            graph.add_iri(
                &self.url,
                dcat::DATASET_PROP,
                &relative_to(&self.url, dataset),
            );
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::turtle;

    #[test]
    fn test_members_written_relative_and_read_absolute() {
        let mut catalog = Catalog::new("https://a.example/catalog/cat.ttl#it");
        catalog
            .dataset_urls
            .insert("https://a.example/catalog/ds/d1.ttl#it".into());
        catalog
            .dataset_urls
            .insert("https://b.example/catalog/ds/x.ttl#it".into());

        let graph = catalog.to_graph();
        assert!(graph
            .iris(&catalog.url, dcat::DATASET_PROP)
            .contains(&"ds/d1.ttl#it"));

        let read = Catalog::from_graph(&graph, &catalog.url).unwrap();
        assert_eq!(read.dataset_urls, catalog.dataset_urls);
    }

    #[test]
    fn test_falls_back_to_first_typed_catalog() {
        let body = r#"
@prefix dcat: <http://www.w3.org/ns/dcat#>.
<#main> a dcat:Catalog ; dcat:dataset <d1.ttl#it> .
"#;
        let graph = turtle::parse("https://a.example/cat.ttl", body).unwrap();
        let catalog = Catalog::from_graph(&graph, "https://a.example/cat.ttl#it").unwrap();
        assert_eq!(catalog.url, "https://a.example/cat.ttl#main");
        assert!(catalog
            .dataset_urls
            .contains("https://a.example/d1.ttl#it"));
    }

    #[test]
    fn test_document_without_catalog() {
        let graph = Graph::new();
        assert!(Catalog::from_graph(&graph, "https://a.example/cat.ttl#it").is_none());
    }
}
