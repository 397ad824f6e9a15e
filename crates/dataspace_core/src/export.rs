//! One downloadable catalog document for an aggregated view.

use chrono::{DateTime, Utc};

use crate::dataset::Dataset;
use crate::rdf::{turtle, Graph, Term};
use crate::vocab::{dcat, dcterms, rdf};

pub const EXPORT_TITLE: &str = "Aggregated Solid Dataspace Catalog";

/// Resource the export describes, relative to wherever the file is published.
pub const EXPORT_RESOURCE: &str = "#it";

/// Catalog listing every dataset by its own URL, with a short summary of each.
///
/// Datasets without a URL cannot be referenced and are left out.
pub fn export_catalog(datasets: &[Dataset], catalog: &str, now: DateTime<Utc>) -> Graph {
    let mut graph = Graph::new();
    graph
        .add_iri(catalog, rdf::TYPE, dcat::CATALOG)
        .add_literal(catalog, dcterms::TITLE, EXPORT_TITLE)
        .add(catalog, dcterms::MODIFIED, Term::datetime(now));

    for dataset in datasets.iter().filter(|d| !d.dataset_url.is_empty()) {
        let url = dataset.dataset_url.as_str();
        let class = if dataset.is_series() {
            dcat::DATASET_SERIES
        } else {
            dcat::DATASET
        };
        graph
            .add_iri(catalog, dcat::DATASET_PROP, url)
            .add_iri(url, rdf::TYPE, class)
            .add_literal(url, dcterms::IDENTIFIER, &dataset.identifier)
            .add_literal(url, dcterms::TITLE, &dataset.title);
        if let Some(modified) = dataset.modified {
            graph.add(url, dcterms::MODIFIED, Term::datetime(modified));
        }
    }
    graph
}

/// [`export_catalog`] as Turtle.
pub fn export_turtle(datasets: &[Dataset], catalog: &str, now: DateTime<Utc>) -> std::io::Result<String> {
    turtle::serialize(&export_catalog(datasets, catalog, now))
}
