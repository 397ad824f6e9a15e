//! Shared pods-in-memory fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use dataspace_core::{AggregationCache, Aggregator, CachePolicy, MemoryStore, WebId};

pub const REGISTRY: &str = "https://registry.example/registry/";

pub const ALICE: &str = "https://alice.example/profile/card#me";
pub const BOB: &str = "https://bob.example/profile/card#me";

pub fn web_id(value: &str) -> WebId {
    WebId::parse(value).expect("test WebID")
}

/// Default catalog resource for an owner.
pub fn catalog_of(owner: &str) -> String {
    web_id(owner).default_catalog_url()
}

/// Catalog document URL for an owner.
pub fn catalog_doc_of(owner: &str) -> String {
    web_id(owner).default_catalog_doc()
}

pub fn dataset_doc(owner: &str, identifier: &str) -> String {
    format!("{}catalog/ds/{identifier}.ttl", web_id(owner).pod_root())
}

/// List `owners` in the registry container, one entry document each.
pub fn register(store: &MemoryStore, owners: &[&str]) {
    for (i, owner) in owners.iter().enumerate() {
        store
            .insert_turtle(
                &format!("{REGISTRY}member-{i}.ttl"),
                &format!("<#it> <http://xmlns.com/foaf/0.1/member> <{owner}> ."),
            )
            .expect("registry entry");
    }
}

/// Publish a catalog at the owner's default location with one document per
/// `(identifier, modified)` dataset.
pub fn publish(store: &MemoryStore, owner: &str, datasets: &[(&str, &str)]) {
    let members: Vec<String> = datasets
        .iter()
        .map(|(id, _)| format!("ds/{id}.ttl#it"))
        .collect();
    let refs: Vec<&str> = members.iter().map(String::as_str).collect();
    store
        .insert_turtle(&catalog_doc_of(owner), &catalog_turtle(&refs))
        .expect("catalog");
    for (id, modified) in datasets {
        store
            .insert_turtle(&dataset_doc(owner, id), &dataset_turtle(id, modified))
            .expect("dataset");
    }
}

pub fn catalog_turtle(members: &[&str]) -> String {
    let mut body = String::from(
        "@prefix dcat: <http://www.w3.org/ns/dcat#>.\n\
         @prefix dcterms: <http://purl.org/dc/terms/>.\n\n\
         <#it> a dcat:Catalog ;\n  dcterms:title \"Catalog\"",
    );
    for member in members {
        body.push_str(&format!(" ;\n  dcat:dataset <{member}>"));
    }
    body.push_str(" .\n");
    body
}

pub fn dataset_turtle(identifier: &str, modified: &str) -> String {
    format!(
        r#"@prefix dcat: <http://www.w3.org/ns/dcat#>.
@prefix dcterms: <http://purl.org/dc/terms/>.
@prefix xsd: <http://www.w3.org/2001/XMLSchema#>.

<#it> a dcat:Dataset ;
  dcterms:identifier "{identifier}" ;
  dcterms:title "Dataset {identifier}" ;
  dcterms:modified "{modified}"^^xsd:dateTime ;
  dcterms:accessRights "public" ;
  dcat:distribution <#dist> .

<#dist> a dcat:Distribution ;
  dcat:downloadURL <../data/{identifier}.csv> ;
  dcat:mediaType "text/csv" .
"#
    )
}

pub fn memory_cache() -> Arc<AggregationCache> {
    Arc::new(AggregationCache::in_memory(CachePolicy::default()))
}

pub fn aggregator(store: Arc<MemoryStore>, cache: Arc<AggregationCache>) -> Aggregator {
    Aggregator::new(store, cache, Some(REGISTRY.to_string()))
}
