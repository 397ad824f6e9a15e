//! Owner write path against an in-memory pod, read back through the aggregator.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use dataspace_core::identity::{document_url, primary_resource};
use dataspace_core::vocab::{dcat, dcterms, sdm};
use dataspace_core::{
    AggregationCache, Aggregator, CachePolicy, Catalog, CatalogLoader, CatalogWriter, DatasetInput, DatasetKind, DocumentStore,
    MemoryStore, StoreError, StoreOp, WriteError,
};
use pretty_assertions::assert_eq;

use common::*;

struct Pod {
    store: Arc<MemoryStore>,
    writer: CatalogWriter,
    aggregator: Aggregator,
}

fn alice_pod() -> Pod {
    let store = Arc::new(MemoryStore::new());
    let cache = memory_cache();
    Pod {
        writer: CatalogWriter::new(store.clone(), cache.clone(), web_id(ALICE)),
        aggregator: Aggregator::new(store.clone(), cache, None),
        store,
    }
}

fn csv_input(title: &str) -> DatasetInput {
    DatasetInput {
        title: title.into(),
        description: "Hourly readings".into(),
        publisher: "Alice".into(),
        contact_email: "alice@alice.example".into(),
        access_url_data: "https://alice.example/data/readings.csv".into(),
        file_format: "text/csv".into(),
        theme: "Environment".into(),
        is_public: true,
        ..Default::default()
    }
}

async fn catalog_members(store: &MemoryStore) -> BTreeSet<String> {
    let graph = store
        .fetch_document(&catalog_doc_of(ALICE))
        .await
        .expect("catalog document");
    Catalog::from_graph(&graph, &catalog_of(ALICE))
        .expect("catalog resource")
        .dataset_urls
}

#[tokio::test]
async fn created_dataset_shows_up_in_next_aggregation() {
    let pod = alice_pod();
    let me = web_id(ALICE);

    let first = pod.writer.create_dataset(&csv_input("First")).await.unwrap();
    let before = pod.aggregator.aggregate(&me).await;
    assert_eq!(before.datasets.len(), 1);

    let created = pod.writer.create_dataset(&csv_input("Second")).await.unwrap();
    assert!(!created.identifier.is_empty());
    assert_ne!(created.identifier, first.identifier);
    assert_eq!(
        created.dataset_url,
        format!("https://alice.example/catalog/ds/{}.ttl#it", created.identifier)
    );

    // still inside the TTL window; the write invalidated the owner's entry
    let after = pod.aggregator.aggregate(&me).await;
    assert!(!after.from_cache);
    let urls: Vec<&str> = after.datasets.iter().map(|d| d.dataset_url.as_str()).collect();
    assert!(urls.contains(&created.dataset_url.as_str()));
    assert_eq!(after.datasets.len(), 2);
}

#[tokio::test]
async fn restricted_dataset_metadata_is_still_public() {
    let pod = alice_pod();
    let mut input = csv_input("Private data");
    input.is_public = false;
    input.identifier = Some("private".into());

    let created = pod.writer.create_dataset(&input).await.unwrap();
    assert!(pod.store.is_public(&document_url(&created.dataset_url)));

    let view = pod.aggregator.aggregate(&web_id(ALICE)).await;
    let dataset = &view.datasets[0];
    assert!(!dataset.is_public);
    assert_eq!(dataset.access_rights(), "restricted");
    assert_eq!(dataset.contact_email, "alice@alice.example");
    assert_eq!(
        dataset.theme,
        "https://w3id.org/solid-dataspace-manager/theme/environment"
    );
}

#[tokio::test]
async fn scaffolding_tolerates_existing_containers() {
    let pod = alice_pod();
    pod.store
        .create_container("https://alice.example/catalog/")
        .await
        .unwrap();
    pod.store
        .create_container("https://alice.example/catalog/ds/")
        .await
        .unwrap();

    let catalog = pod
        .writer
        .ensure_catalog_structure(Some("Alice's data"), Some("Sensor exports"))
        .await
        .unwrap();
    assert_eq!(catalog.title, "Alice's data");
    assert_eq!(catalog.contact_point.as_deref(), Some(ALICE));

    // a second run keeps the chosen title
    let again = pod.writer.ensure_catalog_structure(None, None).await.unwrap();
    assert_eq!(again.title, "Alice's data");
    assert_eq!(again.description, "Sensor exports");
    assert!(again.modified > catalog.modified);

    for container in ["catalog/", "catalog/ds/", "catalog/series/", "catalog/records/"] {
        let url = format!("https://alice.example/{container}");
        assert!(pod.store.is_container(&url), "{url}");
        assert!(pod.store.is_public(&url), "{url}");
    }
    assert!(pod.store.is_public(&catalog_doc_of(ALICE)));
}

#[tokio::test]
async fn update_keeps_membership_and_appends_change_events() {
    let pod = alice_pod();
    let mut input = csv_input("Readings");
    input.identifier = Some("readings".into());
    let created = pod.writer.create_dataset(&input).await.unwrap();
    let doc = document_url(&created.dataset_url);
    let subject = primary_resource(&doc);
    let first_modified = pod
        .store
        .document(&doc)
        .and_then(|g| g.first_datetime(&subject, dcterms::MODIFIED))
        .unwrap();

    let mut update = csv_input("Readings v2");
    update.dataset_url = Some(created.dataset_url.clone());
    // a requested timestamp in the past never moves `modified` backwards
    update.modified = Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
    pod.writer.update_dataset(&update).await.unwrap();

    assert_eq!(catalog_members(&pod.store).await.len(), 1);
    let graph = pod.store.document(&doc).unwrap();
    assert_eq!(graph.first_literal(&subject, dcterms::TITLE), Some("Readings v2"));
    assert_eq!(graph.first_literal(&subject, dcterms::IDENTIFIER), Some("readings"));
    assert!(graph.first_datetime(&subject, dcterms::MODIFIED).unwrap() > first_modified);

    let record_doc = "https://alice.example/catalog/records/readings.ttl";
    let record = pod.store.document(record_doc).unwrap();
    let desc = format!("{record_doc}#desc");
    let changes = record.iris(&desc, sdm::CHANGE_LOG);
    assert_eq!(changes.len(), 2);
    for change in changes {
        assert!(record.has_type(change, sdm::CHANGE_EVENT));
    }
    assert_eq!(
        record.first_iri(&format!("{record_doc}#wac"), "http://xmlns.com/foaf/0.1/primaryTopic"),
        Some("https://alice.example/catalog/ds/readings.ttl.acl")
    );
    assert!(pod.store.is_public(record_doc));
}

#[tokio::test]
async fn update_requires_dataset_url() {
    let pod = alice_pod();
    let err = pod.writer.update_dataset(&csv_input("x")).await.unwrap_err();
    assert!(matches!(err, WriteError::MissingDatasetUrl));
}

#[tokio::test]
async fn invalid_input_writes_nothing() {
    let pod = alice_pod();
    let mut input = csv_input("No file");
    input.access_url_data.clear();
    let err = pod.writer.create_dataset(&input).await.unwrap_err();
    assert!(matches!(
        err,
        WriteError::InvalidInput {
            field: "accessUrlData",
            ..
        }
    ));

    let mut input = csv_input("Bad id");
    input.identifier = Some("../escape".into());
    assert!(pod.writer.create_dataset(&input).await.is_err());
    assert_eq!(pod.store.total_writes(), 0);
}

#[tokio::test]
async fn delete_removes_membership_even_when_document_delete_fails() {
    let pod = alice_pod();
    let mut input = csv_input("Doomed");
    input.identifier = Some("doomed".into());
    let created = pod.writer.create_dataset(&input).await.unwrap();
    let doc = document_url(&created.dataset_url);

    pod.store.fail_op(
        StoreOp::Delete,
        &doc,
        StoreError::network(&doc, "connection reset"),
    );
    pod.store.fail_op(
        StoreOp::Delete,
        "https://alice.example/catalog/records/doomed.ttl",
        StoreError::forbidden("https://alice.example/catalog/records/doomed.ttl"),
    );

    pod.writer
        .delete_dataset(&created.dataset_url, Some("doomed"))
        .await
        .unwrap();

    assert!(catalog_members(&pod.store).await.is_empty());
    assert!(pod.store.contains_document(&doc));
    let loaded = CatalogLoader::new(pod.store.clone())
        .load_catalog(&catalog_of(ALICE))
        .await
        .unwrap();
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn delete_cleans_up_documents() {
    let pod = alice_pod();
    let created = pod.writer.create_dataset(&csv_input("Gone")).await.unwrap();
    pod.writer
        .delete_dataset(&created.dataset_url, None)
        .await
        .unwrap();

    assert!(!pod.store.contains_document(&created.dataset_url));
    assert!(!pod.store.contains_document(&format!(
        "https://alice.example/catalog/records/{}.ttl",
        created.identifier
    )));
}

#[tokio::test]
async fn delete_rejects_identifier_outside_records_container() {
    let pod = alice_pod();
    let created = pod.writer.create_dataset(&csv_input("Kept")).await.unwrap();
    let traversal = "https://alice.example/catalog/records/../../profile/card.ttl";
    pod.store
        .insert_turtle(traversal, "<#me> a <http://xmlns.com/foaf/0.1/Person> .")
        .unwrap();

    let err = pod
        .writer
        .delete_dataset(&created.dataset_url, Some("../../profile/card"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WriteError::InvalidInput {
            field: "identifier",
            ..
        }
    ));
    assert!(pod.store.contains_document(traversal));
    assert!(catalog_members(&pod.store).await.contains(&created.dataset_url));
}

#[tokio::test]
async fn update_ignores_unsafe_stored_identifier() {
    let pod = alice_pod();
    let mut input = csv_input("Tampered");
    input.identifier = Some("tampered".into());
    let created = pod.writer.create_dataset(&input).await.unwrap();
    let doc = document_url(&created.dataset_url);
    pod.store
        .insert_turtle(&doc, &dataset_turtle("../../profile/card", "2024-01-01T00:00:00Z"))
        .unwrap();

    let mut update = csv_input("Tampered, again");
    update.dataset_url = Some(created.dataset_url.clone());
    pod.writer.update_dataset(&update).await.unwrap();

    assert!(!pod
        .store
        .contains_document("https://alice.example/catalog/records/../../profile/card.ttl"));
    assert!(pod
        .store
        .contains_document("https://alice.example/catalog/records/tampered.ttl"));
}

#[tokio::test]
async fn writes_reach_the_durable_cache_of_later_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aggregation.json");
    let store = Arc::new(MemoryStore::new());
    let me = web_id(ALICE);
    let open = || AggregationCache::open(path.clone(), CachePolicy::default());

    // each step gets its own cache instance, as separate CLI runs would
    let writer = CatalogWriter::new(store.clone(), Arc::new(open().await), me.clone());
    let first = writer.create_dataset(&csv_input("First")).await.unwrap();

    let t0 = Utc::now();
    let seen = Aggregator::new(store.clone(), Arc::new(open().await), None)
        .aggregate_at(&me, t0)
        .await;
    assert_eq!(seen.datasets.len(), 1);

    let writer = CatalogWriter::new(store.clone(), Arc::new(open().await), me.clone());
    let second = writer.create_dataset(&csv_input("Second")).await.unwrap();

    let after_create = Aggregator::new(store.clone(), Arc::new(open().await), None)
        .aggregate_at(&me, t0 + TimeDelta::minutes(2))
        .await;
    assert!(!after_create.from_cache);
    let urls: BTreeSet<&str> = after_create
        .datasets
        .iter()
        .map(|d| d.dataset_url.as_str())
        .collect();
    assert_eq!(
        urls,
        BTreeSet::from([first.dataset_url.as_str(), second.dataset_url.as_str()])
    );

    let writer = CatalogWriter::new(store.clone(), Arc::new(open().await), me.clone());
    writer.delete_dataset(&first.dataset_url, None).await.unwrap();

    let after_delete = Aggregator::new(store.clone(), Arc::new(open().await), None)
        .aggregate_at(&me, t0 + TimeDelta::minutes(3))
        .await;
    assert!(!after_delete.from_cache);
    assert_eq!(after_delete.datasets.len(), 1);
    assert_eq!(after_delete.datasets[0].dataset_url, second.dataset_url);
}

#[tokio::test]
async fn catalog_write_failure_is_surfaced_with_url() {
    let pod = alice_pod();
    pod.writer.ensure_catalog_structure(None, None).await.unwrap();
    pod.store.fail_op(
        StoreOp::Write,
        &catalog_doc_of(ALICE),
        StoreError::network(catalog_doc_of(ALICE), "timed out"),
    );

    let err = pod.writer.create_dataset(&csv_input("x")).await.unwrap_err();
    assert!(err.is_retryable());
    match err {
        WriteError::Store { url, .. } => assert_eq!(url, catalog_doc_of(ALICE)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn series_lists_members_and_aggregates_as_series() {
    let pod = alice_pod();
    let mut part = csv_input("Part");
    part.identifier = Some("part-1".into());
    let member = pod.writer.create_dataset(&part).await.unwrap();

    let series = DatasetInput {
        identifier: Some("yearly".into()),
        title: "Yearly series".into(),
        kind: DatasetKind::Series {
            member_urls: BTreeSet::from([member.dataset_url.clone()]),
        },
        ..Default::default()
    };
    let created = pod.writer.create_dataset(&series).await.unwrap();
    assert_eq!(
        created.dataset_url,
        "https://alice.example/catalog/series/yearly.ttl#it"
    );

    let doc = pod.store.document(&created.dataset_url).unwrap();
    assert!(doc.has_type(&created.dataset_url, dcat::DATASET_SERIES));

    let view = pod.aggregator.aggregate(&web_id(ALICE)).await;
    let aggregated = view
        .datasets
        .iter()
        .find(|d| d.identifier == "yearly")
        .unwrap();
    assert_eq!(
        aggregated.member_urls(),
        Some(&BTreeSet::from([member.dataset_url]))
    );
}

#[tokio::test]
async fn reset_empties_catalog_and_cache() {
    let pod = alice_pod();
    pod.writer.create_dataset(&csv_input("One")).await.unwrap();
    pod.writer.create_dataset(&csv_input("Two")).await.unwrap();
    pod.aggregator.aggregate(&web_id(ALICE)).await;
    assert!(!pod.aggregator.cache().is_empty());

    pod.writer.reset_catalog().await.unwrap();

    assert!(catalog_members(&pod.store).await.is_empty());
    assert!(pod.aggregator.cache().is_empty());
    assert!(pod.aggregator.cache().last_aggregated().is_none());
    for container in ["catalog/ds/", "catalog/records/"] {
        let listing = pod
            .store
            .fetch_document(&format!("https://alice.example/{container}"))
            .await
            .unwrap();
        assert!(
            listing
                .objects_any("http://www.w3.org/ns/ldp#contains")
                .is_empty(),
            "{container} not emptied"
        );
    }
    assert!(pod.aggregator.aggregate(&web_id(ALICE)).await.datasets.is_empty());
}
