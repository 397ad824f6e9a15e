//! Config-driven wiring: one context, shared cache between reads and writes.

mod common;

use std::sync::Arc;

use dataspace_core::config::{load_config, save_config};
use dataspace_core::{DataspaceConfig, DataspaceContext, DatasetInput, DatasetFilter, MemoryStore};

use common::*;

#[tokio::test]
async fn context_from_saved_config_writes_and_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("dataspace.toml");

    let mut config = DataspaceConfig::default();
    config.identity.web_id = Some(web_id(ALICE));
    config.registry.url = REGISTRY.to_string();
    config.cache.path = Some("cache/aggregation.json".into());
    config.catalog.title = "Alice's catalog".into();
    save_config(&config, &config_path).await.unwrap();

    let loaded = load_config(&config_path).await.unwrap();
    let store = Arc::new(MemoryStore::new());
    let context = DataspaceContext::with_store(loaded, store.clone()).await;

    let writer = context.writer().await.unwrap();
    writer
        .ensure_catalog_structure(Some(&context.config().catalog.title), None)
        .await
        .unwrap();
    writer
        .create_dataset(&DatasetInput {
            identifier: Some("traffic".into()),
            title: "Traffic counts".into(),
            access_url_data: "https://alice.example/data/traffic.csv".into(),
            file_format: "text/csv".into(),
            is_public: true,
            ..Default::default()
        })
        .await
        .unwrap();

    let aggregation = context.aggregate().await.unwrap();
    let found = DatasetFilter::new()
        .with_text("traffic")
        .public_only(true)
        .apply(&aggregation.datasets);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].owner_identity, ALICE);

    // relative cache path lands next to the config file
    assert!(dir.path().join("cache/aggregation.json").exists());
}
