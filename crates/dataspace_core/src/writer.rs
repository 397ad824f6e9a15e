//! Owner-side writes: catalog scaffolding, dataset documents, audit records
//!
//! Each operation is a sequence of independent document writes. A failure aborts
//! the remaining steps and is returned with the URL that failed; steps already
//! applied stay applied and the next successful write reconciles them.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::cache::AggregationCache;
use crate::catalog::{Catalog, DEFAULT_CATALOG_TITLE};
use crate::dataset::{is_safe_identifier, CreatedDataset, DatasetInput, DatasetKind};
use crate::error::{StoreError, WriteError, WriteResult};
use crate::identity::{document_url, primary_resource, WebId};
use crate::rdf::{Graph, Term};
use crate::store::DocumentStore;
use crate::vocab::{dcat, dcterms, foaf, ldp, rdf, sdm, vcard};

pub const CATALOG_CONTAINER: &str = "catalog/";
pub const DATASET_CONTAINER: &str = "catalog/ds/";
pub const SERIES_CONTAINER: &str = "catalog/series/";
pub const RECORDS_CONTAINER: &str = "catalog/records/";

#[derive(Debug, Clone)]
pub struct CatalogWriter {
    store: Arc<dyn DocumentStore>,
    cache: Arc<AggregationCache>,
    owner: WebId,
    /// Catalog resource the writer maintains
    catalog_url: String,
}

impl CatalogWriter {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<AggregationCache>, owner: WebId) -> Self {
        let catalog_url = owner.default_catalog_url();
        Self {
            store,
            cache,
            owner,
            catalog_url,
        }
    }

    /// Maintain a catalog other than the owner's default one.
    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    pub fn owner(&self) -> &WebId {
        &self.owner
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    fn container(&self, path: &str) -> String {
        format!("{}{path}", self.owner.pod_root())
    }

    fn record_doc(&self, identifier: &str) -> String {
        format!("{}{identifier}.ttl", self.container(RECORDS_CONTAINER))
    }

    // ========== Scaffolding ==========

    /// Create the catalog containers and (re)write the catalog resource.
    ///
    /// Idempotent. `None` keeps the existing title or description; existing
    /// membership is always kept.
    pub async fn ensure_catalog_structure(
        &self,
        title: Option<&str>,
        description: Option<&str>,
    ) -> WriteResult<Catalog> {
        let containers = [
            CATALOG_CONTAINER,
            DATASET_CONTAINER,
            SERIES_CONTAINER,
            RECORDS_CONTAINER,
        ]
        .map(|path| self.container(path));
        for container in &containers {
            self.ensure_container(container).await?;
        }

        let (document, mut catalog) = self.read_catalog().await?;
        if let Some(title) = title {
            catalog.title = title.to_string();
        }
        if catalog.title.is_empty() {
            catalog.title = DEFAULT_CATALOG_TITLE.to_string();
        }
        if let Some(description) = description {
            catalog.description = description.to_string();
        }
        catalog.contact_point = Some(self.owner.to_string());
        self.write_catalog(document, &mut catalog).await?;

        self.grant_public_read(&document_url(&self.catalog_url)).await;
        for container in &containers {
            self.grant_public_read(container).await;
        }
        Ok(catalog)
    }

    async fn ensure_container(&self, url: &str) -> WriteResult<()> {
        match self.store.create_container(url).await {
            Ok(()) => Ok(()),
            Err(StoreError::AlreadyExists { .. }) => {
                tracing::debug!(container = %url, "container already exists");
                Ok(())
            }
            Err(e) => Err(WriteError::store("create container", e)),
        }
    }

    // ========== Dataset writes ==========

    /// Create a dataset or series document and list it in the catalog.
    pub async fn create_dataset(&self, input: &DatasetInput) -> WriteResult<CreatedDataset> {
        input.validate()?;
        self.ensure_catalog_structure(None, None).await?;

        let identifier = input
            .identifier
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let container = match input.kind {
            DatasetKind::Dataset => DATASET_CONTAINER,
            DatasetKind::Series { .. } => SERIES_CONTAINER,
        };
        let doc = format!("{}{identifier}.ttl", self.container(container));
        let dataset_url = primary_resource(&doc);

        self.write_dataset_document(&doc, input, &identifier).await?;
        self.update_membership(&dataset_url, Membership::Add).await?;
        self.write_record(&doc, &identifier).await?;
        self.invalidate_own_catalog().await;

        tracing::info!(dataset_url = %dataset_url, identifier = %identifier, "created dataset");
        Ok(CreatedDataset {
            dataset_url,
            identifier,
        })
    }

    /// Rewrite an existing dataset document and re-assert its catalog membership.
    pub async fn update_dataset(&self, input: &DatasetInput) -> WriteResult<()> {
        let dataset_url = input
            .dataset_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or(WriteError::MissingDatasetUrl)?;
        input.validate()?;
        self.ensure_catalog_structure(None, None).await?;

        let doc = document_url(&dataset_url);
        let existing = self.read_optional(&doc, "read dataset").await?;
        let identifier = input
            .identifier
            .clone()
            .or_else(|| {
                existing.as_ref().and_then(|graph| {
                    graph
                        .first_literal(&primary_resource(&doc), dcterms::IDENTIFIER)
                        .filter(|stored| is_safe_identifier(stored))
                        .map(str::to_string)
                })
            })
            .or_else(|| file_stem(&doc));

        let identifier_for_doc = identifier.clone().unwrap_or_else(|| dataset_url.clone());
        self.write_dataset_document(&doc, input, &identifier_for_doc)
            .await?;
        self.update_membership(&dataset_url, Membership::Add).await?;
        if let Some(identifier) = &identifier {
            self.write_record(&doc, identifier).await?;
        }
        self.invalidate_own_catalog().await;

        tracing::info!(dataset_url = %dataset_url, "updated dataset");
        Ok(())
    }

    /// Remove a dataset from the catalog and delete its documents.
    ///
    /// Only the membership removal is required to succeed; the dataset and record
    /// deletes are best-effort.
    pub async fn delete_dataset(
        &self,
        dataset_url: &str,
        identifier: Option<&str>,
    ) -> WriteResult<()> {
        if dataset_url.trim().is_empty() {
            return Err(WriteError::MissingDatasetUrl);
        }
        if let Some(identifier) = identifier.filter(|id| !is_safe_identifier(id)) {
            return Err(WriteError::invalid(
                "identifier",
                format!("'{identifier}' is not a single safe path segment"),
            ));
        }
        self.update_membership(dataset_url, Membership::Remove)
            .await?;

        let doc = document_url(dataset_url);
        self.delete_best_effort(&doc).await;

        let record_id = identifier.map(str::to_string).or_else(|| file_stem(&doc));
        if let Some(record_id) = record_id {
            self.delete_best_effort(&self.record_doc(&record_id)).await;
        }
        self.invalidate_own_catalog().await;

        tracing::info!(dataset_url, "deleted dataset");
        Ok(())
    }

    /// Empty the catalog: delete every dataset, series and record document and
    /// rewrite the catalog with no members. Clears the whole aggregation cache.
    pub async fn reset_catalog(&self) -> WriteResult<()> {
        self.ensure_catalog_structure(None, None).await?;

        for path in [DATASET_CONTAINER, SERIES_CONTAINER, RECORDS_CONTAINER] {
            let container = self.container(path);
            let listing = match self.store.fetch_document(&container).await {
                Ok(graph) => graph,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    tracing::warn!(container = %container, error = %e, "cannot list container");
                    continue;
                }
            };
            for child in listing.iris(&container, ldp::CONTAINS) {
                self.delete_best_effort(child).await;
            }
        }

        let (document, mut catalog) = self.read_catalog().await?;
        catalog.dataset_urls.clear();
        self.write_catalog(document, &mut catalog).await?;
        self.cache.clear();
        self.persist_cache().await;

        tracing::info!(catalog_url = %self.catalog_url, "reset catalog");
        Ok(())
    }

    // ========== Documents ==========

    async fn write_dataset_document(
        &self,
        doc: &str,
        input: &DatasetInput,
        identifier: &str,
    ) -> WriteResult<()> {
        let subject = primary_resource(doc);
        let previous = self.read_optional(doc, "read dataset").await?;
        let (prev_issued, prev_modified) = previous
            .as_ref()
            .map(|graph| {
                (
                    graph.first_datetime(&subject, dcterms::ISSUED),
                    graph.first_datetime(&subject, dcterms::MODIFIED),
                )
            })
            .unwrap_or_default();

        let now = Utc::now();
        let issued = input.issued.or(prev_issued).unwrap_or(now);
        let modified = next_modified(input.modified, prev_modified, now);
        let owner = input
            .owner_identity
            .clone()
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| self.owner.to_string());

        let graph = dataset_graph(doc, input, identifier, &owner, issued, modified);
        self.store
            .write_document(doc, &graph)
            .await
            .map_err(|e| WriteError::store("write dataset", e))?;

        // Metadata is always discoverable, whatever the data's access rights.
        self.grant_public_read(doc).await;
        Ok(())
    }

    /// Append a change event to the dataset's audit record.
    async fn write_record(&self, dataset_doc: &str, identifier: &str) -> WriteResult<()> {
        let record = self.record_doc(identifier);
        let desc = format!("{record}#desc");
        let wac = format!("{record}#wac");
        let existing = self
            .read_optional(&record, "read record")
            .await?
            .unwrap_or_default();

        let now = Utc::now();
        let mut millis = now.timestamp_millis();
        while existing.has_subject(&format!("{record}#change-{millis}")) {
            millis += 1;
        }
        let change = format!("{record}#change-{millis}");
        let mut change_log: Vec<String> = existing
            .iris(&desc, sdm::CHANGE_LOG)
            .into_iter()
            .map(str::to_string)
            .collect();
        change_log.push(change.clone());

        // Prior change events carry over untouched.
        let mut graph: Graph = existing
            .iter()
            .filter(|s| s.subject != desc && s.subject != wac)
            .cloned()
            .collect();
        graph
            .add_iri(&change, rdf::TYPE, sdm::CHANGE_EVENT)
            .add(&change, dcterms::MODIFIED, Term::datetime(now))
            .add_literal(&change, dcterms::DESCRIPTION, "Dataset metadata updated.");
        graph
            .add_iri(&desc, rdf::TYPE, dcat::CATALOG_RECORD)
            .add_literal(&desc, dcterms::TITLE, "Dataset description record")
            .add_literal(
                &desc,
                dcterms::DESCRIPTION,
                "Catalog record for dataset metadata.",
            )
            .add_iri(&desc, foaf::PRIMARY_TOPIC, dataset_doc)
            .add(&desc, dcterms::MODIFIED, Term::datetime(now));
        for entry in &change_log {
            graph.add_iri(&desc, sdm::CHANGE_LOG, entry);
        }
        graph
            .add_iri(&wac, rdf::TYPE, dcat::CATALOG_RECORD)
            .add_literal(&wac, dcterms::TITLE, "Dataset ACL record")
            .add_literal(
                &wac,
                dcterms::DESCRIPTION,
                "Catalog record for the dataset access control.",
            )
            .add_iri(&wac, foaf::PRIMARY_TOPIC, &format!("{dataset_doc}.acl"))
            .add(&wac, dcterms::MODIFIED, Term::datetime(now));

        self.store
            .write_document(&record, &graph)
            .await
            .map_err(|e| WriteError::store("write record", e))?;
        self.grant_public_read(&record).await;
        Ok(())
    }

    // ========== Catalog document ==========

    /// The catalog document and the catalog resource in it (new when absent).
    async fn read_catalog(&self) -> WriteResult<(Graph, Catalog)> {
        let doc = document_url(&self.catalog_url);
        let document = self
            .read_optional(&doc, "read catalog")
            .await?
            .unwrap_or_default();
        let catalog = Catalog::from_graph(&document, &self.catalog_url)
            .unwrap_or_else(|| Catalog::new(&self.catalog_url));
        Ok((document, catalog))
    }

    /// Replace the catalog resource in `document`, bumping `modified`.
    async fn write_catalog(&self, mut document: Graph, catalog: &mut Catalog) -> WriteResult<()> {
        if catalog.title.is_empty() {
            catalog.title = DEFAULT_CATALOG_TITLE.to_string();
        }
        catalog.modified = Some(next_modified(None, catalog.modified, Utc::now()));
        document.remove_subject(&catalog.url);
        document.extend(catalog.to_graph());
        self.store
            .write_document(&document_url(&self.catalog_url), &document)
            .await
            .map_err(|e| WriteError::store("write catalog", e))
    }

    async fn update_membership(&self, dataset_url: &str, change: Membership) -> WriteResult<()> {
        let (document, mut catalog) = self.read_catalog().await?;
        match change {
            Membership::Add => {
                catalog.dataset_urls.insert(dataset_url.to_string());
            }
            Membership::Remove => {
                catalog.dataset_urls.remove(dataset_url);
            }
        }
        self.write_catalog(document, &mut catalog).await
    }

    // ========== Helpers ==========

    /// Fetch a document that may legitimately not exist yet.
    async fn read_optional(&self, url: &str, operation: &str) -> WriteResult<Option<Graph>> {
        match self.store.fetch_document(url).await {
            Ok(graph) => Ok(Some(graph)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(WriteError::store(operation, e)),
        }
    }

    async fn grant_public_read(&self, url: &str) {
        if let Err(e) = self.store.set_public_read(url).await {
            tracing::warn!(url, error = %e, "failed to set public read");
        }
    }

    async fn delete_best_effort(&self, url: &str) {
        match self.store.delete_document(url).await {
            Ok(()) => tracing::debug!(url, "deleted"),
            Err(e) if e.is_not_found() => {}
            Err(e) => tracing::warn!(url, error = %e, "delete failed"),
        }
    }

    /// Drop the own catalog from the cache, on disk too, so the next
    /// aggregation in any process refetches it.
    async fn invalidate_own_catalog(&self) {
        if self.cache.invalidate(&self.catalog_url) {
            tracing::debug!(catalog_url = %self.catalog_url, "invalidated cached catalog");
        }
        self.persist_cache().await;
    }

    async fn persist_cache(&self) {
        if let Err(e) = self.cache.persist().await {
            tracing::warn!(error = %e, "failed to persist aggregation cache after write");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Membership {
    Add,
    Remove,
}

/// `max(requested, now, previous + 1ms)`: strictly after the previous write.
pub fn next_modified(
    requested: Option<DateTime<Utc>>,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let floor = previous.map(|prev| prev + TimeDelta::milliseconds(1));
    [Some(now), requested, floor]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(now)
}

/// Theme IRI for a free-text theme; absolute IRIs pass through.
pub fn theme_iri(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    let slug = value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let encoded: String = url::form_urlencoded::byte_serialize(slug.as_bytes()).collect();
    Some(format!("{}{encoded}", sdm::THEME_NS))
}

/// Document name without `.ttl`, when it is usable as an identifier.
fn file_stem(doc: &str) -> Option<String> {
    let name = doc.rsplit('/').next()?;
    let stem = name.strip_suffix(".ttl").unwrap_or(name);
    is_safe_identifier(stem).then(|| stem.to_string())
}

/// The dataset document: the resource, its contact point and its distributions.
fn dataset_graph(
    doc: &str,
    input: &DatasetInput,
    identifier: &str,
    owner: &str,
    issued: DateTime<Utc>,
    modified: DateTime<Utc>,
) -> Graph {
    let subject = primary_resource(doc);
    let is_series = input.kind.is_series();
    let class = if is_series {
        dcat::DATASET_SERIES
    } else {
        dcat::DATASET
    };
    let access_rights = if input.is_public { "public" } else { "restricted" };

    let mut graph = Graph::new();
    graph
        .add_iri(&subject, rdf::TYPE, class)
        .add_literal(&subject, dcterms::IDENTIFIER, identifier)
        .add_literal(&subject, dcterms::TITLE, &input.title)
        .add_literal(&subject, dcterms::DESCRIPTION, &input.description)
        .add(&subject, dcterms::ISSUED, Term::datetime(issued))
        .add(&subject, dcterms::MODIFIED, Term::datetime(modified))
        .add_literal(&subject, dcterms::PUBLISHER, &input.publisher)
        .add_iri(&subject, dcterms::CREATOR, owner)
        .add_literal(&subject, dcterms::ACCESS_RIGHTS, access_rights);
    if let Some(theme) = theme_iri(&input.theme) {
        graph.add_iri(&subject, dcat::THEME, &theme);
    }
    if !input.access_url_model.trim().is_empty() {
        graph.add_iri(&subject, dcterms::CONFORMS_TO, input.access_url_model.trim());
    }

    let email = input.contact_email.trim();
    if !email.is_empty() {
        let contact = format!("{doc}#contact");
        let mailto = if email.starts_with("mailto:") {
            email.to_string()
        } else {
            format!("mailto:{email}")
        };
        graph
            .add_literal(&contact, vcard::FN, &input.publisher)
            .add_iri(&contact, vcard::HAS_EMAIL, &mailto)
            .add_iri(&subject, dcat::CONTACT_POINT, &contact);
    }

    match &input.kind {
        DatasetKind::Dataset => {
            add_distribution(
                &mut graph,
                &subject,
                &format!("{doc}#dist"),
                &input.access_url_data,
                &input.file_format,
            );
            add_distribution(
                &mut graph,
                &subject,
                &format!("{doc}#model"),
                &input.access_url_model,
                &input.model_format,
            );
        }
        DatasetKind::Series { member_urls } => {
            for member in member_urls {
                graph.add_iri(&subject, dcterms::HAS_PART, member);
            }
        }
    }
    graph
}

fn add_distribution(graph: &mut Graph, subject: &str, node: &str, download: &str, media_type: &str) {
    let download = download.trim();
    if download.is_empty() {
        return;
    }
    graph
        .add_iri(node, rdf::TYPE, dcat::DISTRIBUTION)
        .add_iri(node, dcat::DOWNLOAD_URL, download)
        .add_literal(node, dcat::MEDIA_TYPE, media_type.trim())
        .add_iri(subject, dcat::DISTRIBUTION_PROP, node);
}
