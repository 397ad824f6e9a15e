use std::path::Path;

use chrono::Utc;
use dataspace_core::export::{export_turtle, EXPORT_RESOURCE};
use dataspace_core::{CatalogStatus, Dataset, DatasetFilter, DataspaceContext, WebId};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::output::Output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateReport<'a> {
    from_cache: bool,
    catalogs: &'a [String],
    statuses: &'a [CatalogStatus],
    datasets: Vec<&'a Dataset>,
}

/// Run an aggregation and print the (filtered) view.
pub async fn aggregate(
    context: &DataspaceContext,
    filter: &DatasetFilter,
    json: bool,
    output: &Output,
) -> Result<()> {
    let aggregation = context.aggregate().await?;
    let datasets = filter.apply(&aggregation.datasets);

    if json {
        let report = AggregateReport {
            from_cache: aggregation.from_cache,
            catalogs: &aggregation.catalogs,
            statuses: &aggregation.statuses,
            datasets,
        };
        output.print(&serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    output.section("Catalogs");
    output.catalog_statuses(&aggregation.statuses);
    if aggregation.from_cache {
        output.info("Cache:", "served without fetching any catalog");
    }

    output.section(&format!(
        "Datasets ({} of {})",
        datasets.len(),
        aggregation.datasets.len()
    ));
    if datasets.is_empty() {
        output.status("nothing matched");
    } else {
        output.dataset_table(&datasets);
    }
    Ok(())
}

/// Print where an owner's catalog lives.
pub async fn locate(context: &DataspaceContext, web_id: Option<&str>, output: &Output) -> Result<()> {
    let owner = match web_id {
        Some(value) => WebId::parse(value)?,
        None => context.web_id()?.clone(),
    };
    let catalog_url = context.aggregator().locator().locate_catalog(&owner).await;
    output.kv("Owner", &owner.to_string());
    output.kv("Catalog", &catalog_url.bright_cyan().to_string());
    Ok(())
}

/// Write the aggregated view as one Turtle catalog, to a file or stdout.
pub async fn export(context: &DataspaceContext, path: Option<&Path>, output: &Output) -> Result<()> {
    let aggregation = context.aggregate().await?;
    let body = export_turtle(&aggregation.datasets, EXPORT_RESOURCE, Utc::now()).into_diagnostic()?;

    match path {
        Some(path) => {
            tokio::fs::write(path, body).await.into_diagnostic()?;
            output.success(&format!(
                "Exported {} datasets to {}",
                aggregation.datasets.len(),
                path.display()
            ));
        }
        None => output.print(&body),
    }
    Ok(())
}
