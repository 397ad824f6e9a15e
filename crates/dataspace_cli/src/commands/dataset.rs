use std::collections::BTreeSet;

use dataspace_core::{DatasetInput, DatasetKind, DataspaceContext};
use miette::Result;
use owo_colors::OwoColorize;

use crate::output::Output;

/// Dataset metadata as given on the command line.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DatasetArgs {
    /// Dataset title
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Theme name or theme IRI
    #[arg(long, default_value = "")]
    pub theme: String,
    #[arg(long, default_value = "")]
    pub publisher: String,
    #[arg(long, default_value = "")]
    pub contact_email: String,
    /// Download URL of the data file
    #[arg(long, default_value = "")]
    pub data_url: String,
    /// Media type of the data file
    #[arg(long, default_value = "")]
    pub media_type: String,
    /// Download URL of the semantic model file
    #[arg(long, default_value = "")]
    pub model_url: String,
    #[arg(long, default_value = "text/turtle")]
    pub model_media_type: String,
    /// Mark the data as restricted (metadata stays publicly readable)
    #[arg(long)]
    pub restricted: bool,
    /// Explicit identifier; generated when omitted
    #[arg(long)]
    pub identifier: Option<String>,
}

impl DatasetArgs {
    pub fn into_input(self) -> DatasetInput {
        DatasetInput {
            identifier: self.identifier,
            title: self.title,
            description: self.description,
            theme: self.theme,
            publisher: self.publisher,
            contact_email: self.contact_email,
            access_url_data: self.data_url,
            file_format: self.media_type,
            model_format: if self.model_url.is_empty() {
                String::new()
            } else {
                self.model_media_type
            },
            access_url_model: self.model_url,
            is_public: !self.restricted,
            ..Default::default()
        }
    }
}

pub async fn create(context: &DataspaceContext, args: DatasetArgs, output: &Output) -> Result<()> {
    let writer = context.writer().await?;
    let created = writer.create_dataset(&args.into_input()).await?;
    output.success("Dataset created");
    output.kv("Identifier", &created.identifier);
    output.kv("URL", &created.dataset_url.bright_cyan().to_string());
    Ok(())
}

pub async fn create_series(
    context: &DataspaceContext,
    title: String,
    description: String,
    members: Vec<String>,
    identifier: Option<String>,
    output: &Output,
) -> Result<()> {
    let writer = context.writer().await?;
    let input = DatasetInput {
        identifier,
        title,
        description,
        is_public: true,
        kind: DatasetKind::Series {
            member_urls: members.into_iter().collect::<BTreeSet<_>>(),
        },
        ..Default::default()
    };
    let created = writer.create_dataset(&input).await?;
    output.success("Series created");
    output.kv("Identifier", &created.identifier);
    output.kv("URL", &created.dataset_url.bright_cyan().to_string());
    Ok(())
}

pub async fn update(
    context: &DataspaceContext,
    dataset_url: String,
    args: DatasetArgs,
    output: &Output,
) -> Result<()> {
    let writer = context.writer().await?;
    let mut input = args.into_input();
    input.dataset_url = Some(dataset_url.clone());
    writer.update_dataset(&input).await?;
    output.success(&format!("Updated {dataset_url}"));
    Ok(())
}

pub async fn delete(
    context: &DataspaceContext,
    dataset_url: &str,
    identifier: Option<&str>,
    output: &Output,
) -> Result<()> {
    let writer = context.writer().await?;
    writer.delete_dataset(dataset_url, identifier).await?;
    output.success(&format!("Deleted {dataset_url}"));
    Ok(())
}

/// Provision the catalog with the configured title and description.
pub async fn init_catalog(context: &DataspaceContext, output: &Output) -> Result<()> {
    let writer = context.writer().await?;
    let settings = &context.config().catalog;
    let description = Some(settings.description.as_str()).filter(|d| !d.is_empty());
    let catalog = writer
        .ensure_catalog_structure(Some(&settings.title), description)
        .await?;
    output.success("Catalog ready");
    output.kv("Catalog", &catalog.url);
    output.kv("Title", &catalog.title);
    output.kv("Datasets", &catalog.dataset_urls.len().to_string());
    Ok(())
}

pub async fn reset(context: &DataspaceContext, yes: bool, output: &Output) -> Result<()> {
    let writer = context.writer().await?;
    if !yes {
        output.warning(&format!(
            "This deletes every dataset, series and record under {}",
            writer.catalog_url()
        ));
        output.status("Re-run with --yes to proceed");
        return Ok(());
    }
    writer.reset_catalog().await?;
    output.success("Catalog reset");
    Ok(())
}
