//! Terminal output helpers
//!
//! Status lines go to stdout with a colored marker; machine-readable output
//! (JSON, Turtle) is printed raw so it can be piped.

use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use dataspace_core::{CatalogSource, CatalogStatus, Dataset};
use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, Default)]
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, line: &str) {
        println!("{line}");
    }

    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
    }

    pub fn success(&self, message: &str) {
        println!("{} {message}", "✓".bright_green());
    }

    pub fn info(&self, label: &str, value: &str) {
        println!("{} {value}", label.bright_blue());
    }

    pub fn status(&self, message: &str) {
        println!("  {}", message.dimmed());
    }

    pub fn warning(&self, message: &str) {
        println!("{} {message}", "!".yellow().bold());
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!("  {:<18} {value}", format!("{key}:").bright_black());
    }

    pub fn list_item(&self, item: &str) {
        println!("  • {item}");
    }

    /// One row per dataset: identifier, title, theme slug, owner, flags.
    pub fn dataset_table(&self, datasets: &[&Dataset]) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Identifier", "Title", "Theme", "Modified", "Owner", "Access"]);

        for dataset in datasets {
            let theme = dataset
                .theme
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            let modified = dataset
                .modified
                .map(|m| m.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let mut access = dataset.access_rights().to_string();
            if dataset.is_series() {
                access.push_str(", series");
            }
            if dataset.is_stale {
                access.push_str(", stale");
            }
            table.add_row(vec![
                dataset.identifier.clone(),
                dataset.title.clone(),
                theme,
                modified,
                dataset.owner_identity.clone(),
                access,
            ]);
        }
        println!("{table}");
    }

    /// Where each catalog's contribution came from.
    pub fn catalog_statuses(&self, statuses: &[CatalogStatus]) {
        for status in statuses {
            let source = match status.source {
                CatalogSource::Fresh => "fresh".bright_green().to_string(),
                CatalogSource::Cached => "cached".bright_cyan().to_string(),
                CatalogSource::Fallback => "fallback".yellow().to_string(),
                CatalogSource::Empty => "unreachable".red().to_string(),
                CatalogSource::Expired => "expired".red().to_string(),
            };
            let seen = status
                .last_success
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string());
            self.list_item(&format!(
                "{} [{source}] {} datasets, last success {}",
                status.catalog_url,
                status.dataset_count,
                seen.dimmed()
            ));
        }
    }
}
