use std::path::{Path, PathBuf};

use dataspace_core::config::{self, DataspaceConfig};
use dataspace_core::WebId;
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// Show current configuration
pub async fn show(config: &DataspaceConfig, output: &Output) -> Result<()> {
    output.section("Current Configuration");
    output.print("");

    // Never echo the token
    let mut shown = config.clone();
    if shown.identity.access_token.is_some() {
        shown.identity.access_token = Some("<redacted>".to_string());
    }
    let toml_str = toml::to_string_pretty(&shown).into_diagnostic()?;
    for line in toml_str.lines() {
        output.print(line);
    }

    Ok(())
}

/// Write a default configuration file
pub async fn init(path: Option<&Path>, web_id: Option<&str>, output: &Output) -> Result<()> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_paths()
            .into_iter()
            .last()
            .unwrap_or_else(|| PathBuf::from("dataspace.toml")),
    };
    if path.exists() {
        output.warning(&format!("{} already exists, leaving it alone", path.display()));
        return Ok(());
    }

    let mut config = DataspaceConfig::default();
    if let Some(web_id) = web_id {
        config.identity.web_id = Some(WebId::parse(web_id)?);
    }
    config::save_config(&config, &path).await?;

    output.success(&format!("Wrote {}", path.display()));
    output.status("To use this configuration, run:");
    output.status(&format!(
        "{} --config {} aggregate",
        "dataspace-cli".bright_green(),
        path.display()
    ));
    Ok(())
}
