use crate::cli::ConfigAction;
use crate::document::find_project_root;
use crate::paths::normalize;
use crate::{AppConfig, console};
use anyhow::Context;
use std::path::Path;

fn load_for_document(document: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(document) = document else {
        return Ok(AppConfig::load()?);
    };
    let document = std::path::absolute(document)
        .with_context(|| format!("Failed to resolve '{}'", document.display()))?;
    let root = normalize(&document).parent().and_then(find_project_root);
    Ok(AppConfig::load_for_project(root.as_deref())?)
}

/// Render the configuration as TOML with the connection string secrets masked.
pub fn render_config(config: &AppConfig) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if !shown.azure_storage_connection_string.is_empty() {
        shown.azure_storage_connection_string = config.masked_connection_string();
    }
    toml::to_string_pretty(&shown).context("Failed to render configuration")
}

pub fn handle_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show { document } => {
            let config = load_for_document(document.as_deref())?;
            for line in render_config(&config)?.lines() {
                console().plain(line);
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = AppConfig::load()?;
            config.set_value(&key, &value)?;
            config.save()?;
            console().success(&format!("Configuration updated: {} = {}", key, value));
        }
        ConfigAction::Path => {
            console().plain(&AppConfig::config_path()?.display().to_string());
        }
    }

    Ok(())
}
