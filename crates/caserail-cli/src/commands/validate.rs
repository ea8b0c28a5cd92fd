//! Validate configuration command

use anyhow::{Context, Result};
use std::path::Path;

use super::settings::SettingsArgs;

/// Run the validate command
pub async fn run(settings: &SettingsArgs, config_path: Option<&Path>) -> Result<()> {
    if let Some(path) = config_path {
        tracing::info!("Validating configuration: {}", path.display());
    }

    let config = settings.resolve(config_path)?;

    tracing::info!("✓ TestRail: {}", config.base_url());
    tracing::info!("✓ Project: {}", config.project_id);
    match config.run_id {
        Some(run_id) => tracing::info!("✓ Reusing run: {}", run_id),
        None => tracing::info!("✓ A new run will be created"),
    }

    // api_key is never serialized
    let resolved = serde_yaml::to_string(&config).context("Failed to render configuration")?;
    print!("{}", resolved);

    tracing::info!("✓ Configuration is valid");
    Ok(())
}
