//! Configuration persistence as pretty-printed JSON.

use super::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Save the entire config, creating parent directories as needed.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let content =
        serde_json::to_string_pretty(config).with_context(|| "Failed to serialize config")?;

    std::fs::write(path, content + "\n")
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

/// Update just the default download path.
pub fn update_download_path(path: &Path, config: &mut AppConfig, dir: &Path) -> Result<()> {
    config.default_download_path = Some(dir.to_path_buf());
    save_config(path, config)
}
