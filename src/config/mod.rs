pub mod persist;
mod types;

pub use persist::save_config;
pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Config location used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "~/.termux_ultra_downloader/config.json";

/// Expanded default config location.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

/// Load configuration from a JSON file, failing on any error.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config);

    Ok(config)
}

/// Load configuration, creating the file with defaults when it is missing.
///
/// A file that cannot be read or parsed yields defaults and is left in
/// place untouched.
pub fn load_or_create(path: &Path) -> AppConfig {
    if !path.exists() {
        let config = AppConfig::default();
        match save_config(path, &config) {
            Ok(()) => tracing::info!("Created default config at {}", path.display()),
            Err(e) => tracing::warn!("Could not write default config: {:#}", e),
        }
        return config;
    }

    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{:#}; using defaults", e);
            AppConfig::default()
        }
    }
}

/// Load from `--config` when given, otherwise from the default location.
pub fn load_config_or_default(custom_path: Option<&Path>) -> (PathBuf, AppConfig) {
    let path = custom_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);
    let config = load_or_create(&path);
    (path, config)
}

fn validate_config(config: &AppConfig) {
    if config.max_retries == 0 {
        tracing::warn!("max_retries is 0; one attempt will still be made");
    }

    if config.video_quality_map.is_empty() {
        tracing::warn!("video_quality_map is empty; only raw selectors will work");
    }

    for path in [&config.ffmpeg_path, &config.yt_dlp_path].into_iter().flatten() {
        if !path.exists() {
            tracing::warn!("Configured tool path does not exist: {:?}", path);
        }
    }
}
