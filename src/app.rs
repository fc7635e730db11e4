//! Command handlers shared by the CLI and the interactive menu.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use urlvideo_av::{check_tool, check_tools, ToolCommand, ToolEnvironment};
use urlvideo_common::MediaKind;

use crate::config::{self, persist::update_download_path, AppConfig};
use crate::download::{
    is_valid_batch_option, read_batch_file, resolve_output_dir, run_batch, AudioSettings,
    BatchSummary, DownloadFailure, DownloadRequest, DownloadResult, Downloader, ExternalTools,
};
use crate::ui;

/// Bitrate key used when none is given.
pub const DEFAULT_BITRATE: &str = "best";

/// Interpreter yt-dlp is upgraded through.
const PYTHON: &str = "python3";

/// Python module upgrade of yt-dlp.
const UPDATE_COMMAND: &[&str] = &["-m", "pip", "install", "--upgrade", "yt-dlp"];

/// Flags that apply to every command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub verbose: bool,
    pub dry_run: bool,
}

/// Where a download goes and how it authenticates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// Base output directory; the configured default when `None`.
    pub route: Option<PathBuf>,
    pub cookies: Option<PathBuf>,
}

pub struct App {
    config_path: PathBuf,
    config: AppConfig,
    downloader: Downloader<ExternalTools>,
    options: RunOptions,
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Root every user-chosen path is validated against.
pub fn home_dir() -> PathBuf {
    expand(Path::new("~"))
}

impl App {
    pub fn new(config_path: PathBuf, config: AppConfig, options: RunOptions) -> Self {
        let downloader = Downloader::from_config(&config);
        Self {
            config_path,
            config,
            downloader,
            options,
        }
    }

    /// Load (or create) the config and build the app around it.
    pub fn load(config_path: Option<&Path>, options: RunOptions) -> Self {
        let (path, config) = config::load_config_or_default(config_path);
        Self::new(path, config, options)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Validated output directory for `url` and a request pointing at it.
    fn request(
        &self,
        url: &str,
        selector: &str,
        kind: MediaKind,
        target: &Target,
    ) -> Result<DownloadRequest, DownloadFailure> {
        let route = target
            .route
            .as_deref()
            .map(expand)
            .unwrap_or_else(|| self.config.download_root());
        let dir = resolve_output_dir(
            &self.config,
            &self.config.path_policy(),
            &home_dir(),
            &route,
            url,
            kind,
        )?;

        let mut req = DownloadRequest::new(url.trim(), selector, dir);
        req.cookies = target.cookies.as_deref().map(expand);
        req.dry_run = self.options.dry_run;
        Ok(req)
    }

    fn selector(&self, quality: &str) -> String {
        match self.config.video_selector(quality) {
            Some(selector) => selector.to_string(),
            None => {
                tracing::debug!("Quality '{}' is not in the map, using it as a selector", quality);
                quality.to_string()
            }
        }
    }

    fn audio_settings(&self, format: &str, bitrate: &str) -> AudioSettings {
        AudioSettings {
            format: self.config.audio_format(format),
            quality: self.config.audio_quality(bitrate),
        }
    }

    pub fn video(&self, quality: &str, url: &str, target: &Target) -> DownloadResult {
        let req = self.request(url, &self.selector(quality), MediaKind::Video, target)?;
        self.downloader.video(&req)
    }

    pub fn audio(&self, format: &str, bitrate: &str, url: &str, target: &Target) -> DownloadResult {
        let req = self.request(url, "", MediaKind::Audio, target)?;
        self.downloader.audio(&req, &self.audio_settings(format, bitrate))
    }

    /// `quality` is the video quality key, or the audio format for audio
    /// playlists.
    pub fn playlist(
        &self,
        kind: MediaKind,
        quality: &str,
        url: &str,
        bitrate: &str,
        target: &Target,
    ) -> DownloadResult {
        match kind {
            MediaKind::Video => {
                let req = self.request(url, &self.selector(quality), MediaKind::Video, target)?;
                self.downloader.playlist_video(&req)
            }
            MediaKind::Audio => {
                let req = self.request(url, "", MediaKind::Audio, target)?;
                self.downloader
                    .playlist_audio(&req, &self.audio_settings(quality, bitrate))
            }
        }
    }

    /// Download every URL in `file`, printing progress as it goes.
    pub fn batch(
        &self,
        kind: MediaKind,
        option: &str,
        file: &Path,
        target: &Target,
    ) -> Result<BatchSummary> {
        if !is_valid_batch_option(&self.config, kind, option) {
            let known: Vec<&String> = match kind {
                MediaKind::Video => self.config.video_quality_map.keys().collect(),
                MediaKind::Audio => self.config.audio_format_map.keys().collect(),
            };
            bail!(
                "Unknown {} option '{}' (expected one of: {})",
                kind,
                option,
                known
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let file = expand(file);
        let urls = read_batch_file(&file)
            .with_context(|| format!("Failed to read batch file: {:?}", file))?;
        if urls.is_empty() {
            ui::warn(&format!("{} contains no URLs", file.display()));
        }

        let summary = run_batch(&urls, |index, url| {
            ui::batch_header(index, urls.len(), url);
            let result = match kind {
                MediaKind::Video => self.video(option, url, target),
                MediaKind::Audio => self.audio(option, DEFAULT_BITRATE, url, target),
            };
            ui::report(url, &result);
            result
        });

        ui::batch_summary(&summary);
        Ok(summary)
    }

    /// Print tool availability. Returns whether every tool was found.
    pub fn check_tools(&self) -> bool {
        let env = ToolEnvironment::from_host();
        ui::tool_report(&check_tools(&self.downloader.tools().paths, &env))
    }

    /// Check dependencies and create the download directory.
    pub fn setup(&self) -> Result<()> {
        ui::heading("Checking dependencies");
        if !self.check_tools() {
            ui::warn("Some tools are missing; downloads will fail until they are installed");
        }

        ui::heading("Preparing directories");
        let root = self.config.download_root();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create download directory: {:?}", root))?;
        ui::success(&format!("Download directory: {}", root.display()));

        let storage = expand(Path::new("~/storage/downloads"));
        if storage_is_writable(&storage) {
            ui::success(&format!("Shared storage available at {}", storage.display()));
        } else {
            ui::warn("Shared storage not available; run termux-setup-storage to enable it");
        }

        Ok(())
    }

    /// Upgrade yt-dlp through pip.
    pub fn update(&self) -> Result<()> {
        let env = ToolEnvironment::from_host();
        let mut cmd = ToolCommand::new(PYTHON);
        cmd.args(UPDATE_COMMAND.iter().copied()).env(env.clone());

        if self.options.dry_run {
            println!("[DRY RUN] {}", cmd.display());
            return Ok(());
        }

        let python = check_tool(PYTHON, &env);
        if !python.available {
            bail!("{PYTHON} not found; install Python 3 to update yt-dlp");
        }
        tracing::debug!("Updating yt-dlp with {:?}", python.version);

        ui::info(&format!("Running: {}", cmd.display()));
        let output = cmd.execute().context("Failed to update yt-dlp")?;
        if let Some(last) = output.stdout.lines().last() {
            println!("{last}");
        }
        ui::success("yt-dlp updated");
        Ok(())
    }

    pub fn show_config(&self) -> Result<()> {
        ui::heading("Configuration");
        ui::path_value("File", &self.config_path);
        ui::path_value("Download path", &self.config.download_root());
        ui::path_value("Logs", &self.config.logs_dir());
        println!();
        println!("{}", serde_json::to_string_pretty(&self.config)?);
        Ok(())
    }

    /// Persist a new default download directory. It must exist and pass
    /// the path validator.
    pub fn set_default_path(&mut self, dir: &Path) -> Result<()> {
        let dir = expand(dir);
        if !dir.is_dir() {
            bail!("Not a directory: {}", dir.display());
        }

        let dir = self
            .config
            .path_policy()
            .ensure_safe(&home_dir(), &dir)?;

        update_download_path(&self.config_path, &mut self.config, &dir)?;
        self.downloader = Downloader::from_config(&self.config);
        tracing::info!("Default download path set to {}", dir.display());
        Ok(())
    }
}

fn storage_is_writable(dir: &Path) -> bool {
    dir.is_dir()
        && std::fs::metadata(dir)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
}
