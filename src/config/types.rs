use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use urlvideo_av::ToolPaths;
use urlvideo_common::paths::{PathPolicy, DEFAULT_EXTERNAL_MOUNTS};
use urlvideo_common::{MediaKind, Platform};

/// Routes that receive files directly instead of `<platform>/<kind>`.
pub const DEFAULT_FLAT_OUTPUT_DIRS: &[&str] = &[
    "/storage/emulated/0/Download",
    "/data/data/com.termux/files/home/downloads",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Base output directory. `null` falls back to the detected default.
    #[serde(default = "default_download_path")]
    pub default_download_path: Option<PathBuf>,

    /// Log directory, relative to the download path unless absolute.
    #[serde(default = "default_logs_directory")]
    pub logs_directory: PathBuf,

    /// Upper bound on fallback attempts per URL.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Network socket timeout handed to yt-dlp, in seconds. 0 leaves
    /// yt-dlp's own default in place.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Kill external tools after this many seconds. Unbounded when null.
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,

    /// How long the result locator waits for a file size to settle.
    #[serde(default = "default_stability_timeout")]
    pub stability_timeout_secs: u64,

    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,

    #[serde(default = "default_video_quality_map")]
    pub video_quality_map: BTreeMap<String, String>,

    #[serde(default = "default_audio_format_map")]
    pub audio_format_map: BTreeMap<String, String>,

    #[serde(default = "default_audio_quality_map")]
    pub audio_quality_map: BTreeMap<String, String>,

    #[serde(default = "default_external_mounts")]
    pub external_mounts: Vec<String>,

    #[serde(default = "default_flat_output_dirs")]
    pub flat_output_dirs: Vec<String>,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn default_download_path() -> Option<PathBuf> {
    let termux_storage = expand("~/storage/downloads");
    if termux_storage.exists() {
        Some(termux_storage)
    } else {
        Some(expand("~/downloads"))
    }
}

fn default_logs_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout() -> u64 {
    30
}

fn default_stability_timeout() -> u64 {
    10
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_video_quality_map() -> BTreeMap<String, String> {
    string_map(&[
        ("480p", "bestvideo[height<=480]+bestaudio/best[height<=480]"),
        ("720p", "bestvideo[height<=720]+bestaudio/best[height<=720]"),
        ("1080p", "bestvideo[height<=1080]+bestaudio/best[height<=1080]"),
        ("best", "bv*+ba/b"),
    ])
}

fn default_audio_format_map() -> BTreeMap<String, String> {
    string_map(&[
        ("mp3", "mp3"),
        ("m4a", "m4a"),
        ("flac", "flac"),
        ("wav", "wav"),
    ])
}

fn default_audio_quality_map() -> BTreeMap<String, String> {
    string_map(&[
        ("128", "128K"),
        ("192", "192K"),
        ("320", "320K"),
        ("best", "0"),
    ])
}

fn default_external_mounts() -> Vec<String> {
    DEFAULT_EXTERNAL_MOUNTS.iter().map(|s| s.to_string()).collect()
}

fn default_flat_output_dirs() -> Vec<String> {
    DEFAULT_FLAT_OUTPUT_DIRS.iter().map(|s| s.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_download_path: default_download_path(),
            logs_directory: default_logs_directory(),
            max_retries: default_max_retries(),
            timeout: default_timeout(),
            tool_timeout_secs: None,
            stability_timeout_secs: default_stability_timeout(),
            ffmpeg_path: None,
            yt_dlp_path: None,
            video_quality_map: default_video_quality_map(),
            audio_format_map: default_audio_format_map(),
            audio_quality_map: default_audio_quality_map(),
            external_mounts: default_external_mounts(),
            flat_output_dirs: default_flat_output_dirs(),
        }
    }
}

impl AppConfig {
    /// Base output directory with `~` expanded.
    pub fn download_root(&self) -> PathBuf {
        match &self.default_download_path {
            Some(path) => expand(&path.to_string_lossy()),
            None => default_download_path().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Directory the log file is written to.
    pub fn logs_dir(&self) -> PathBuf {
        let logs = expand(&self.logs_directory.to_string_lossy());
        if logs.is_absolute() {
            logs
        } else {
            self.download_root().join(logs)
        }
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    pub fn socket_timeout(&self) -> Option<u64> {
        (self.timeout > 0).then_some(self.timeout)
    }

    pub fn stability_timeout(&self) -> Duration {
        Duration::from_secs(self.stability_timeout_secs)
    }

    /// Format selector for a quality key such as `720p` or `best`.
    pub fn video_selector(&self, quality: &str) -> Option<&str> {
        self.video_quality_map.get(quality).map(String::as_str)
    }

    /// yt-dlp `--audio-format` value. Unknown keys pass through.
    pub fn audio_format(&self, key: &str) -> String {
        self.audio_format_map
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// yt-dlp `--audio-quality` value. Unknown keys pass through.
    pub fn audio_quality(&self, key: &str) -> String {
        self.audio_quality_map
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Whether files for `route` go straight into it.
    pub fn is_flat_output_dir(&self, route: &Path) -> bool {
        self.flat_output_dirs
            .iter()
            .any(|dir| expand(dir).as_path() == route)
    }

    /// Directory a download of `kind` from `platform` lands in.
    pub fn output_dir(&self, route: &Path, platform: Platform, kind: MediaKind) -> PathBuf {
        if self.is_flat_output_dir(route) {
            route.to_path_buf()
        } else {
            route.join(platform.dir_name()).join(kind.subdir())
        }
    }

    /// Path validator honouring the configured mount allow-list.
    pub fn path_policy(&self) -> PathPolicy {
        PathPolicy::new(self.external_mounts.iter().map(|m| expand(m)))
    }

    /// Locations of yt-dlp, ffmpeg and ffprobe.
    pub fn tool_paths(&self) -> ToolPaths {
        let yt_dlp = self
            .yt_dlp_path
            .as_ref()
            .map(|p| expand(&p.to_string_lossy()));
        let ffmpeg = self
            .ffmpeg_path
            .as_ref()
            .map(|p| expand(&p.to_string_lossy()));
        ToolPaths::discover(yt_dlp.as_deref(), ffmpeg.as_deref())
    }
}
