//! External tool detection and management.

use crate::command::ToolCommand;
use crate::env::ToolEnvironment;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extraction tool.
pub const YT_DLP: &str = "yt-dlp";
/// Transcoder and muxer.
pub const FFMPEG: &str = "ffmpeg";
/// Stream prober shipped with ffmpeg.
pub const FFPROBE: &str = "ffprobe";

const VERSION_TIMEOUT: Duration = Duration::from_secs(15);

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

impl ToolInfo {
    /// How to install this tool when it is missing.
    pub fn install_hint(&self) -> &'static str {
        install_hint(&self.name)
    }
}

/// Installation advice for a missing tool.
pub fn install_hint(name: &str) -> &'static str {
    match name {
        YT_DLP => "pip install -U yt-dlp (or: pkg install python && pip install yt-dlp)",
        FFMPEG | FFPROBE => "pkg install ffmpeg (Debian/Ubuntu: apt install ffmpeg)",
        _ => "install it and make sure it is on PATH",
    }
}

fn version_arg(name: &str) -> &'static str {
    match name {
        FFMPEG | FFPROBE => "-version",
        _ => "--version",
    }
}

/// Check whether a tool runs and report its version.
///
/// # Example
///
/// ```no_run
/// use urlvideo_av::{check_tool, ToolEnvironment};
///
/// let info = check_tool("ffprobe", &ToolEnvironment::from_host());
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, env: &ToolEnvironment) -> ToolInfo {
    check_tool_at(name, Path::new(name), env)
}

/// Check a tool at an explicit location.
pub fn check_tool_at(name: &str, program: &Path, env: &ToolEnvironment) -> ToolInfo {
    let result = ToolCommand::new(program)
        .arg(version_arg(name))
        .env(env.clone())
        .timeout(Some(VERSION_TIMEOUT))
        .execute();

    match result {
        Ok(output) => ToolInfo {
            name: name.to_string(),
            available: true,
            version: output.stdout.lines().next().map(|s| s.trim().to_string()),
            path: if program.is_absolute() {
                Some(program.to_path_buf())
            } else {
                which::which(program).ok()
            },
        },
        Err(e) => {
            tracing::debug!("{} unavailable: {}", name, e);
            ToolInfo {
                name: name.to_string(),
                available: false,
                version: None,
                path: None,
            }
        }
    }
}

/// Check yt-dlp, ffmpeg and ffprobe using the resolved locations.
pub fn check_tools(paths: &ToolPaths, env: &ToolEnvironment) -> Vec<ToolInfo> {
    vec![
        check_tool_at(YT_DLP, &paths.yt_dlp, env),
        check_tool_at(FFMPEG, &paths.ffmpeg, env),
        check_tool_at(FFPROBE, &paths.ffprobe, env),
    ]
}

/// Require that a tool is on PATH, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured location over PATH
/// lookup. The configured location may be the executable itself or the
/// directory containing it.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.is_dir() {
            let candidate = path.join(name);
            if candidate.exists() {
                return Ok(candidate);
            }
        } else if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "configured {} location {} not found, falling back to PATH",
            name,
            path.display()
        );
    }

    require_tool(name)
}

/// Resolved locations of the three external tools.
///
/// Unresolved tools keep their bare name so a later spawn reports
/// [`Error::ToolNotFound`] at the point of use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            yt_dlp: PathBuf::from(YT_DLP),
            ffmpeg: PathBuf::from(FFMPEG),
            ffprobe: PathBuf::from(FFPROBE),
        }
    }
}

impl ToolPaths {
    /// Resolve tools from optional configured locations and PATH. ffprobe
    /// is looked up next to ffmpeg first.
    pub fn discover(yt_dlp: Option<&Path>, ffmpeg: Option<&Path>) -> Self {
        let yt_dlp = get_tool_path(YT_DLP, yt_dlp).unwrap_or_else(|_| PathBuf::from(YT_DLP));
        let ffmpeg = get_tool_path(FFMPEG, ffmpeg).unwrap_or_else(|_| PathBuf::from(FFMPEG));
        let ffprobe = ffmpeg
            .parent()
            .map(|dir| dir.join(FFPROBE))
            .filter(|p| p.is_absolute() && p.exists())
            .or_else(|| require_tool(FFPROBE).ok())
            .unwrap_or_else(|| PathBuf::from(FFPROBE));

        Self {
            yt_dlp,
            ffmpeg,
            ffprobe,
        }
    }

    /// Directory to pass to `yt-dlp --ffmpeg-location`, when ffmpeg was
    /// resolved to an absolute path.
    pub fn ffmpeg_location(&self) -> Option<&Path> {
        if self.ffmpeg.is_absolute() {
            self.ffmpeg.parent()
        } else {
            None
        }
    }
}
