//! Download orchestration.
//!
//! A video download walks a fixed state machine:
//!
//! ```text
//! START -> ATTEMPT[1..N] -> LOCATE -> FOUND_AND_VALID      => success
//!                                  -> FOUND_NO_AUDIO       => failure
//!                                  -> NOT_FOUND -> RESCUE  -> RESCUED_AND_VALID => success
//!                                                          -> RESCUE_FAILED     => failure
//! ```
//!
//! Every external effect goes through the [`Toolchain`] trait so the
//! sequencing can be exercised without yt-dlp or ffmpeg installed.

mod audio;
mod batch;
mod locate;
mod playlist;
mod rescue;
mod strategy;
mod video;

pub use batch::{is_valid_batch_option, read_batch_file, run_batch, BatchSummary};
pub use locate::{find_components, Components, LocatedFile, Locator};
pub use rescue::{rescue_components, RescueOutcome};
pub use strategy::{
    run_ladder, strategies_for, FormatStrategy, LadderSuccess, ROBUST_SELECTOR, SHORTS_SELECTOR,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

use urlvideo_av::actions::{mux_streams, MuxMode};
use urlvideo_av::{probe, ToolCommand, ToolEnvironment, ToolPaths};
use urlvideo_common::paths::PathPolicy;
use urlvideo_common::{MediaKind, Platform};

use crate::config::AppConfig;

/// Everything needed to download one URL.
///
/// Verbosity is not a per-request setting. It is process-wide and lives in
/// [`crate::app::RunOptions`], which configures logging once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// Format selector for video, ignored for audio.
    pub selector: String,
    /// Final directory files are written to.
    pub output_dir: PathBuf,
    pub playlist: bool,
    pub cookies: Option<PathBuf>,
    pub dry_run: bool,
}

impl DownloadRequest {
    pub fn new(
        url: impl Into<String>,
        selector: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
            output_dir: output_dir.into(),
            playlist: false,
            cookies: None,
            dry_run: false,
        }
    }
}

/// Audio extraction parameters, already resolved through the config maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSettings {
    pub format: String,
    pub quality: String,
}

/// Result of one extraction attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<urlvideo_av::ToolOutput> for AttemptResult {
    fn from(output: urlvideo_av::ToolOutput) -> Self {
        Self {
            success: output.success(),
            exit_code: output.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

impl AttemptResult {
    /// Last non-empty stderr line, for short error reports.
    pub fn error_summary(&self) -> String {
        self.stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| match self.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            })
    }
}

/// What a successful download produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A single verified file.
    Saved { path: PathBuf, rescued: bool },
    /// The tool succeeded; files are named by the tool (audio, playlists).
    Extracted { dir: PathBuf, rescued: usize },
    /// Nothing ran; this is the command that would have.
    DryRun { command: String },
}

/// Why a single URL failed. Returned at the per-URL boundary, never raised
/// past it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadFailure {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsafe output path: {0}")]
    UnsafePath(String),

    #[error("{tool} not found; install with: {hint}")]
    ToolNotFound { tool: String, hint: String },

    #[error("all {attempts} download attempt(s) failed: {last_error}")]
    AllAttemptsFailed { attempts: usize, last_error: String },

    #[error("no output file found for '{media_id}' in {}", dir.display())]
    NoOutput { media_id: String, dir: PathBuf },

    #[error("manual remux failed: {0}")]
    RescueFailed(String),

    #[error("{} has no audio stream", path.display())]
    NoAudioStream { path: PathBuf },

    #[error("could not verify audio in {}: {reason}", path.display())]
    AudioCheckFailed { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl DownloadFailure {
    pub(crate) fn tool_not_found(tool: &str) -> Self {
        Self::ToolNotFound {
            tool: tool.to_string(),
            hint: urlvideo_av::tools::install_hint(tool).to_string(),
        }
    }

    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        Self::Io(format!("{context}: {err}"))
    }
}

pub type DownloadResult = std::result::Result<DownloadOutcome, DownloadFailure>;

/// Side effects the orchestration depends on.
pub trait Toolchain {
    /// Run yt-dlp with the given arguments. Non-zero exits are reported in
    /// the result, not as errors.
    fn extract(&self, args: &[String]) -> urlvideo_av::Result<AttemptResult>;

    /// Mux a video and an audio file into `output`.
    fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        mode: MuxMode,
    ) -> urlvideo_av::Result<()>;

    /// Whether `file` has at least one audio stream.
    fn has_audio_stream(&self, file: &Path) -> urlvideo_av::Result<bool>;

    /// Shell-quoted yt-dlp command line for display.
    fn describe(&self, args: &[String]) -> String;

    /// Directory passed to `--ffmpeg-location`.
    fn ffmpeg_location(&self) -> Option<PathBuf> {
        None
    }
}

/// The real tools, launched with an explicit environment.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    pub paths: ToolPaths,
    pub env: ToolEnvironment,
    pub timeout: Option<Duration>,
}

impl ExternalTools {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            paths: config.tool_paths(),
            env: ToolEnvironment::from_host(),
            timeout: config.tool_timeout(),
        }
    }

    fn yt_dlp(&self, args: &[String]) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.paths.yt_dlp);
        cmd.args(args.iter().cloned())
            .env(self.env.clone())
            .timeout(self.timeout);
        cmd
    }
}

impl Toolchain for ExternalTools {
    fn extract(&self, args: &[String]) -> urlvideo_av::Result<AttemptResult> {
        self.yt_dlp(args).run().map(AttemptResult::from)
    }

    fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        mode: MuxMode,
    ) -> urlvideo_av::Result<()> {
        mux_streams(&self.paths.ffmpeg, video, audio, output, mode, &self.env, self.timeout)
    }

    fn has_audio_stream(&self, file: &Path) -> urlvideo_av::Result<bool> {
        probe::has_audio_stream(&self.paths.ffprobe, file, &self.env, self.timeout)
    }

    fn describe(&self, args: &[String]) -> String {
        self.yt_dlp(args).display()
    }

    fn ffmpeg_location(&self) -> Option<PathBuf> {
        self.paths.ffmpeg_location().map(Path::to_path_buf)
    }
}

/// Runs downloads against a [`Toolchain`].
pub struct Downloader<T> {
    tools: T,
    locator: Locator,
    max_retries: u32,
    socket_timeout: Option<u64>,
}

impl Downloader<ExternalTools> {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ExternalTools::from_config(config),
            Locator::new(config.stability_timeout()),
            config.max_retries,
        )
        .with_socket_timeout(config.socket_timeout())
    }
}

impl<T: Toolchain> Downloader<T> {
    pub fn new(tools: T, locator: Locator, max_retries: u32) -> Self {
        Self {
            tools,
            locator,
            max_retries,
            socket_timeout: None,
        }
    }

    /// Pass `--socket-timeout` to every yt-dlp run.
    pub fn with_socket_timeout(mut self, secs: Option<u64>) -> Self {
        self.socket_timeout = secs;
        self
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    /// Download a single video and verify it carries audio.
    pub fn video(&self, req: &DownloadRequest) -> DownloadResult {
        video::download_video(self, req)
    }

    /// Extract audio from a URL.
    pub fn audio(&self, req: &DownloadRequest, settings: &AudioSettings) -> DownloadResult {
        audio::download_audio(self, req, settings)
    }

    /// Download every video of a playlist, rescuing unmerged items.
    pub fn playlist_video(&self, req: &DownloadRequest) -> DownloadResult {
        playlist::download_playlist_video(self, req)
    }

    /// Extract audio from every item of a playlist.
    pub fn playlist_audio(
        &self,
        req: &DownloadRequest,
        settings: &AudioSettings,
    ) -> DownloadResult {
        let req = DownloadRequest {
            playlist: true,
            ..req.clone()
        };
        audio::download_audio(self, &req, settings)
    }

    /// Verify the final file has audio; a probe error counts as failure.
    fn verify_audio(&self, path: &Path) -> Result<(), DownloadFailure> {
        match self.tools.has_audio_stream(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(DownloadFailure::NoAudioStream {
                path: path.to_path_buf(),
            }),
            Err(e) if e.is_tool_not_found() => Err(DownloadFailure::tool_not_found(
                urlvideo_av::tools::FFPROBE,
            )),
            Err(e) => Err(DownloadFailure::AudioCheckFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Validate `route` and build the directory files of `kind` from `url`
/// land in. Nothing is created.
pub fn resolve_output_dir(
    config: &AppConfig,
    policy: &PathPolicy,
    base: &Path,
    route: &Path,
    url: &str,
    kind: MediaKind,
) -> Result<PathBuf, DownloadFailure> {
    let route = policy
        .ensure_safe(base, route)
        .map_err(|e| DownloadFailure::UnsafePath(e.to_string()))?;
    let dir = config.output_dir(&route, Platform::detect(url), kind);
    policy
        .ensure_safe(base, &dir)
        .map_err(|e| DownloadFailure::UnsafePath(e.to_string()))
}

/// Create the output directory unless this is a dry run.
pub(crate) fn prepare_dir(req: &DownloadRequest) -> Result<(), DownloadFailure> {
    if req.dry_run {
        return Ok(());
    }
    std::fs::create_dir_all(&req.output_dir).map_err(|e| {
        DownloadFailure::io(
            &format!("cannot create {}", req.output_dir.display()),
            e,
        )
    })
}

/// Reject anything that is not an http(s) URL.
pub(crate) fn check_url(url: &str) -> Result<(), DownloadFailure> {
    if urlvideo_common::platform::is_valid_url(url) {
        Ok(())
    } else {
        Err(DownloadFailure::InvalidUrl(url.to_string()))
    }
}
