//! yt-dlp argument construction.
//!
//! Every invocation shares the same resilience flags
//! (`--ignore-errors --continue --no-overwrites`). Video downloads merge into
//! mp4 and are named after the media ID so the result can be found by
//! scanning the output directory; audio downloads are named after the title.

use std::path::{Path, PathBuf};

/// Flags every invocation carries.
pub const COMMON_FLAGS: &[&str] = &["--ignore-errors", "--continue", "--no-overwrites"];

/// Metadata and thumbnail embedding, applied only on the first attempt.
pub const POST_PROCESS_FLAGS: &[&str] = &["--add-metadata", "--embed-thumbnail"];

/// Output template naming files by media ID.
pub const ID_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Output template naming files by title.
pub const TITLE_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Container merged video is written to.
pub const MERGE_FORMAT: &str = "mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Video { selector: String },
    Audio { format: String, quality: String },
}

/// Argument list for one yt-dlp invocation.
///
/// ```
/// use std::path::Path;
/// use urlvideo_av::YtDlpArgs;
///
/// let args = YtDlpArgs::video("bv*+ba/b", Path::new("/dl"))
///     .post_process(true)
///     .build("https://youtu.be/dQw4w9WgXcQ");
/// assert_eq!(args.last().unwrap(), "https://youtu.be/dQw4w9WgXcQ");
/// assert!(args.iter().any(|a| a == "--embed-thumbnail"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtDlpArgs {
    mode: Mode,
    output_dir: PathBuf,
    post_process: bool,
    playlist: bool,
    ffmpeg_location: Option<PathBuf>,
    socket_timeout: Option<u64>,
    cookies: Option<PathBuf>,
}

impl YtDlpArgs {
    /// Video download with the given format selector into `output_dir`.
    pub fn video(selector: impl Into<String>, output_dir: &Path) -> Self {
        Self::with_mode(
            Mode::Video {
                selector: selector.into(),
            },
            output_dir,
        )
    }

    /// Audio extraction to `format` at `quality` into `output_dir`.
    pub fn audio(format: impl Into<String>, quality: impl Into<String>, output_dir: &Path) -> Self {
        Self::with_mode(
            Mode::Audio {
                format: format.into(),
                quality: quality.into(),
            },
            output_dir,
        )
    }

    fn with_mode(mode: Mode, output_dir: &Path) -> Self {
        Self {
            mode,
            output_dir: output_dir.to_path_buf(),
            post_process: false,
            playlist: false,
            ffmpeg_location: None,
            socket_timeout: None,
            cookies: None,
        }
    }

    /// Embed metadata and thumbnail.
    pub fn post_process(mut self, enabled: bool) -> Self {
        self.post_process = enabled;
        self
    }

    /// Allow playlist expansion. Without it `--no-playlist` is passed.
    pub fn playlist(mut self, enabled: bool) -> Self {
        self.playlist = enabled;
        self
    }

    /// Directory holding ffmpeg and ffprobe.
    pub fn ffmpeg_location(mut self, dir: Option<&Path>) -> Self {
        self.ffmpeg_location = dir.map(Path::to_path_buf);
        self
    }

    /// Netscape-format cookies file.
    pub fn cookies(mut self, file: Option<&Path>) -> Self {
        self.cookies = file.map(Path::to_path_buf);
        self
    }

    /// Seconds yt-dlp waits on a stalled connection before giving up.
    pub fn socket_timeout(mut self, secs: Option<u64>) -> Self {
        self.socket_timeout = secs;
        self
    }

    /// Output template path passed to `-o`.
    pub fn output_template(&self) -> PathBuf {
        match self.mode {
            Mode::Video { .. } => self.output_dir.join(ID_TEMPLATE),
            Mode::Audio { .. } => self.output_dir.join(TITLE_TEMPLATE),
        }
    }

    /// Final argument vector with the URL last.
    pub fn build(&self, url: &str) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        if let Mode::Audio { format, quality } = &self.mode {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                format.clone(),
                "--audio-quality".to_string(),
                quality.clone(),
            ]);
        }

        args.extend(COMMON_FLAGS.iter().map(|s| s.to_string()));

        if let Some(secs) = self.socket_timeout {
            args.push("--socket-timeout".to_string());
            args.push(secs.to_string());
        }

        if let Mode::Video { .. } = self.mode {
            args.push("--merge-output-format".to_string());
            args.push(MERGE_FORMAT.to_string());
        }

        if let Some(dir) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }

        args.push("-o".to_string());
        args.push(self.output_template().to_string_lossy().into_owned());

        if let Mode::Video { selector } = &self.mode {
            args.push("-f".to_string());
            args.push(selector.clone());
        }

        if !self.playlist {
            args.push("--no-playlist".to_string());
        }

        if self.post_process {
            args.extend(POST_PROCESS_FLAGS.iter().map(|s| s.to_string()));
        }

        if let Some(cookies) = &self.cookies {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }

        args.push(url.to_string());
        args
    }
}
