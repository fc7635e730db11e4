//! Manual muxing of separate video and audio streams.

use crate::command::ToolCommand;
use crate::env::ToolEnvironment;
use crate::{Error, Result};
use std::path::Path;
use std::time::Duration;

/// How the audio stream is carried into the merged container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxMode {
    /// Copy video, re-encode audio to AAC, map first video and first audio.
    TranscodeAudio,
    /// Copy every stream as-is.
    StreamCopy,
}

impl MuxMode {
    fn codec_args(&self) -> &'static [&'static str] {
        match self {
            MuxMode::TranscodeAudio => &[
                "-c:v", "copy", "-c:a", "aac", "-map", "0:v:0", "-map", "1:a:0",
            ],
            MuxMode::StreamCopy => &["-c", "copy"],
        }
    }
}

/// Build the ffmpeg invocation muxing `video` and `audio` into `output`.
pub fn mux_command(
    ffmpeg: &Path,
    video: &Path,
    audio: &Path,
    output: &Path,
    mode: MuxMode,
) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg);
    cmd.args(["-y", "-i"])
        .arg_path(video)
        .arg("-i")
        .arg_path(audio)
        .args(mode.codec_args().iter().copied())
        .arg_path(output);
    cmd
}

/// Mux `video` and `audio` into `output`, overwriting it.
///
/// Inputs are left untouched; removing them is the caller's decision.
///
/// # Errors
///
/// [`Error::FileNotFound`] when an input is missing, otherwise whatever
/// running ffmpeg returns.
pub fn mux_streams(
    ffmpeg: &Path,
    video: &Path,
    audio: &Path,
    output: &Path,
    mode: MuxMode,
    env: &ToolEnvironment,
    timeout: Option<Duration>,
) -> Result<()> {
    for input in [video, audio] {
        if !input.exists() {
            return Err(Error::file_not_found(input));
        }
    }

    tracing::info!(
        "Muxing {} + {} -> {} ({:?})",
        video.display(),
        audio.display(),
        output.display(),
        mode
    );

    mux_command(ffmpeg, video, audio, output, mode)
        .env(env.clone())
        .timeout(timeout)
        .execute()?;

    Ok(())
}
