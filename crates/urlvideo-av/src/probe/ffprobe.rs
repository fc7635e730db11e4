//! FFprobe-based stream listing.

use crate::command::ToolCommand;
use crate::env::ToolEnvironment;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
}

/// One stream of a probed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: u32,
    /// `video`, `audio`, `subtitle`, `data` or `attachment`.
    pub codec_type: String,
    pub codec_name: Option<String>,
}

impl StreamInfo {
    pub fn is_audio(&self) -> bool {
        self.codec_type == "audio"
    }
}

/// List the streams of a media file.
///
/// # Errors
///
/// [`Error::FileNotFound`] for a missing file, [`Error::ToolFailed`] when
/// ffprobe rejects it, [`Error::ParseError`] on unexpected output.
pub fn probe_streams(
    ffprobe: &Path,
    file: &Path,
    env: &ToolEnvironment,
    timeout: Option<Duration>,
) -> Result<Vec<StreamInfo>> {
    if !file.exists() {
        return Err(Error::file_not_found(file));
    }

    let output = ToolCommand::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=index,codec_type,codec_name",
            "-of",
            "json",
        ])
        .arg_path(file)
        .env(env.clone())
        .timeout(timeout)
        .execute()?;

    parse_streams(&output.stdout)
}

/// Whether the file contains at least one audio stream.
pub fn has_audio_stream(
    ffprobe: &Path,
    file: &Path,
    env: &ToolEnvironment,
    timeout: Option<Duration>,
) -> Result<bool> {
    let streams = probe_streams(ffprobe, file, env, timeout)?;
    let found = streams.iter().any(StreamInfo::is_audio);
    tracing::debug!(
        "{}: {} stream(s), audio present: {}",
        file.display(),
        streams.len(),
        found
    );
    Ok(found)
}

fn parse_streams(json: &str) -> Result<Vec<StreamInfo>> {
    if json.trim().is_empty() {
        return Err(Error::parse_error("ffprobe", "empty output"));
    }

    let parsed: FfprobeOutput = serde_json::from_str(json)?;
    Ok(parsed
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            index: s.index,
            codec_type: s.codec_type.unwrap_or_default(),
            codec_name: s.codec_name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_with_audio() {
        let json = r#"{
            "programs": [],
            "streams": [
                {"index": 0, "codec_name": "h264", "codec_type": "video"},
                {"index": 1, "codec_name": "aac", "codec_type": "audio"}
            ]
        }"#;
        let streams = parse_streams(json).unwrap();
        assert_eq!(streams.len(), 2);
        assert!(streams.iter().any(StreamInfo::is_audio));
        assert_eq!(streams[1].codec_name.as_deref(), Some("aac"));
    }

    #[test]
    fn test_parse_video_only() {
        let json = r#"{"streams": [{"index": 0, "codec_name": "vp9", "codec_type": "video"}]}"#;
        let streams = parse_streams(json).unwrap();
        assert!(!streams.iter().any(StreamInfo::is_audio));
    }

    #[test]
    fn test_parse_no_streams_key() {
        assert!(parse_streams("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_streams("  "), Err(Error::ParseError { .. })));
        assert!(matches!(parse_streams("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = has_audio_stream(
            Path::new("ffprobe"),
            Path::new("/nonexistent/clip.mp4"),
            &ToolEnvironment::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
