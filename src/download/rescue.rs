//! Manual remux of leftover video and audio components.

use std::path::{Path, PathBuf};

use urlvideo_av::actions::MuxMode;
use urlvideo_av::tools::FFMPEG;

use super::locate::Components;
use super::{DownloadFailure, Toolchain};

/// A successful rescue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescueOutcome {
    pub merged: PathBuf,
    /// Whether both component files were removed afterwards.
    pub cleanup_performed: bool,
}

fn rescue_plan(dir: &Path, media_id: &str) -> [(MuxMode, PathBuf); 2] {
    [
        (MuxMode::TranscodeAudio, dir.join(format!("{media_id}_rescued.mp4"))),
        (MuxMode::StreamCopy, dir.join(format!("{media_id}_merged.mp4"))),
    ]
}

/// Merge `components` into `{media_id}_rescued.mp4`, falling back to a plain
/// stream copy into `{media_id}_merged.mp4`.
///
/// Components are deleted only once a merge produced a non-empty file. A
/// failed attempt removes its own partial output unless that path already
/// existed beforehand.
pub fn rescue_components<T: Toolchain>(
    tools: &T,
    components: &Components,
    dir: &Path,
    media_id: &str,
) -> Result<RescueOutcome, DownloadFailure> {
    tracing::info!(
        "Rescuing {} from {} and {}",
        media_id,
        components.video.display(),
        components.audio.display()
    );

    let mut last_error = String::new();

    for (mode, output) in rescue_plan(dir, media_id) {
        let existed = output.exists();

        match tools.mux(&components.video, &components.audio, &output, mode) {
            Ok(()) if is_non_empty(&output) => {
                let cleanup_performed = remove_components(components);
                tracing::info!("Rescued {} into {}", media_id, output.display());
                return Ok(RescueOutcome {
                    merged: output,
                    cleanup_performed,
                });
            }
            Ok(()) => {
                last_error = format!("{} is missing or empty after muxing", output.display());
            }
            Err(e) if e.is_tool_not_found() => {
                return Err(DownloadFailure::tool_not_found(FFMPEG));
            }
            Err(e) => last_error = e.to_string(),
        }

        tracing::warn!("Remux ({:?}) failed: {}", mode, last_error);
        if !existed && output.exists() {
            if let Err(e) = std::fs::remove_file(&output) {
                tracing::warn!("Could not remove {}: {}", output.display(), e);
            }
        }
    }

    Err(DownloadFailure::RescueFailed(last_error))
}

fn is_non_empty(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

fn remove_components(components: &Components) -> bool {
    let mut removed = true;
    for file in [&components.video, &components.audio] {
        if let Err(e) = std::fs::remove_file(file) {
            tracing::warn!("Could not remove component {}: {}", file.display(), e);
            removed = false;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::AttemptResult;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use tempfile::tempdir;

    /// Mux fake: writes the output for modes listed in `working`.
    struct MuxOnly {
        working: Vec<MuxMode>,
        calls: RefCell<Vec<MuxMode>>,
    }

    impl MuxOnly {
        fn new(working: &[MuxMode]) -> Self {
            Self {
                working: working.to_vec(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Toolchain for MuxOnly {
        fn extract(&self, _args: &[String]) -> urlvideo_av::Result<AttemptResult> {
            unreachable!()
        }

        fn mux(
            &self,
            _video: &Path,
            _audio: &Path,
            output: &Path,
            mode: MuxMode,
        ) -> urlvideo_av::Result<()> {
            self.calls.borrow_mut().push(mode);
            if self.working.contains(&mode) {
                std::fs::write(output, b"merged").unwrap();
                Ok(())
            } else {
                std::fs::write(output, b"partial").unwrap();
                Err(urlvideo_av::Error::tool_failed("ffmpeg", Some(1), "Invalid data"))
            }
        }

        fn has_audio_stream(&self, _file: &Path) -> urlvideo_av::Result<bool> {
            Ok(true)
        }

        fn describe(&self, args: &[String]) -> String {
            args.join(" ")
        }
    }

    fn components(dir: &Path) -> Components {
        let video = dir.join("abc.f137.mp4");
        let audio = dir.join("abc.f251.webm");
        std::fs::write(&video, b"v").unwrap();
        std::fs::write(&audio, b"a").unwrap();
        Components { video, audio }
    }

    #[test]
    fn test_transcode_success_removes_components() {
        let dir = tempdir().unwrap();
        let parts = components(dir.path());
        let tools = MuxOnly::new(&[MuxMode::TranscodeAudio]);

        let outcome = rescue_components(&tools, &parts, dir.path(), "abc").unwrap();
        assert_eq!(outcome.merged, dir.path().join("abc_rescued.mp4"));
        assert!(outcome.cleanup_performed);
        assert!(!parts.video.exists());
        assert!(!parts.audio.exists());
        assert_eq!(*tools.calls.borrow(), vec![MuxMode::TranscodeAudio]);
    }

    #[test]
    fn test_falls_back_to_stream_copy() {
        let dir = tempdir().unwrap();
        let parts = components(dir.path());
        let tools = MuxOnly::new(&[MuxMode::StreamCopy]);

        let outcome = rescue_components(&tools, &parts, dir.path(), "abc").unwrap();
        assert_eq!(outcome.merged, dir.path().join("abc_merged.mp4"));
        assert!(!dir.path().join("abc_rescued.mp4").exists());
    }

    #[test]
    fn test_failure_keeps_components() {
        let dir = tempdir().unwrap();
        let parts = components(dir.path());
        let tools = MuxOnly::new(&[]);

        let result = rescue_components(&tools, &parts, dir.path(), "abc");
        assert_matches!(result, Err(DownloadFailure::RescueFailed(_)));
        assert!(parts.video.exists());
        assert!(parts.audio.exists());
        assert!(!dir.path().join("abc_rescued.mp4").exists());
        assert!(!dir.path().join("abc_merged.mp4").exists());
    }

    #[test]
    fn test_failure_keeps_preexisting_output() {
        let dir = tempdir().unwrap();
        let parts = components(dir.path());
        let earlier = dir.path().join("abc_rescued.mp4");
        std::fs::write(&earlier, b"earlier").unwrap();

        let tools = MuxOnly::new(&[]);
        assert!(rescue_components(&tools, &parts, dir.path(), "abc").is_err());
        assert!(earlier.exists());
    }
}
