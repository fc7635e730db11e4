//! Finding the merged result (or its leftover components) on disk.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use urlvideo_common::paths::{
    has_extension, is_audio_component, is_component_file, is_video_component, matches_media_id,
};

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Markers of files yt-dlp is still writing or has not finalised.
const IN_PROGRESS_MARKERS: &[&str] = &[".part", ".ytdl", ".temp."];

/// A candidate result and whether its size settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    pub path: PathBuf,
    pub size: u64,
    pub stable: bool,
}

/// Separate video-only and audio-only downloads of one media ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    pub video: PathBuf,
    pub audio: PathBuf,
}

/// Scans an output directory and waits for file sizes to stop changing.
#[derive(Debug, Clone)]
pub struct Locator {
    timeout: Duration,
    interval: Duration,
    settle_delay: Duration,
}

impl Locator {
    /// Poll every 500 ms after a 1 s settle delay, giving up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: POLL_INTERVAL,
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn with_intervals(timeout: Duration, interval: Duration, settle_delay: Duration) -> Self {
        Self {
            timeout,
            interval,
            settle_delay,
        }
    }

    /// Find the first stable `{media_id}*.{ext}` file that is not a
    /// component. Exact `{media_id}.{ext}` is checked first.
    ///
    /// All candidates share one `timeout`. A candidate reached after the
    /// deadline still gets two poll intervals to settle.
    pub fn locate(&self, dir: &Path, media_id: &str, ext: &str) -> Option<LocatedFile> {
        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }

        let deadline = Instant::now() + self.timeout;
        for path in merged_candidates(dir, media_id, ext) {
            let until = deadline.max(Instant::now() + self.interval * 2);
            let located = self.wait_stable(&path, until);
            if located.stable {
                tracing::debug!("Located {} ({} bytes)", located.path.display(), located.size);
                return Some(located);
            }
            tracing::debug!("{} did not settle before the deadline", path.display());
        }
        None
    }

    /// Poll the size of `path` in pairs until two successive reads agree on a
    /// non-zero size or the deadline passes.
    pub fn wait_stable(&self, path: &Path, deadline: Instant) -> LocatedFile {
        let mut last = file_size(path);
        loop {
            std::thread::sleep(self.interval);
            let current = file_size(path);

            if let (Some(before), Some(now)) = (last, current) {
                if before == now && now > 0 {
                    return LocatedFile {
                        path: path.to_path_buf(),
                        size: now,
                        stable: true,
                    };
                }
            }

            if Instant::now() >= deadline {
                return LocatedFile {
                    path: path.to_path_buf(),
                    size: current.unwrap_or(0),
                    stable: false,
                };
            }
            last = current;
        }
    }
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}

fn is_in_progress(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| IN_PROGRESS_MARKERS.iter().any(|m| name.contains(m)))
        .unwrap_or(true)
}

/// Finished files in `dir` whose name starts with `media_id`, sorted by name.
fn files_for(dir: &Path, media_id: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| matches_media_id(path, media_id))
        .filter(|path| !is_in_progress(path))
        .collect();
    files.sort();
    files
}

/// Non-component `{media_id}*.{ext}` files, exact name first.
pub(crate) fn merged_candidates(dir: &Path, media_id: &str, ext: &str) -> Vec<PathBuf> {
    let exact = format!("{media_id}.{ext}");
    let mut candidates: Vec<PathBuf> = files_for(dir, media_id)
        .into_iter()
        .filter(|path| has_extension(path, ext))
        .filter(|path| !is_component_file(path))
        .collect();

    candidates.sort_by_key(|path| {
        path.file_name()
            .map(|n| n != exact.as_str())
            .unwrap_or(true)
    });
    candidates
}

/// Find a video component and an audio file left for `media_id`.
///
/// The video side must carry the `.f<format>` component suffix; the audio
/// side is any `.webm` or `.m4a` for the ID.
pub fn find_components(dir: &Path, media_id: &str) -> Option<Components> {
    let files = files_for(dir, media_id);

    let video = files
        .iter()
        .find(|path| is_component_file(path) && is_video_component(path))?;
    let audio = files.iter().find(|path| is_audio_component(path))?;

    Some(Components {
        video: video.clone(),
        audio: audio.clone(),
    })
}
