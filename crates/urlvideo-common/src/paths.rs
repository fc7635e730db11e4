//! Path safety validation and output-file classification.
//!
//! Before anything is written, a destination is checked against the
//! configured base directory. A target is accepted when it resolves inside
//! the base, or when it lies under one of the allow-listed external storage
//! mounts (Android shared storage and its Termux alias by default).
//!
//! The second half of this module classifies files left in an output
//! directory by the extraction tool: merged results versus the separate
//! `{id}.f<format>.{ext}` components it downloads before muxing.

use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// External storage mounts accepted regardless of the base directory.
pub const DEFAULT_EXTERNAL_MOUNTS: &[&str] = &["/storage/emulated/0", "~/storage"];

/// Extensions a video-only component is downloaded with.
const VIDEO_COMPONENT_EXTENSIONS: &[&str] = &["mp4"];

/// Extensions an audio-only component is downloaded with.
const AUDIO_COMPONENT_EXTENSIONS: &[&str] = &["webm", "m4a"];

/// `.f<format-id>.<ext>` suffix of an unmerged component.
static COMPONENT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.f[\w-]+\.[A-Za-z0-9]+$").unwrap());

/// Allow-list driven path validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPolicy {
    external_mounts: Vec<PathBuf>,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EXTERNAL_MOUNTS.iter().map(|m| expand_home(m)))
    }
}

/// Replace a leading `~` with `$HOME`, when set.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

impl PathPolicy {
    /// Create a policy with the given allow-listed mounts. Mounts should
    /// already be tilde-expanded by the caller.
    pub fn new<I, P>(mounts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            external_mounts: mounts
                .into_iter()
                .map(|m| lexical_normalize(&absolutize(&unify_separators(&m.into()))))
                .collect(),
        }
    }

    /// Allow-listed mounts in normalized form.
    pub fn external_mounts(&self) -> &[PathBuf] {
        &self.external_mounts
    }

    /// Whether `target` may be written given `base`.
    pub fn is_safe(&self, base: &Path, target: &Path) -> bool {
        let target = absolutize(&unify_separators(target));

        let lexical = lexical_normalize(&target);
        if self
            .external_mounts
            .iter()
            .any(|mount| lexical.starts_with(mount))
        {
            return true;
        }

        let base = resolve(&absolutize(&unify_separators(base)));
        resolve(&target).starts_with(&base)
    }

    /// Check `target` and return its normalized form, or an `UnsafePath`
    /// error naming both paths.
    pub fn ensure_safe(&self, base: &Path, target: &Path) -> Result<PathBuf> {
        if self.is_safe(base, target) {
            Ok(lexical_normalize(&absolutize(&unify_separators(target))))
        } else {
            Err(Error::unsafe_path(target, base))
        }
    }
}

/// Check a target against a base with the default mount allow-list.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use urlvideo_common::paths::is_safe_path;
///
/// assert!(is_safe_path(Path::new("/home/user"), Path::new("/home/user/downloads")));
/// assert!(!is_safe_path(Path::new("/home/user"), Path::new("/home/user/../etc")));
/// ```
pub fn is_safe_path(base: &Path, target: &Path) -> bool {
    PathPolicy::default().is_safe(base, target)
}

/// Replace `\` separators with `/` so they cannot hide `..` segments.
fn unify_separators(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    if raw.contains('\\') {
        PathBuf::from(raw.replace('\\', "/"))
    } else {
        path.to_path_buf()
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| Path::new("/").join(path))
    }
}

/// Fold `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a path one component at a time, following symlinks for every
/// prefix that exists on disk. Non-existent tails are folded lexically.
fn resolve(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => {
                out.push(other.as_os_str());
                if let Ok(real) = std::fs::canonicalize(&out) {
                    out = real;
                }
            }
        }
    }
    out
}

/// Whether the file name carries the `.f<format>.<ext>` component suffix.
///
/// ```
/// use std::path::Path;
/// use urlvideo_common::paths::is_component_file;
///
/// assert!(is_component_file(Path::new("abc.f137.mp4")));
/// assert!(!is_component_file(Path::new("abc.mp4")));
/// ```
pub fn is_component_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| COMPONENT_SUFFIX.is_match(name))
        .unwrap_or(false)
}

/// Case-insensitive extension comparison.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Whether the file name starts with the given media ID.
pub fn matches_media_id(path: &Path, media_id: &str) -> bool {
    !media_id.is_empty()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(media_id))
            .unwrap_or(false)
}

/// Whether a file can serve as the video side of a manual remux.
pub fn is_video_component(path: &Path) -> bool {
    VIDEO_COMPONENT_EXTENSIONS
        .iter()
        .any(|ext| has_extension(path, ext))
}

/// Whether a file can serve as the audio side of a manual remux.
pub fn is_audio_component(path: &Path) -> bool {
    AUDIO_COMPONENT_EXTENSIONS
        .iter()
        .any(|ext| has_extension(path, ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parent_dir_escape_rejected() {
        assert!(!is_safe_path(
            Path::new("/home/user"),
            Path::new("/home/user/../etc")
        ));
    }

    #[test]
    fn test_child_accepted() {
        assert!(is_safe_path(
            Path::new("/home/user"),
            Path::new("/home/user/downloads")
        ));
        assert!(is_safe_path(Path::new("/home/user"), Path::new("/home/user")));
    }

    #[test]
    fn test_sibling_prefix_rejected() {
        assert!(!is_safe_path(
            Path::new("/home/user"),
            Path::new("/home/username/x")
        ));
    }

    #[test]
    fn test_external_mount_accepted() {
        assert!(is_safe_path(
            Path::new("/home/user"),
            Path::new("/storage/emulated/0/Download")
        ));
    }

    #[test]
    fn test_external_mount_escape_rejected() {
        assert!(!is_safe_path(
            Path::new("/home/user"),
            Path::new("/storage/emulated/0/../../etc")
        ));
    }

    #[test]
    fn test_backslash_separators_cannot_escape() {
        assert!(!is_safe_path(
            Path::new("/home/user"),
            Path::new("/home/user\\..\\..\\etc")
        ));
    }

    #[test]
    fn test_custom_mounts() {
        let policy = PathPolicy::new(["/mnt/sdcard"]);
        assert!(policy.is_safe(Path::new("/home/user"), Path::new("/mnt/sdcard/a")));
        assert!(!policy.is_safe(
            Path::new("/home/user"),
            Path::new("/storage/emulated/0/a")
        ));
    }

    #[test]
    fn test_ensure_safe_error() {
        let policy = PathPolicy::default();
        let err = policy
            .ensure_safe(Path::new("/home/user"), Path::new("/etc/passwd"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsafePath { .. }));

        let ok = policy
            .ensure_safe(Path::new("/home/user"), Path::new("/home/user/./a/../b"))
            .unwrap();
        assert_eq!(ok, PathBuf::from("/home/user/b"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let base = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let link = base.path().join("link");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let policy = PathPolicy::new(Vec::<PathBuf>::new());
        assert!(!policy.is_safe(base.path(), &link.join("file.mp4")));
        assert!(policy.is_safe(base.path(), &base.path().join("real/file.mp4")));
    }

    #[test]
    fn test_component_classification() {
        assert!(is_component_file(Path::new("/d/abc.f137.mp4")));
        assert!(is_component_file(Path::new("abc.f251.webm")));
        assert!(is_component_file(Path::new("abc.fhls-720p.mp4")));
        assert!(!is_component_file(Path::new("abc.mp4")));
        assert!(!is_component_file(Path::new("abc_rescued.mp4")));

        assert!(is_video_component(Path::new("abc.f137.MP4")));
        assert!(is_audio_component(Path::new("abc.f140.m4a")));
        assert!(is_audio_component(Path::new("abc.f251.webm")));
        assert!(!is_audio_component(Path::new("abc.mp4")));
    }

    #[test]
    fn test_matches_media_id() {
        assert!(matches_media_id(Path::new("/d/abc.mp4"), "abc"));
        assert!(matches_media_id(Path::new("abc_merged.mp4"), "abc"));
        assert!(!matches_media_id(Path::new("xabc.mp4"), "abc"));
        assert!(!matches_media_id(Path::new("abc.mp4"), ""));
    }
}
