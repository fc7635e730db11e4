//! Platform detection and media-ID derivation from URLs.
//!
//! The platform decides which subdirectory a download lands in, and the
//! media ID is the file-name prefix the extraction tool writes under
//! (`%(id)s.%(ext)s`), which the result locator later scans for.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

static YOUTUBE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com|youtu\.be").unwrap());
static TIKTOK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"tiktok\.com").unwrap());
static FACEBOOK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"facebook\.com|fb\.watch").unwrap());
static INSTAGRAM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"instagram\.com").unwrap());
static TWITTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"twitter\.com|x\.com").unwrap());

/// 11-character YouTube video ID.
static VIDEO_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").unwrap());

/// Path prefixes after which YouTube places the video ID.
const YOUTUBE_ID_SEGMENTS: &[&str] = &["shorts", "embed", "live", "v"];

/// Source platform of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    TikTok,
    Facebook,
    Instagram,
    #[serde(rename = "Twitter-X")]
    TwitterX,
    Generic,
}

impl Platform {
    /// Detect the platform a URL belongs to. Order matters: the first
    /// matching pattern wins.
    pub fn detect(url: &str) -> Self {
        let table: [(&LazyLock<Regex>, Platform); 5] = [
            (&YOUTUBE_REGEX, Platform::YouTube),
            (&TIKTOK_REGEX, Platform::TikTok),
            (&FACEBOOK_REGEX, Platform::Facebook),
            (&INSTAGRAM_REGEX, Platform::Instagram),
            (&TWITTER_REGEX, Platform::TwitterX),
        ];

        table
            .iter()
            .find(|(regex, _)| regex.is_match(url))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Generic)
    }

    /// Directory name used for this platform's downloads.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::TikTok => "TikTok",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::TwitterX => "Twitter-X",
            Self::Generic => "Generic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Whether a URL points at short-form content (`/shorts/`).
pub fn is_short(url: &str) -> bool {
    url.contains("/shorts/")
}

/// Whether a string looks like a downloadable URL.
pub fn is_valid_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Derive the ID the extraction tool will use as the output file name.
///
/// YouTube IDs are taken from the `v` query parameter or from the path
/// (`youtu.be/<id>`, `/shorts/<id>`, `/embed/<id>`, `/live/<id>`). Anything
/// else falls back to the last non-empty path segment.
pub fn derive_media_id(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(parsed) => youtube_id(&parsed).unwrap_or_else(|| last_segment(&parsed)),
        Err(_) => fallback_segment(url),
    }
}

fn youtube_id(url: &Url) -> Option<String> {
    if let Some((_, v)) = url.query_pairs().find(|(key, _)| key == "v") {
        if VIDEO_ID_REGEX.is_match(&v) {
            return Some(v.into_owned());
        }
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let host = url.host_str().unwrap_or("");

    if host.ends_with("youtu.be") {
        return segments
            .first()
            .filter(|s| VIDEO_ID_REGEX.is_match(s))
            .map(|s| s.to_string());
    }

    segments
        .windows(2)
        .find(|pair| YOUTUBE_ID_SEGMENTS.contains(&pair[0]) && VIDEO_ID_REGEX.is_match(pair[1]))
        .map(|pair| pair[1].to_string())
}

fn last_segment(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string())
        .unwrap_or_else(|| url.host_str().unwrap_or_default().to_string())
}

fn fallback_segment(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(without_query)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_platform() {
        assert_eq!(
            Platform::detect("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Platform::YouTube
        );
        assert_eq!(Platform::detect("https://youtu.be/dQw4w9WgXcQ"), Platform::YouTube);
        assert_eq!(
            Platform::detect("https://www.tiktok.com/@user/video/123"),
            Platform::TikTok
        );
        assert_eq!(Platform::detect("https://fb.watch/abc/"), Platform::Facebook);
        assert_eq!(
            Platform::detect("https://www.instagram.com/reel/xyz/"),
            Platform::Instagram
        );
        assert_eq!(
            Platform::detect("https://x.com/user/status/1"),
            Platform::TwitterX
        );
        assert_eq!(
            Platform::detect("https://vimeo.com/123456"),
            Platform::Generic
        );
    }

    #[test]
    fn test_platform_dir_name() {
        assert_eq!(Platform::TwitterX.to_string(), "Twitter-X");
        assert_eq!(Platform::YouTube.dir_name(), "YouTube");
    }

    #[test]
    fn test_is_short() {
        assert!(is_short("https://www.youtube.com/shorts/abcdefghijk"));
        assert!(!is_short("https://www.youtube.com/watch?v=abcdefghijk"));
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://example.com/v"));
        assert!(is_valid_url("  http://example.com "));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_media_id_from_watch_url() {
        assert_eq!(
            derive_media_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_media_id_from_path_forms() {
        assert_eq!(derive_media_id("https://youtu.be/dQw4w9WgXcQ?si=x"), "dQw4w9WgXcQ");
        assert_eq!(
            derive_media_id("https://www.youtube.com/shorts/abc_DEF-123"),
            "abc_DEF-123"
        );
        assert_eq!(
            derive_media_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_media_id_generic_fallback() {
        assert_eq!(
            derive_media_id("https://www.tiktok.com/@user/video/7301234567890?lang=en"),
            "7301234567890"
        );
        assert_eq!(derive_media_id("https://vimeo.com/123456/"), "123456");
        assert_eq!(derive_media_id("not a url/clip?x=1"), "clip");
    }
}
