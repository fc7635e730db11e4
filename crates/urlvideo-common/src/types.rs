//! Core type definitions shared by the tool layer and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a download produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Merged video with an audio track.
    Video,
    /// Extracted audio only.
    Audio,
}

impl MediaKind {
    /// Name of the per-platform subdirectory files of this kind land in.
    pub fn subdir(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subdir())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" | "v" => Ok(Self::Video),
            "audio" | "a" => Ok(Self::Audio),
            _ => Err(format!("Invalid media kind: {}", s)),
        }
    }
}
