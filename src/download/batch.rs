//! Sequential processing of a URL list.

use std::path::Path;

use urlvideo_common::MediaKind;

use super::{DownloadFailure, DownloadResult};
use crate::config::AppConfig;

/// Tally of a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<(String, DownloadFailure)>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Read newline-delimited URLs, skipping blank lines.
pub fn read_batch_file(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Whether `option` names a quality (video) or format (audio) known to the
/// config.
pub fn is_valid_batch_option(config: &AppConfig, kind: MediaKind, option: &str) -> bool {
    match kind {
        MediaKind::Video => config.video_quality_map.contains_key(option),
        MediaKind::Audio => config.audio_format_map.contains_key(option),
    }
}

/// Run `download` for each URL in order. `download` receives the 1-based
/// position and the URL; a failure never stops the batch.
pub fn run_batch<F>(urls: &[String], mut download: F) -> BatchSummary
where
    F: FnMut(usize, &str) -> DownloadResult,
{
    let mut summary = BatchSummary {
        total: urls.len(),
        ..Default::default()
    };

    for (i, url) in urls.iter().enumerate() {
        match download(i + 1, url) {
            Ok(_) => summary.succeeded += 1,
            Err(failure) => summary.failures.push((url.clone(), failure)),
        }
    }

    tracing::info!(
        "Batch finished: {}/{} succeeded",
        summary.succeeded,
        summary.total
    );
    summary
}
