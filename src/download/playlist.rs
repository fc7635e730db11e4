use std::collections::BTreeSet;
use std::path::Path;

use urlvideo_common::paths::{is_component_file, is_video_component};
use urlvideo_common::Platform;

use super::locate::{find_components, merged_candidates};
use super::rescue::rescue_components;
use super::strategy::{run_ladder, strategies_for};
use super::video::{dry_run, video_args};
use super::{
    check_url, prepare_dir, DownloadOutcome, DownloadRequest, DownloadResult, Downloader,
    Toolchain,
};

/// Media IDs with a video component in `dir` but no merged file.
fn orphaned_ids(dir: &Path) -> BTreeSet<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return BTreeSet::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_component_file(path) && is_video_component(path))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            stem.rsplit_once(".f").map(|(id, _)| id.to_string())
        })
        .filter(|id| merged_candidates(dir, id, "mp4").is_empty())
        .collect()
}

/// Rescue every playlist item left as separate components. Per-item
/// failures are logged and skipped.
fn rescue_orphans<T: Toolchain>(downloader: &Downloader<T>, dir: &Path) -> usize {
    let mut rescued = 0;

    for media_id in orphaned_ids(dir) {
        let Some(components) = find_components(dir, &media_id) else {
            tracing::warn!("{} has a video component but no audio to merge", media_id);
            continue;
        };

        let result = rescue_components(&downloader.tools, &components, dir, &media_id)
            .and_then(|outcome| downloader.verify_audio(&outcome.merged));
        match result {
            Ok(()) => rescued += 1,
            Err(failure) => tracing::warn!("Playlist item {} not rescued: {}", media_id, failure),
        }
    }

    rescued
}

pub(super) fn download_playlist_video<T: Toolchain>(
    downloader: &Downloader<T>,
    req: &DownloadRequest,
) -> DownloadResult {
    check_url(&req.url)?;

    let req = DownloadRequest {
        playlist: true,
        ..req.clone()
    };
    let ladder = strategies_for(&req.url, &req.selector, downloader.max_retries);
    if req.dry_run {
        return Ok(dry_run(downloader, &req, &ladder));
    }

    prepare_dir(&req)?;
    let platform = Platform::detect(&req.url);
    tracing::info!(url = %req.url, platform = %platform, "Starting playlist download");

    let result = run_ladder(&ladder, |_, strategy| {
        let args = video_args(downloader, &req, strategy);
        tracing::info!("Running: {}", downloader.tools.describe(&args));
        downloader.tools.extract(&args)
    });
    if let Err(failure) = result {
        tracing::error!(
            url = %req.url,
            platform = %platform,
            "Playlist download failed: {}",
            failure
        );
        return Err(failure);
    }

    let rescued = rescue_orphans(downloader, &req.output_dir);
    tracing::info!(
        url = %req.url,
        platform = %platform,
        "Playlist download complete ({} item(s) rescued)",
        rescued
    );

    Ok(DownloadOutcome::Extracted {
        dir: req.output_dir.clone(),
        rescued,
    })
}
