use urlvideo_av::YtDlpArgs;
use urlvideo_common::platform::derive_media_id;
use urlvideo_common::Platform;

use super::locate::find_components;
use super::rescue::rescue_components;
use super::strategy::{run_ladder, strategies_for, FormatStrategy};
use super::{
    check_url, prepare_dir, DownloadFailure, DownloadOutcome, DownloadRequest, DownloadResult,
    Downloader, Toolchain,
};

/// Extension merged video is located by.
const MERGED_EXT: &str = "mp4";

/// yt-dlp arguments for one rung of the ladder.
pub(super) fn video_args<T: Toolchain>(
    downloader: &Downloader<T>,
    req: &DownloadRequest,
    strategy: &FormatStrategy,
) -> Vec<String> {
    let ffmpeg_location = downloader.tools.ffmpeg_location();
    YtDlpArgs::video(strategy.selector.as_str(), &req.output_dir)
        .post_process(strategy.post_process)
        .playlist(req.playlist)
        .ffmpeg_location(ffmpeg_location.as_deref())
        .socket_timeout(downloader.socket_timeout)
        .cookies(req.cookies.as_deref())
        .build(&req.url)
}

/// Shell-quoted command of the first rung, for dry runs.
pub(super) fn dry_run<T: Toolchain>(
    downloader: &Downloader<T>,
    req: &DownloadRequest,
    ladder: &[FormatStrategy],
) -> DownloadOutcome {
    let command = ladder
        .first()
        .map(|strategy| downloader.tools.describe(&video_args(downloader, req, strategy)))
        .unwrap_or_default();
    DownloadOutcome::DryRun { command }
}

pub(super) fn download_video<T: Toolchain>(
    downloader: &Downloader<T>,
    req: &DownloadRequest,
) -> DownloadResult {
    check_url(&req.url)?;

    let ladder = strategies_for(&req.url, &req.selector, downloader.max_retries);
    if req.dry_run {
        return Ok(dry_run(downloader, req, &ladder));
    }

    let platform = Platform::detect(&req.url);
    tracing::info!(url = %req.url, platform = %platform, "Starting video download");

    match attempt_and_verify(downloader, req, &ladder) {
        Ok(outcome) => {
            tracing::info!(url = %req.url, platform = %platform, "Download complete");
            Ok(outcome)
        }
        Err(failure) => {
            tracing::error!(url = %req.url, platform = %platform, "Download failed: {}", failure);
            Err(failure)
        }
    }
}

fn attempt_and_verify<T: Toolchain>(
    downloader: &Downloader<T>,
    req: &DownloadRequest,
    ladder: &[FormatStrategy],
) -> DownloadResult {
    prepare_dir(req)?;
    let media_id = derive_media_id(&req.url);

    let success = run_ladder(ladder, |_, strategy| {
        let args = video_args(downloader, req, strategy);
        tracing::info!("Running: {}", downloader.tools.describe(&args));
        downloader.tools.extract(&args)
    })?;
    tracing::debug!(
        "Attempt {} succeeded with {:?}",
        success.index + 1,
        success.strategy.selector
    );

    if let Some(located) = downloader.locator.locate(&req.output_dir, &media_id, MERGED_EXT) {
        downloader.verify_audio(&located.path)?;
        return Ok(DownloadOutcome::Saved {
            path: located.path,
            rescued: false,
        });
    }

    let components = find_components(&req.output_dir, &media_id).ok_or_else(|| {
        DownloadFailure::NoOutput {
            media_id: media_id.clone(),
            dir: req.output_dir.clone(),
        }
    })?;

    tracing::warn!("No merged file for {}, attempting manual remux", media_id);
    let rescued = rescue_components(&downloader.tools, &components, &req.output_dir, &media_id)?;
    downloader.verify_audio(&rescued.merged)?;

    Ok(DownloadOutcome::Saved {
        path: rescued.merged,
        rescued: true,
    })
}
