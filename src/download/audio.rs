use urlvideo_av::tools::YT_DLP;
use urlvideo_av::YtDlpArgs;
use urlvideo_common::Platform;

use super::{
    check_url, prepare_dir, AudioSettings, DownloadFailure, DownloadOutcome, DownloadRequest,
    DownloadResult, Downloader, Toolchain,
};

fn audio_args<T: Toolchain>(
    downloader: &Downloader<T>,
    req: &DownloadRequest,
    settings: &AudioSettings,
) -> Vec<String> {
    let ffmpeg_location = downloader.tools.ffmpeg_location();
    YtDlpArgs::audio(settings.format.as_str(), settings.quality.as_str(), &req.output_dir)
        .playlist(req.playlist)
        .ffmpeg_location(ffmpeg_location.as_deref())
        .socket_timeout(downloader.socket_timeout)
        .cookies(req.cookies.as_deref())
        .build(&req.url)
}

/// Single extraction attempt; files are named after the title so there is
/// nothing to locate afterwards.
pub(super) fn download_audio<T: Toolchain>(
    downloader: &Downloader<T>,
    req: &DownloadRequest,
    settings: &AudioSettings,
) -> DownloadResult {
    check_url(&req.url)?;

    let args = audio_args(downloader, req, settings);
    if req.dry_run {
        return Ok(DownloadOutcome::DryRun {
            command: downloader.tools.describe(&args),
        });
    }

    prepare_dir(req)?;
    let platform = Platform::detect(&req.url);
    tracing::info!(
        url = %req.url,
        platform = %platform,
        "Starting audio extraction ({}, quality {})",
        settings.format,
        settings.quality
    );

    tracing::info!("Running: {}", downloader.tools.describe(&args));
    let result = match downloader.tools.extract(&args) {
        Ok(attempt) if attempt.success => Ok(()),
        Ok(attempt) => Err(DownloadFailure::AllAttemptsFailed {
            attempts: 1,
            last_error: attempt.error_summary(),
        }),
        Err(e) if e.is_tool_not_found() => Err(DownloadFailure::tool_not_found(YT_DLP)),
        Err(e) => Err(DownloadFailure::AllAttemptsFailed {
            attempts: 1,
            last_error: e.to_string(),
        }),
    };

    match result {
        Ok(()) => {
            tracing::info!(url = %req.url, platform = %platform, "Audio extraction complete");
            Ok(DownloadOutcome::Extracted {
                dir: req.output_dir.clone(),
                rescued: 0,
            })
        }
        Err(failure) => {
            tracing::error!(
                url = %req.url,
                platform = %platform,
                "Audio extraction failed: {}",
                failure
            );
            Err(failure)
        }
    }
}
