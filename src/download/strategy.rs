//! Format-selector fallback ladder.
//!
//! Each rung is a [`FormatStrategy`]. [`run_ladder`] walks them in order and
//! stops at the first attempt that exits 0. A missing extraction tool ends
//! the walk immediately since no later rung can succeed either.

use super::{AttemptResult, DownloadFailure};
use urlvideo_av::tools::YT_DLP;
use urlvideo_common::platform::is_short;

/// Explicit-codec selector tried last.
pub const ROBUST_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Single-file selector for short-form URLs.
pub const SHORTS_SELECTOR: &str = "best[ext=mp4]/best";

/// One rung of the ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatStrategy {
    pub selector: String,
    /// Whether metadata and thumbnail embedding flags apply.
    pub post_process: bool,
}

impl FormatStrategy {
    pub fn new(selector: impl Into<String>, post_process: bool) -> Self {
        Self {
            selector: selector.into(),
            post_process,
        }
    }
}

/// Build the ladder for a URL.
///
/// Regular URLs get the selector with post-processing, the selector without
/// it, then [`ROBUST_SELECTOR`]. Shorts get [`SHORTS_SELECTOR`] then the
/// robust selector, never with post-processing. Consecutive duplicates are
/// collapsed and the result is capped at `max_retries` (at least one rung).
pub fn strategies_for(url: &str, selector: &str, max_retries: u32) -> Vec<FormatStrategy> {
    let mut ladder = if is_short(url) {
        vec![
            FormatStrategy::new(SHORTS_SELECTOR, false),
            FormatStrategy::new(ROBUST_SELECTOR, false),
        ]
    } else {
        vec![
            FormatStrategy::new(selector, true),
            FormatStrategy::new(selector, false),
            FormatStrategy::new(ROBUST_SELECTOR, false),
        ]
    };

    ladder.dedup();
    ladder.truncate(max_retries.max(1) as usize);
    ladder
}

/// The rung that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderSuccess {
    /// Zero-based position in the ladder.
    pub index: usize,
    pub strategy: FormatStrategy,
    pub attempt: AttemptResult,
}

/// Try each strategy in order until one succeeds.
///
/// `attempt` runs a single rung. Errors other than a missing tool (timeouts,
/// spawn failures) count as a failed rung and the walk continues.
pub fn run_ladder<F>(
    strategies: &[FormatStrategy],
    mut attempt: F,
) -> Result<LadderSuccess, DownloadFailure>
where
    F: FnMut(usize, &FormatStrategy) -> urlvideo_av::Result<AttemptResult>,
{
    let mut last_error = String::from("no strategies to try");

    for (index, strategy) in strategies.iter().enumerate() {
        tracing::debug!(
            "Attempt {}/{} with selector {:?} (post-processing: {})",
            index + 1,
            strategies.len(),
            strategy.selector,
            strategy.post_process
        );

        match attempt(index, strategy) {
            Ok(result) if result.success => {
                return Ok(LadderSuccess {
                    index,
                    strategy: strategy.clone(),
                    attempt: result,
                });
            }
            Ok(result) => {
                last_error = result.error_summary();
                tracing::warn!("Attempt {} failed: {}", index + 1, last_error);
            }
            Err(e) if e.is_tool_not_found() => {
                return Err(DownloadFailure::tool_not_found(YT_DLP));
            }
            Err(e) => {
                last_error = e.to_string();
                tracing::warn!("Attempt {} failed: {}", index + 1, last_error);
            }
        }
    }

    Err(DownloadFailure::AllAttemptsFailed {
        attempts: strategies.len(),
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const WATCH: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
    const SHORT: &str = "https://www.youtube.com/shorts/abcdefghijk";

    fn ok() -> AttemptResult {
        AttemptResult {
            success: true,
            exit_code: Some(0),
            ..Default::default()
        }
    }

    fn failed(stderr: &str) -> AttemptResult {
        AttemptResult {
            success: false,
            exit_code: Some(1),
            stderr: stderr.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_regular_ladder() {
        let ladder = strategies_for(WATCH, "bv*+ba/b", 3);
        assert_eq!(
            ladder,
            vec![
                FormatStrategy::new("bv*+ba/b", true),
                FormatStrategy::new("bv*+ba/b", false),
                FormatStrategy::new(ROBUST_SELECTOR, false),
            ]
        );
    }

    #[test]
    fn test_shorts_ladder_has_no_post_processing() {
        let ladder = strategies_for(SHORT, "bv*+ba/b", 3);
        assert_eq!(ladder.len(), 2);
        assert_eq!(ladder[0].selector, SHORTS_SELECTOR);
        assert!(ladder.iter().all(|s| !s.post_process));
    }

    #[test]
    fn test_duplicate_rungs_collapse() {
        let ladder = strategies_for(WATCH, ROBUST_SELECTOR, 5);
        assert_eq!(
            ladder,
            vec![
                FormatStrategy::new(ROBUST_SELECTOR, true),
                FormatStrategy::new(ROBUST_SELECTOR, false),
            ]
        );
    }

    #[test]
    fn test_cap_by_max_retries() {
        assert_eq!(strategies_for(WATCH, "b", 1).len(), 1);
        assert_eq!(strategies_for(WATCH, "b", 0).len(), 1);
        assert_eq!(strategies_for(WATCH, "b", 10).len(), 3);
    }

    #[test]
    fn test_stops_at_first_success() {
        let ladder = strategies_for(WATCH, "b", 3);
        let mut calls = 0;
        let success = run_ladder(&ladder, |i, _| {
            calls += 1;
            Ok(if i == 1 { ok() } else { failed("ERROR: nope") })
        })
        .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(success.index, 1);
        assert!(!success.strategy.post_process);
    }

    #[test]
    fn test_all_fail_reports_last_error() {
        let ladder = strategies_for(WATCH, "b", 3);
        let result = run_ladder(&ladder, |i, _| Ok(failed(&format!("ERROR: rung {i}"))));
        assert_matches!(
            result,
            Err(DownloadFailure::AllAttemptsFailed { attempts: 3, ref last_error })
                if last_error == "ERROR: rung 2"
        );
    }

    #[test]
    fn test_missing_tool_aborts() {
        let ladder = strategies_for(WATCH, "b", 3);
        let mut calls = 0;
        let result = run_ladder(&ladder, |_, _| {
            calls += 1;
            Err(urlvideo_av::Error::tool_not_found("yt-dlp"))
        });
        assert_eq!(calls, 1);
        assert_matches!(result, Err(DownloadFailure::ToolNotFound { .. }));
    }

    #[test]
    fn test_timeout_moves_to_next_rung() {
        let ladder = strategies_for(WATCH, "b", 3);
        let result = run_ladder(&ladder, |i, _| {
            if i == 0 {
                Err(urlvideo_av::Error::timed_out(
                    "yt-dlp",
                    std::time::Duration::from_secs(1),
                ))
            } else {
                Ok(ok())
            }
        });
        assert_matches!(result, Ok(LadderSuccess { index: 1, .. }));
    }
}
