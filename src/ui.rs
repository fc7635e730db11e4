//! Coloured terminal output shared by the CLI and the menu.

use colored::*;
use std::path::Path;

use urlvideo_av::ToolInfo;

use crate::download::{BatchSummary, DownloadFailure, DownloadOutcome, DownloadResult};

pub fn banner() {
    println!("{}", "urlvideo".cyan().bold());
    println!("{}", "Video and audio downloader for yt-dlp + ffmpeg".dimmed());
    println!();
}

pub fn heading(text: &str) {
    println!("\n{}", text.green().bold());
}

pub fn info(text: &str) {
    println!("{}", text.cyan());
}

pub fn warn(text: &str) {
    println!("{} {}", "!".yellow().bold(), text.yellow());
}

pub fn error(text: &str) {
    eprintln!("{} {}", "✗".red().bold(), text.red());
}

pub fn success(text: &str) {
    println!("{} {}", "✓".green().bold(), text.green());
}

/// Report the result of one URL. Returns whether it succeeded.
pub fn report(url: &str, result: &DownloadResult) -> bool {
    match result {
        Ok(outcome) => {
            report_outcome(outcome);
            true
        }
        Err(failure) => {
            report_failure(url, failure);
            false
        }
    }
}

fn report_outcome(outcome: &DownloadOutcome) {
    match outcome {
        DownloadOutcome::Saved { path, rescued } => {
            if *rescued {
                warn("Merged file was missing; rebuilt it from separate streams");
            }
            success(&format!("Saved to {}", path.display()));
        }
        DownloadOutcome::Extracted { dir, rescued } => {
            if *rescued > 0 {
                warn(&format!("{rescued} item(s) rebuilt from separate streams"));
            }
            success(&format!("Files saved in {}", dir.display()));
        }
        DownloadOutcome::DryRun { command } => {
            println!("{} {}", "[DRY RUN]".yellow().bold(), command);
        }
    }
}

fn report_failure(url: &str, failure: &DownloadFailure) {
    error(&format!("{url}: {failure}"));
    if let DownloadFailure::NoAudioStream { path } = failure {
        warn(&format!("File kept for inspection: {}", path.display()));
    }
}

pub fn batch_header(index: usize, total: usize, url: &str) {
    println!(
        "\n{} {}",
        format!("[{index}/{total}]").blue().bold(),
        url.cyan()
    );
}

pub fn batch_summary(summary: &BatchSummary) {
    heading("Batch summary");
    println!(
        "  {}: {}",
        "Succeeded".green(),
        summary.succeeded.to_string().cyan()
    );
    println!(
        "  {}: {}",
        "Failed".red(),
        summary.failed().to_string().cyan()
    );
    for (url, failure) in &summary.failures {
        println!("    {} {}", url.yellow(), failure.to_string().dimmed());
    }
}

/// Print tool availability. Returns whether everything was found.
pub fn tool_report(tools: &[ToolInfo]) -> bool {
    let mut all_ok = true;

    for tool in tools {
        if tool.available {
            let version = tool.version.as_deref().unwrap_or("");
            print!("{} {}", "✓".green(), tool.name.bold());
            if !version.is_empty() {
                print!(" ({})", version.dimmed());
            }
            if let Some(path) = &tool.path {
                print!(" - {}", path.display());
            }
            println!();
        } else {
            all_ok = false;
            println!("{} {}", "✗".red(), tool.name.bold());
            println!("    {} {}", "install:".yellow(), tool.install_hint());
        }
    }

    all_ok
}

pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", key.yellow(), value.cyan());
}

pub fn path_value(key: &str, value: &Path) {
    key_value(key, &value.display().to_string());
}
