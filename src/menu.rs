//! Interactive menu shown when no subcommand is given.

use anyhow::Result;
use colored::*;
use inquire::{Confirm, InquireError, Select, Text};
use std::fmt;
use std::path::{Path, PathBuf};

use urlvideo_common::MediaKind;

use crate::app::{home_dir, App, Target, DEFAULT_BITRATE};
use crate::ui;

/// Input that returns to the main menu.
const BACK: &str = "m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Video,
    Audio,
    Playlist,
    Batch,
    DefaultPath,
    Update,
    Exit,
}

impl MenuItem {
    const ALL: [MenuItem; 7] = [
        MenuItem::Video,
        MenuItem::Audio,
        MenuItem::Playlist,
        MenuItem::Batch,
        MenuItem::DefaultPath,
        MenuItem::Update,
        MenuItem::Exit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuItem::Video => "Download video",
            MenuItem::Audio => "Download audio only",
            MenuItem::Playlist => "Download playlist",
            MenuItem::Batch => "Batch download (file of URLs)",
            MenuItem::DefaultPath => "Set default download path",
            MenuItem::Update => "Update yt-dlp",
            MenuItem::Exit => "Exit",
        };
        f.write_str(label)
    }
}

/// `Ok(None)` when the user backed out with Esc.
fn optional<T>(result: std::result::Result<T, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Ask for a value; `m` or Esc returns `None`.
fn prompt_input(message: &str) -> Result<Option<String>> {
    let message = format!("{message} ('{BACK}' for menu):");
    let answer = optional(Text::new(&message).prompt())?;
    Ok(answer
        .map(|s| s.trim().to_string())
        .filter(|s| !s.eq_ignore_ascii_case(BACK)))
}

fn prompt_choice(message: &str, options: Vec<String>) -> Result<Option<String>> {
    optional(Select::new(message, options).prompt())
}

fn prompt_kind() -> Result<Option<MediaKind>> {
    optional(Select::new("Download as:", vec![MediaKind::Video, MediaKind::Audio]).prompt())
}

fn another(what: &str) -> Result<bool> {
    Ok(optional(
        Confirm::new(&format!("Download another {what}?"))
            .with_default(false)
            .prompt(),
    )?
    .unwrap_or(false))
}

/// Offer the default directory first, then a custom one. Anything unusable
/// falls back to the default.
fn prompt_route(app: &App) -> Result<Option<Target>> {
    let default = app.config().download_root();
    let use_default = format!("Default ({})", default.display());
    let choice = prompt_choice(
        "Output directory:",
        vec![use_default.clone(), "Another directory".to_string()],
    )?;

    let route = match choice {
        None => return Ok(None),
        Some(choice) if choice == use_default => default,
        Some(_) => match optional(Text::new("Directory:").prompt())? {
            None => return Ok(None),
            Some(input) => checked_route(app, Path::new(input.trim()), default),
        },
    };

    Ok(Some(Target {
        route: Some(route),
        cookies: None,
    }))
}

fn checked_route(app: &App, input: &Path, default: PathBuf) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&input.to_string_lossy()).as_ref());
    if !expanded.is_dir() {
        ui::warn("Not a directory, using the default");
        return default;
    }
    if !app.config().path_policy().is_safe(&home_dir(), &expanded) {
        ui::warn("That directory is outside the allowed locations, using the default");
        return default;
    }
    expanded
}

fn keys(map: &std::collections::BTreeMap<String, String>) -> Vec<String> {
    map.keys().cloned().collect()
}

fn video_flow(app: &App) -> Result<()> {
    loop {
        let Some(url) = prompt_input("Video URL")? else { return Ok(()) };
        let Some(target) = prompt_route(app)? else { return Ok(()) };
        let Some(quality) = prompt_choice("Quality:", keys(&app.config().video_quality_map))?
        else {
            return Ok(());
        };

        let result = app.video(&quality, &url, &target);
        ui::report(&url, &result);

        if !another("video")? {
            return Ok(());
        }
    }
}

fn audio_flow(app: &App) -> Result<()> {
    loop {
        let Some(url) = prompt_input("Audio URL")? else { return Ok(()) };
        let Some(target) = prompt_route(app)? else { return Ok(()) };
        let Some(format) = prompt_choice("Format:", keys(&app.config().audio_format_map))? else {
            return Ok(());
        };
        let Some(bitrate) = prompt_choice("Bitrate:", keys(&app.config().audio_quality_map))?
        else {
            return Ok(());
        };

        let result = app.audio(&format, &bitrate, &url, &target);
        ui::report(&url, &result);

        if !another("audio")? {
            return Ok(());
        }
    }
}

fn playlist_flow(app: &App) -> Result<()> {
    loop {
        let Some(url) = prompt_input("Playlist URL")? else { return Ok(()) };
        let Some(target) = prompt_route(app)? else { return Ok(()) };
        let Some(kind) = prompt_kind()? else { return Ok(()) };

        let options = match kind {
            MediaKind::Video => keys(&app.config().video_quality_map),
            MediaKind::Audio => keys(&app.config().audio_format_map),
        };
        let Some(option) = prompt_choice("Quality / format:", options)? else {
            return Ok(());
        };

        let result = app.playlist(kind, &option, &url, DEFAULT_BITRATE, &target);
        ui::report(&url, &result);

        if !another("playlist")? {
            return Ok(());
        }
    }
}

fn batch_flow(app: &App) -> Result<()> {
    loop {
        let Some(file) = prompt_input("File with URLs")? else { return Ok(()) };
        let Some(target) = prompt_route(app)? else { return Ok(()) };
        let Some(kind) = prompt_kind()? else { return Ok(()) };

        let options = match kind {
            MediaKind::Video => keys(&app.config().video_quality_map),
            MediaKind::Audio => keys(&app.config().audio_format_map),
        };
        let Some(option) = prompt_choice("Quality / format:", options)? else {
            return Ok(());
        };

        if let Err(e) = app.batch(kind, &option, Path::new(&file), &target) {
            ui::error(&format!("{e:#}"));
        }

        if !another("batch")? {
            return Ok(());
        }
    }
}

fn default_path_flow(app: &mut App) -> Result<()> {
    let current = app.config().download_root();
    let Some(input) = optional(
        Text::new("New default download path:")
            .with_default(&current.to_string_lossy())
            .prompt(),
    )?
    else {
        return Ok(());
    };

    match app.set_default_path(Path::new(input.trim())) {
        Ok(()) => ui::success(&format!(
            "Default path is now {}",
            app.config().download_root().display()
        )),
        Err(e) => ui::error(&format!("{e:#}")),
    }
    Ok(())
}

/// Run the menu until the user exits.
pub fn run(app: &mut App) -> Result<()> {
    ui::banner();
    if !app.check_tools() {
        ui::warn("Some tools are missing; downloads may fail");
    }
    if let Err(e) = std::fs::create_dir_all(app.config().download_root()) {
        ui::warn(&format!("Could not create the download directory: {e}"));
    }

    loop {
        println!();
        let choice = match Select::new("What do you want to do?", MenuItem::ALL.to_vec()).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                MenuItem::Exit
            }
            Err(e) => return Err(e.into()),
        };

        let result = match choice {
            MenuItem::Video => video_flow(app),
            MenuItem::Audio => audio_flow(app),
            MenuItem::Playlist => playlist_flow(app),
            MenuItem::Batch => batch_flow(app),
            MenuItem::DefaultPath => default_path_flow(app),
            MenuItem::Update => app.update(),
            MenuItem::Exit => {
                println!("{}", "Bye!".cyan());
                return Ok(());
            }
        };

        match result {
            Ok(()) => {}
            Err(e) if is_interrupt(&e) => {
                println!("{}", "Bye!".cyan());
                return Ok(());
            }
            Err(e) => ui::error(&format!("{e:#}")),
        }
    }
}

fn is_interrupt(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<InquireError>(),
        Some(InquireError::OperationInterrupted)
    )
}
