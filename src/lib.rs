//! urlvideo - download orchestration around yt-dlp and ffmpeg
//!
//! This library crate exposes the core functionality for integration testing.

pub mod app;
pub mod config;
pub mod download;
pub mod logging;
pub mod menu;
pub mod ui;
