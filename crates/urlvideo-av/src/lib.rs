//! # urlvideo-av
//!
//! Thin, synchronous wrappers around the external tools urlvideo drives.
//!
//! This crate provides:
//!
//! - **Command execution** ([`ToolCommand`]) with an explicit environment
//!   ([`ToolEnvironment`]) and an optional timeout
//! - **Tool discovery** ([`ToolPaths`], [`check_tools`]) for yt-dlp, ffmpeg
//!   and ffprobe, with install hints for missing ones
//! - **yt-dlp arguments** ([`YtDlpArgs`]) for video and audio downloads
//! - **Muxing** ([`actions::mux_streams`]) of separate video/audio files
//! - **Probing** ([`probe::has_audio_stream`]) to verify an audio track
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use urlvideo_av::{probe, ToolEnvironment, ToolPaths};
//!
//! let tools = ToolPaths::discover(None, None);
//! let env = ToolEnvironment::from_host();
//! let ok = probe::has_audio_stream(&tools.ffprobe, Path::new("clip.mp4"), &env, None)?;
//! println!("audio present: {ok}");
//! # Ok::<(), urlvideo_av::Error>(())
//! ```

pub mod actions;
pub mod command;
pub mod env;
mod error;
pub mod probe;
pub mod tools;
pub mod ytdlp;

pub use command::{shell_quote, ToolCommand, ToolOutput};
pub use env::ToolEnvironment;
pub use error::{Error, Result};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo, ToolPaths};
pub use ytdlp::YtDlpArgs;
