//! Media processing actions.
//!
//! Only muxing is needed: joining a video-only and an audio-only file that
//! the extraction tool left behind without merging.

mod mux;

pub use mux::{mux_command, mux_streams, MuxMode};
