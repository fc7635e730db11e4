//! Stream probing through ffprobe.

mod ffprobe;

pub use ffprobe::{has_audio_stream, probe_streams, StreamInfo};
