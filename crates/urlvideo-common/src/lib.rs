//! urlvideo-common: shared types, constants, and utilities.
//!
//! This crate provides the pieces used by both the tool layer and the
//! download orchestration:
//!
//! - **Core Types**: the media kind of a download (video or audio)
//! - **Platforms**: platform detection and media-ID derivation from URLs
//! - **Path Utilities**: path safety validation and component-file detection
//! - **Error Handling**: common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use urlvideo_common::{MediaKind, Platform};
//! use urlvideo_common::platform::derive_media_id;
//!
//! let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
//! assert_eq!(Platform::detect(url), Platform::YouTube);
//! assert_eq!(derive_media_id(url), "dQw4w9WgXcQ");
//! assert_eq!(MediaKind::Video.to_string(), "video");
//! ```

pub mod error;
pub mod paths;
pub mod platform;
pub mod types;

pub use error::{Error, Result};
pub use platform::Platform;
pub use types::*;
