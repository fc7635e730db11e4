//! Common error types used throughout urlvideo.
//!
//! This module provides a unified error type for the failures that happen
//! before any external tool is involved: unsafe destinations, bad input, and
//! filesystem I/O.

use std::path::PathBuf;

/// Common error type for urlvideo.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A destination path escapes the allowed root.
    #[error("Unsafe path: {} is outside {}", path.display(), base.display())]
    UnsafePath {
        /// The rejected target.
        path: PathBuf,
        /// The root it was checked against.
        base: PathBuf,
    },

    /// The requested file or directory was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new UnsafePath error.
    pub fn unsafe_path(path: impl Into<PathBuf>, base: impl Into<PathBuf>) -> Self {
        Self::UnsafePath {
            path: path.into(),
            base: base.into(),
        }
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unsafe_path("/etc", "/home/user");
        assert_eq!(err.to_string(), "Unsafe path: /etc is outside /home/user");

        let err = Error::not_found("urls.txt");
        assert_eq!(err.to_string(), "Not found: urls.txt");

        let err = Error::invalid_input("not a URL");
        assert_eq!(err.to_string(), "Invalid input: not a URL");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            Error::unsafe_path("a", "b"),
            Error::UnsafePath { .. }
        ));
        assert!(matches!(Error::not_found("x"), Error::NotFound(_)));
        assert!(matches!(Error::invalid_input("x"), Error::InvalidInput(_)));
    }
}
