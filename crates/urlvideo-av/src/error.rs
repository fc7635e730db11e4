//! Error types for urlvideo-av.

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running external tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool exited unsuccessfully.
    #[error("tool execution failed: {tool} ({}): {}", exit_label(code), stderr.trim())]
    ToolFailed {
        tool: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },

    /// An external tool ran past its configured timeout and was killed.
    #[error("{tool} timed out after {}s", timeout.as_secs())]
    TimedOut { tool: String, timeout: Duration },

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// The specified file was not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(
        tool: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a timeout error.
    pub fn timed_out(tool: impl Into<String>, timeout: Duration) -> Self {
        Self::TimedOut {
            tool: tool.into(),
            timeout,
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Whether this error means the tool binary itself is missing.
    pub fn is_tool_not_found(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_display() {
        let err = Error::tool_failed("yt-dlp", Some(1), "ERROR: Unsupported URL\n");
        assert_eq!(
            err.to_string(),
            "tool execution failed: yt-dlp (exit code 1): ERROR: Unsupported URL"
        );

        let err = Error::tool_failed("ffmpeg", None, "");
        assert_eq!(
            err.to_string(),
            "tool execution failed: ffmpeg (terminated by signal): "
        );
    }

    #[test]
    fn test_timed_out_display() {
        let err = Error::timed_out("yt-dlp", Duration::from_secs(30));
        assert_eq!(err.to_string(), "yt-dlp timed out after 30s");
    }

    #[test]
    fn test_is_tool_not_found() {
        assert!(Error::tool_not_found("ffprobe").is_tool_not_found());
        assert!(!Error::file_not_found("/x").is_tool_not_found());
    }
}
