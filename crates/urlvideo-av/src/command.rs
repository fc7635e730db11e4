//! Builder for executing external tool commands.
//!
//! Commands run on a private single-threaded tokio runtime so an optional
//! timeout can kill a stuck child. Callers stay synchronous.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::env::ToolEnvironment;
use crate::{Error, Result};

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, `None` when terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use urlvideo_av::{ToolCommand, ToolEnvironment};
///
/// let output = ToolCommand::new("ffprobe")
///     .args(["-v", "error", "-show_streams", "-of", "json"])
///     .arg("/path/to/video.mp4")
///     .env(ToolEnvironment::from_host())
///     .execute()?;
/// println!("{}", output.stdout);
/// # Ok::<(), urlvideo_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    env: Option<ToolEnvironment>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path or name.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: None,
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append a path argument.
    pub fn arg_path(&mut self, p: &Path) -> &mut Self {
        self.args.push(p.to_string_lossy().into_owned());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Replace the inherited environment with an explicit one.
    pub fn env(&mut self, env: ToolEnvironment) -> &mut Self {
        self.env = Some(env);
        self
    }

    /// Set the maximum execution time. Unbounded when unset.
    pub fn timeout(&mut self, d: Option<Duration>) -> &mut Self {
        self.timeout = d;
        self
    }

    #[cfg(test)]
    pub(crate) fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Short tool name used in errors and logs.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// The full command line, quoted so it can be pasted into a shell.
    pub fn display(&self) -> String {
        std::iter::once(self.program.to_string_lossy())
            .chain(self.args.iter().map(|a| Cow::Borrowed(a.as_str())))
            .map(|part| shell_quote(&part).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command and return its output whatever the exit status.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program cannot be spawned because it
    ///   does not exist.
    /// - [`Error::TimedOut`] if a timeout is set and expires.
    /// - [`Error::Io`] for any other spawn or wait failure.
    pub fn run(&self) -> Result<ToolOutput> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        runtime.block_on(self.run_async())
    }

    /// Run the command and fail on a non-zero exit status.
    ///
    /// # Errors
    ///
    /// Everything [`run`](Self::run) returns, plus [`Error::ToolFailed`]
    /// carrying the exit code and stderr.
    pub fn execute(&self) -> Result<ToolOutput> {
        let output = self.run()?;
        if !output.success() {
            return Err(Error::tool_failed(
                self.tool_name(),
                output.code(),
                output.stderr,
            ));
        }
        Ok(output)
    }

    async fn run_async(&self) -> Result<ToolOutput> {
        let tool = self.tool_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref env) = self.env {
            env.apply(&mut cmd);
        }

        tracing::debug!(command = %self.display(), "spawning {}", tool);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(tool.clone())
            } else {
                Error::Io(e)
            }
        })?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| Error::timed_out(tool.clone(), limit))??,
            None => child.wait_with_output().await?,
        };

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Characters that force an argument into single quotes.
const SHELL_SPECIAL: &[char] = &[
    ' ', '\t', '\n', '%', '*', '?', '[', ']', '$', '`', '"', '\'', '\\', '!', '~', '&', '|', ';',
    '<', '>', '(', ')', '{', '}', '#',
];

/// Quote an argument for display in a POSIX shell.
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    if arg.is_empty() {
        return Cow::Borrowed("''");
    }
    if !arg.contains(SHELL_SPECIAL) {
        return Cow::Borrowed(arg);
    }
    Cow::Owned(format!("'{}'", arg.replace('\'', r#"'"'"'"#)))
}
