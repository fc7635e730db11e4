//! Logging setup: compact console output plus an append-only log file.
//!
//! The file sink is a custom layer writing one line per event:
//!
//! ```text
//! [2024-05-01 12:00:00] [INFO] Download complete [Platform: YouTube] [URL: https://...]
//! ```
//!
//! `platform` and `url` are taken from the event's structured fields.

use chrono::Local;
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Name of the log file inside the logs directory.
pub const LOG_FILE_NAME: &str = "downloader.log";

const CONSOLE_FILTER: &str = "urlvideo=warn,urlvideo_av=warn,urlvideo_common=warn";
const VERBOSE_FILTER: &str = "urlvideo=debug,urlvideo_av=debug,urlvideo_common=debug";
const FILE_FILTER: &str = "urlvideo=info,urlvideo_av=info,urlvideo_common=info";

/// Appends formatted events to the download log.
pub struct FileLogLayer {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileLogLayer {
    /// Open (or create) `<dir>/downloader.log` for appending.
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<S> Layer<S> for FileLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = EventFields::default();
        event.record(&mut fields);

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let line = format_line(&timestamp, event.metadata().level(), &fields);

        // A failed write must never take the program down.
        let _ = writeln!(self.file.lock(), "{line}");
    }
}

/// Fields of interest pulled out of an event.
#[derive(Debug, Default)]
pub struct EventFields {
    pub message: String,
    pub url: Option<String>,
    pub platform: Option<String>,
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            "url" => self.url = Some(format!("{:?}", value).trim_matches('"').to_string()),
            "platform" => {
                self.platform = Some(format!("{:?}", value).trim_matches('"').to_string())
            }
            _ => {}
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "url" => self.url = Some(value.to_string()),
            "platform" => self.platform = Some(value.to_string()),
            _ => {}
        }
    }
}

/// Render one log line.
pub fn format_line(timestamp: &str, level: &Level, fields: &EventFields) -> String {
    let mut line = format!("[{timestamp}] [{level}] {}", fields.message);
    if let Some(platform) = &fields.platform {
        let _ = write!(line, " [Platform: {platform}]");
    }
    if let Some(url) = &fields.url {
        let _ = write!(line, " [URL: {url}]");
    }
    line
}

fn console_layer<S>(verbose: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let console_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            VERBOSE_FILTER.to_string()
        } else {
            CONSOLE_FILTER.to_string()
        }
    });

    fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(console_filter))
}

/// Console-only subscriber for the window before the config (and with it
/// the log directory) is known.
pub fn bootstrap_subscriber(verbose: bool) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry().with(console_layer(verbose))
}

/// Install the global subscriber.
///
/// Console verbosity comes from `RUST_LOG` when set, otherwise from the
/// `verbose` flag. The log file is skipped with a warning when it cannot be
/// opened.
pub fn init_logging(verbose: bool, logs_dir: Option<&Path>) {
    let mut open_error = None;
    let file_layer = logs_dir.and_then(|dir| match FileLogLayer::open(dir) {
        Ok(layer) => Some(layer.with_filter(EnvFilter::new(FILE_FILTER))),
        Err(e) => {
            open_error = Some((dir.to_path_buf(), e));
            None
        }
    });

    let _ = tracing_subscriber::registry()
        .with(console_layer(verbose))
        .with(file_layer)
        .try_init();

    if let Some((dir, e)) = open_error {
        tracing::warn!("File logging disabled, cannot open {}: {}", dir.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_line_with_context() {
        let fields = EventFields {
            message: "Download complete".to_string(),
            url: Some("https://youtu.be/x".to_string()),
            platform: Some("YouTube".to_string()),
        };
        assert_eq!(
            format_line("2024-05-01 12:00:00", &Level::INFO, &fields),
            "[2024-05-01 12:00:00] [INFO] Download complete [Platform: YouTube] [URL: https://youtu.be/x]"
        );
    }

    #[test]
    fn test_format_line_plain() {
        let fields = EventFields {
            message: "Batch finished".to_string(),
            ..Default::default()
        };
        assert_eq!(
            format_line("2024-05-01 12:00:00", &Level::WARN, &fields),
            "[2024-05-01 12:00:00] [WARN] Batch finished"
        );
    }

    #[test]
    fn test_layer_appends_to_file() {
        let dir = tempdir().unwrap();
        let layer = FileLogLayer::open(dir.path()).unwrap();
        let path = layer.path().to_path_buf();

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(url = "https://x.com/a/status/1", platform = "Twitter-X", "Starting");
            tracing::error!("No audio stream");
        });

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(
            "[INFO] Starting [Platform: Twitter-X] [URL: https://x.com/a/status/1]"
        ));
        assert!(lines[1].ends_with("[ERROR] No audio stream"));
    }
}
