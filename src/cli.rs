use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use urlvideo::app::{Target, DEFAULT_BITRATE};
use urlvideo_common::MediaKind;

#[derive(Parser)]
#[command(name = "urlvideo")]
#[command(author, version, about = "Download video and audio with yt-dlp and ffmpeg")]
#[command(after_help = "Run without a command to open the interactive menu.")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "URLVIDEO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the commands that would run without running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Video,
    Audio,
}

impl From<Kind> for MediaKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Video => MediaKind::Video,
            Kind::Audio => MediaKind::Audio,
        }
    }
}

/// Output location options shared by download commands.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Base output directory (defaults to the configured download path)
    #[arg(long)]
    pub route: Option<PathBuf>,

    /// Netscape-format cookies file passed to yt-dlp
    #[arg(long)]
    pub cookies: Option<PathBuf>,
}

impl From<TargetArgs> for Target {
    fn from(args: TargetArgs) -> Self {
        Target {
            route: args.route,
            cookies: args.cookies,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check dependencies and create the download directory
    Setup,

    /// Download a single video
    Video {
        /// Quality key (480p, 720p, 1080p, best) or a raw format selector
        quality: String,

        /// Video URL
        url: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Extract audio from a URL
    Audio {
        /// Audio format (mp3, m4a, flac, wav)
        format: String,

        /// Bitrate key (128, 192, 320, best)
        bitrate: String,

        /// Media URL
        url: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Download a whole playlist
    Playlist {
        #[arg(value_enum)]
        kind: Kind,

        /// Quality key for video, audio format for audio
        quality: String,

        /// Playlist URL
        url: String,

        /// Bitrate key for audio playlists
        #[arg(long, default_value = DEFAULT_BITRATE)]
        bitrate: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Download every URL listed in a file
    Batch {
        #[arg(value_enum)]
        kind: Kind,

        /// Quality key for video, audio format for audio
        option: String,

        /// File with one URL per line
        file: PathBuf,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Upgrade yt-dlp through pip
    Update,

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Set the default download directory
    SetPath {
        /// Existing directory
        dir: PathBuf,
    },
}
