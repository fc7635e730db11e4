//! CLI end-to-end tests
//!
//! Every test runs with `HOME` pointed at a scratch directory and an
//! explicit `--config`, and only uses `--dry-run` or commands that never
//! reach yt-dlp.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Get a command for the urlvideo binary
#[allow(deprecated)]
fn urlvideo_cmd() -> Command {
    Command::cargo_bin("urlvideo").unwrap()
}

struct Sandbox {
    home: TempDir,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let home = tempdir().unwrap();
        let downloads = home.path().join("downloads");
        fs::create_dir_all(&downloads).unwrap();

        let config = home.path().join("config.json");
        let content = serde_json::json!({ "default_download_path": downloads });
        fs::write(&config, content.to_string()).unwrap();

        Self { home, config }
    }

    fn home(&self) -> &Path {
        self.home.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = urlvideo_cmd();
        cmd.env("HOME", self.home())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("URLVIDEO_CONFIG")
            .arg("--config")
            .arg(&self.config);
        cmd
    }
}

#[test]
fn test_cli_help_flag() {
    urlvideo_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("urlvideo"))
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("interactive menu"));
}

#[test]
fn test_cli_version_flag() {
    urlvideo_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("urlvideo"));
}

#[test]
fn test_cli_subcommand_help() {
    urlvideo_cmd()
        .args(["playlist", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--bitrate"))
        .stdout(predicate::str::contains("--route"));
}

#[test]
fn test_cli_rejects_unknown_playlist_kind() {
    urlvideo_cmd()
        .args(["playlist", "subtitles", "best", URL])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_config_show() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("video_quality_map"))
        .stdout(predicate::str::contains("downloads"));
}

#[test]
fn test_missing_config_is_created() {
    let home = tempdir().unwrap();
    let config = home.path().join("cfg").join("config.json");

    urlvideo_cmd()
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success();

    assert!(config.exists());
}

#[test]
fn test_video_dry_run_prints_command() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["--dry-run", "video", "720p", URL])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains("yt-dlp"))
        .stdout(predicate::str::contains("height<=720"))
        .stdout(predicate::str::contains("--merge-output-format mp4"))
        .stdout(predicate::str::contains("--socket-timeout 30"))
        .stdout(predicate::str::contains("YouTube/video"));

    assert!(!sandbox.home().join("downloads").join("YouTube").exists());
}

#[test]
fn test_audio_dry_run_resolves_maps() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["--dry-run", "audio", "mp3", "320"])
        .arg("https://www.tiktok.com/@u/video/1")
        .assert()
        .success()
        .stdout(predicate::str::contains("--audio-quality 320K"))
        .stdout(predicate::str::contains("TikTok/audio"));
}

#[test]
fn test_invalid_url_is_reported() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["--dry-run", "video", "best", "not-a-url"])
        .assert()
        .success()
        .stderr(predicate::str::contains("invalid URL"));
}

#[test]
fn test_unsafe_route_is_rejected() {
    let sandbox = Sandbox::new();
    let route = sandbox.home().join("..").join("..").join("etc");
    sandbox
        .cmd()
        .args(["--dry-run", "video", "best", URL, "--route"])
        .arg(route)
        .assert()
        .success()
        .stderr(predicate::str::contains("unsafe output path"));
}

#[test]
fn test_batch_rejects_unknown_option() {
    let sandbox = Sandbox::new();
    let list = sandbox.home().join("urls.txt");
    fs::write(&list, format!("{URL}\n")).unwrap();

    sandbox
        .cmd()
        .args(["--dry-run", "batch", "video", "4k"])
        .arg(&list)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unknown video option '4k'"));
}

#[test]
fn test_batch_dry_run_summary() {
    let sandbox = Sandbox::new();
    let list = sandbox.home().join("urls.txt");
    fs::write(&list, format!("{URL}\n\nnot-a-url\n")).unwrap();

    sandbox
        .cmd()
        .args(["--dry-run", "batch", "video", "best"])
        .arg(&list)
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/2]"))
        .stdout(predicate::str::contains("[2/2]"))
        .stdout(predicate::str::contains("Batch summary"))
        .stdout(predicate::str::contains("not-a-url"));
}

#[test]
fn test_config_set_path() {
    let sandbox = Sandbox::new();
    let target = sandbox.home().join("videos");
    fs::create_dir_all(&target).unwrap();

    sandbox
        .cmd()
        .args(["config", "set-path"])
        .arg(&target)
        .assert()
        .success();

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sandbox.config).unwrap()).unwrap();
    assert!(saved["default_download_path"]
        .as_str()
        .unwrap()
        .ends_with("videos"));
}

#[test]
fn test_config_set_path_rejects_missing_dir() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "set-path"])
        .arg(sandbox.home().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}

#[test]
fn test_update_without_python_fails() {
    let sandbox = Sandbox::new();
    let empty_path = sandbox.home().join("bin");
    fs::create_dir_all(&empty_path).unwrap();

    sandbox
        .cmd()
        .env("PATH", &empty_path)
        .env_remove("PREFIX")
        .arg("update")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("python3 not found"));
}
