//! Shared test harness for integration tests.
//!
//! Provides [`FakeTools`], a scripted [`Toolchain`] that writes the files
//! yt-dlp and ffmpeg would have produced into the request's output
//! directory, and records every call it receives.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use urlvideo::download::{AttemptResult, Downloader, Locator, Toolchain};
use urlvideo_av::actions::MuxMode;

/// What one extraction attempt does.
#[derive(Debug, Clone)]
pub enum Step {
    /// Exit 1 without writing anything.
    Fail(&'static str),
    /// Exit 0 after writing `<id>.mp4`.
    Merged,
    /// Exit 0 after writing `<id>.f137.mp4` and `<id>.f251.webm`.
    Components,
    /// Exit 0 after writing the given file names.
    Files(Vec<String>),
    /// Exit 0 without writing anything.
    Nothing,
    /// The executable is missing.
    MissingTool,
}

pub struct FakeTools {
    media_id: String,
    steps: RefCell<VecDeque<Step>>,
    mux_works: bool,
    has_audio: bool,
    pub extract_calls: RefCell<Vec<Vec<String>>>,
    pub mux_calls: RefCell<Vec<(PathBuf, MuxMode)>>,
    pub probe_calls: RefCell<Vec<PathBuf>>,
}

impl FakeTools {
    pub fn new(media_id: &str, steps: Vec<Step>) -> Self {
        Self {
            media_id: media_id.to_string(),
            steps: RefCell::new(steps.into()),
            mux_works: true,
            has_audio: true,
            extract_calls: RefCell::new(Vec::new()),
            mux_calls: RefCell::new(Vec::new()),
            probe_calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_failing_mux(mut self) -> Self {
        self.mux_works = false;
        self
    }

    pub fn without_audio(mut self) -> Self {
        self.has_audio = false;
        self
    }

    pub fn extract_count(&self) -> usize {
        self.extract_calls.borrow().len()
    }

    pub fn mux_count(&self) -> usize {
        self.mux_calls.borrow().len()
    }
}

/// Output directory taken from the `-o` template argument.
fn output_dir(args: &[String]) -> PathBuf {
    let template = args
        .iter()
        .position(|a| a == "-o")
        .and_then(|i| args.get(i + 1))
        .expect("-o argument");
    Path::new(template).parent().expect("template dir").to_path_buf()
}

fn write(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"not really media").unwrap();
}

fn attempt(success: bool, stderr: &str) -> AttemptResult {
    AttemptResult {
        success,
        exit_code: Some(if success { 0 } else { 1 }),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

impl Toolchain for FakeTools {
    fn extract(&self, args: &[String]) -> urlvideo_av::Result<AttemptResult> {
        self.extract_calls.borrow_mut().push(args.to_vec());
        let dir = output_dir(args);
        let step = self
            .steps
            .borrow_mut()
            .pop_front()
            .unwrap_or(Step::Fail("ERROR: no more scripted steps"));

        match step {
            Step::Fail(stderr) => Ok(attempt(false, stderr)),
            Step::Merged => {
                write(&dir, &format!("{}.mp4", self.media_id));
                Ok(attempt(true, ""))
            }
            Step::Components => {
                write(&dir, &format!("{}.f137.mp4", self.media_id));
                write(&dir, &format!("{}.f251.webm", self.media_id));
                Ok(attempt(true, ""))
            }
            Step::Files(names) => {
                for name in names {
                    write(&dir, &name);
                }
                Ok(attempt(true, ""))
            }
            Step::Nothing => Ok(attempt(true, "")),
            Step::MissingTool => Err(urlvideo_av::Error::tool_not_found("yt-dlp")),
        }
    }

    fn mux(
        &self,
        _video: &Path,
        _audio: &Path,
        output: &Path,
        mode: MuxMode,
    ) -> urlvideo_av::Result<()> {
        self.mux_calls.borrow_mut().push((output.to_path_buf(), mode));
        if self.mux_works {
            std::fs::write(output, b"merged").unwrap();
            Ok(())
        } else {
            Err(urlvideo_av::Error::tool_failed("ffmpeg", Some(1), "Invalid data found"))
        }
    }

    fn has_audio_stream(&self, file: &Path) -> urlvideo_av::Result<bool> {
        self.probe_calls.borrow_mut().push(file.to_path_buf());
        Ok(self.has_audio)
    }

    fn describe(&self, args: &[String]) -> String {
        format!("yt-dlp {}", args.join(" "))
    }
}

/// Downloader with a fast locator so tests do not sleep for seconds.
pub fn downloader(tools: FakeTools) -> Downloader<FakeTools> {
    let locator = Locator::with_intervals(
        Duration::from_millis(300),
        Duration::from_millis(10),
        Duration::ZERO,
    );
    Downloader::new(tools, locator, 3)
}
