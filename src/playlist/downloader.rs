use crate::playlist::error::{PipelineError, PipelineResult};
use log::debug;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, ChildStdout, Command};

pub const DEFAULT_DOWNLOADER: &str = "youtube-dl";

/// Playlist mode, audio only, transcoded to MP3 at the best quality, one progress update per line.
const DEFAULT_ARGS: [&str; 7] = [
    "--yes-playlist",
    "--extract-audio",
    "--audio-format",
    "mp3",
    "--audio-quality",
    "0",
    "--newline",
];

/// How the download tool is invoked. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl DownloaderConfig {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self::with_args(program, DEFAULT_ARGS)
    }

    pub fn with_args<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Starts the downloader for `url` inside `directory`, with stdout piped and stderr inherited.
    pub fn spawn(&self, url: &str, directory: &Path) -> PipelineResult<(Child, ChildStdout)> {
        debug!("Starting {:?} {:?} {url}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .current_dir(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(PipelineError::StdoutNotPiped)?;

        Ok((child, stdout))
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DOWNLOADER)
    }
}
