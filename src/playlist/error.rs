use crate::playlist::PipelineReport;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Could not start the downloader {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("The downloader's stdout could not be piped")]
    StdoutNotPiped,

    #[error("Could not read the downloader's output: {0}")]
    OutputRead(#[source] std::io::Error),

    #[error("Could not wait for the downloader to exit: {0}")]
    Wait(#[source] std::io::Error),

    #[error("The downloader exited with {status} ({report})")]
    DownloaderFailed {
        status: ExitStatus,
        report: PipelineReport,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
