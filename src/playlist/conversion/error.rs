use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Could not rename {from:?} to {to:?}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not rename {from:?}, {to:?} already exists")]
    RenameTargetExists { from: PathBuf, to: PathBuf },

    #[error("Could not write tags to {path:?}: {source}")]
    TagWrite {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),
}

pub type ConversionResult<T> = Result<T, ConversionError>;
