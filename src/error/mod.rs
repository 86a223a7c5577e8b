use std::path::PathBuf;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaylistTaggerError {
    #[error("Error creating album directory {path:?}: {source}")]
    CreateAlbumDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error entering album directory {path:?}: {source}")]
    EnterAlbumDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type PlaylistTaggerResult<T> = result::Result<T, PlaylistTaggerError>;
