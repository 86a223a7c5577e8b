use crate::error::{PlaylistTaggerError, PlaylistTaggerResult};
use std::path::{Path, PathBuf};
use tokio::fs::DirBuilder;

#[cfg(unix)]
const ALBUM_DIR_MODE: u32 = 0o770;

/// `<artist>/<album>` below `root`.
pub fn album_dir(root: &Path, artist: &str, album: &str) -> PathBuf {
    root.join(artist).join(album)
}

pub async fn create_album_dir(path: &Path) -> PlaylistTaggerResult<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(ALBUM_DIR_MODE);

    builder
        .create(path)
        .await
        .map_err(|source| PlaylistTaggerError::CreateAlbumDir {
            path: path.to_path_buf(),
            source,
        })
}

/// Creates the album directory and makes it the working directory of the process.
pub async fn create_and_enter_album_dir(path: &Path) -> PlaylistTaggerResult<()> {
    create_album_dir(path).await?;

    std::env::set_current_dir(path).map_err(|source| PlaylistTaggerError::EnterAlbumDir {
        path: path.to_path_buf(),
        source,
    })
}
