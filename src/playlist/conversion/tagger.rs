use crate::playlist::conversion::error::{ConversionError, ConversionResult};
use crate::playlist::registry::TrackPosition;
use id3::{ErrorKind, Tag, TagLike, Version};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub track_number: Option<TrackPosition>,
}

/// Writes metadata into a finished track. Called from a blocking thread.
pub trait TagWriter: Send + Sync {
    fn write_tags(&self, path: &Path, tags: &TrackTags) -> ConversionResult<()>;
}

/// Writes ID3v2.3 frames, keeping whatever other frames the file already carries.
pub struct Id3TagWriter;

impl TagWriter for Id3TagWriter {
    fn write_tags(&self, path: &Path, tags: &TrackTags) -> ConversionResult<()> {
        let to_error = |source| ConversionError::TagWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(err) if matches!(err.kind, ErrorKind::NoTag) => Tag::new(),
            Err(err) => return Err(to_error(err)),
        };

        tag.set_artist(tags.artist.as_str());
        tag.set_album(tags.album.as_str());
        tag.set_title(tags.title.as_str());
        if let Some(track_number) = tags.track_number {
            tag.set_track(track_number);
        }

        tag.write_to_path(path, Version::Id3v23).map_err(to_error)?;

        File::open(path)
            .and_then(|file| file.sync_all())
            .map_err(|err| to_error(err.into()))
    }
}
