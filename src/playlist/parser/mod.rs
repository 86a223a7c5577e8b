use crate::playlist::parser::models::{TrackEvent, TrackName};

pub mod models;

const LINE_PREFIX: &str = "[download] ";
const PLAYLIST_STARTED_MARKER: &str = "[download] Downloading playlist:";
const DESTINATION_MARKER: &str = "[download] Destination:";
const DELETED_ORIGINAL_MARKER: &str = "Deleting original file";
const PLAYLIST_FINISHED_MARKER: &str = "[download] Finished downloading playlist:";

/// Intermediate container formats the downloader writes before transcoding.
const CONTAINER_EXTENSIONS: [&str; 2] = [".m4a", ".webm"];

/// Length of the content identifier the downloader appends to every file name, in characters.
pub const IDENTIFIER_LENGTH: usize = 12;

/// Classifies one line of downloader output.
pub fn classify_line(line: &str) -> TrackEvent {
    if line.starts_with(PLAYLIST_FINISHED_MARKER) {
        TrackEvent::PlaylistFinished
    } else if line.starts_with(PLAYLIST_STARTED_MARKER) {
        TrackEvent::PlaylistStarted {
            title: line.strip_prefix(LINE_PREFIX).unwrap_or(line).to_string(),
        }
    } else if let Some(raw) = line.strip_prefix(DESTINATION_MARKER) {
        let raw = raw.strip_prefix(' ').unwrap_or(raw);
        match parse_track_name(raw) {
            Some(name) => TrackEvent::TrackDestination(name),
            None => TrackEvent::MalformedDestination(raw.to_string()),
        }
    } else if line.contains(DELETED_ORIGINAL_MARKER) {
        TrackEvent::TrackDeletedOriginal
    } else {
        TrackEvent::Unrecognized
    }
}

/// Splits a destination file name into its identifier-bearing stem and canonical name.
///
/// Returns `None` when nothing would be left of the name once the identifier is removed.
pub fn parse_track_name(file_name: &str) -> Option<TrackName> {
    let stem = CONTAINER_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .unwrap_or(file_name);

    let canonical = strip_identifier(stem)?;

    Some(TrackName {
        stem: stem.to_string(),
        canonical: canonical.to_string(),
    })
}

fn strip_identifier(stem: &str) -> Option<&str> {
    let char_count = stem.chars().count();
    if char_count <= IDENTIFIER_LENGTH {
        return None;
    }

    // Cut on a char boundary, names are routinely non-ASCII.
    let (cut, _) = stem.char_indices().nth(char_count - IDENTIFIER_LENGTH)?;
    Some(&stem[..cut])
}
