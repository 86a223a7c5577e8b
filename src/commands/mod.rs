use crate::playlist::PlaylistRequest;
use crate::playlist::downloader::DEFAULT_DOWNLOADER;
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;

/// Downloads a playlist as MP3s, then renames and tags every track as soon as it is ready.
///
/// Tracks are stored in <ARTIST>/<ALBUM> below the current directory.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URL of the playlist to download
    #[arg(long, value_name = "URL", value_parser = NonEmptyStringValueParser::new())]
    pub url: String,

    /// Artist tag, also the first directory level
    #[arg(long, value_name = "ARTIST", value_parser = NonEmptyStringValueParser::new())]
    pub artist: String,

    /// Album tag, also the second directory level
    #[arg(long, value_name = "ALBUM", value_parser = NonEmptyStringValueParser::new())]
    pub album: String,

    /// Download tool to run
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_DOWNLOADER)]
    pub downloader: String,
}

impl Cli {
    pub fn playlist_request(&self) -> PlaylistRequest {
        PlaylistRequest {
            url: self.url.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
        }
    }
}
