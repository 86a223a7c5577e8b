/// A track name as announced by the downloader, with and without its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackName {
    /// File stem as written by the downloader, extension removed, identifier kept.
    pub stem: String,
    /// Display name with the trailing identifier removed.
    pub canonical: String,
}

impl TrackName {
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.stem)
    }

    pub fn canonical_file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.canonical)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent {
    PlaylistStarted { title: String },
    TrackDestination(TrackName),
    /// Destination line whose file name is too short to carry an identifier.
    MalformedDestination(String),
    TrackDeletedOriginal,
    PlaylistFinished,
    Unrecognized,
}
