use crate::playlist::conversion::error::{ConversionError, ConversionResult};
use crate::playlist::conversion::tagger::{TagWriter, TrackTags};
use crate::playlist::parser::models::TrackName;
use crate::playlist::registry::{TrackPosition, TrackRegistry};
use log::{debug, error, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::{self, JoinSet};

pub mod error;
pub mod tagger;

/// Extension of the artifact the downloader leaves behind once transcoding finished.
pub const FINAL_EXTENSION: &str = "mp3";

/// Everything a conversion unit needs to post-process one finished track.
#[derive(Debug, Clone)]
pub struct PendingConversion {
    pub track: TrackName,
    pub artist: String,
    pub album: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedTrack {
    pub path: PathBuf,
    pub track_number: Option<TrackPosition>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: usize,
    pub failed: usize,
}

/// Spawns one independent task per finished track and joins them all at the end.
pub struct ConversionDispatcher {
    directory: PathBuf,
    registry: Arc<TrackRegistry>,
    tag_writer: Arc<dyn TagWriter>,
    tasks: JoinSet<ConversionResult<ConvertedTrack>>,
    summary: ConversionSummary,
}

impl ConversionDispatcher {
    pub fn new(
        directory: impl AsRef<Path>,
        registry: Arc<TrackRegistry>,
        tag_writer: Arc<dyn TagWriter>,
    ) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            registry,
            tag_writer,
            tasks: JoinSet::new(),
            summary: ConversionSummary::default(),
        }
    }

    /// Starts converting `pending` in the background. Never waits.
    pub fn dispatch(&mut self, pending: PendingConversion) {
        debug!("Dispatching conversion of {:?}", pending.track.canonical);

        let directory = self.directory.clone();
        let registry = self.registry.clone();
        let tag_writer = self.tag_writer.clone();

        self.tasks
            .spawn(async move { convert(&directory, &registry, tag_writer, pending).await });
    }

    /// Reports the units that already completed without waiting for the others.
    pub fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            self.report(result);
        }
    }

    /// Waits for every dispatched unit, however many were spawned.
    pub async fn join_all(mut self) -> ConversionSummary {
        while let Some(result) = self.tasks.join_next().await {
            self.report(result);
        }

        self.summary
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    fn report(&mut self, result: Result<ConversionResult<ConvertedTrack>, task::JoinError>) {
        match result.map_err(ConversionError::from).and_then(|r| r) {
            Ok(converted) => {
                self.summary.converted += 1;
                match converted.track_number {
                    Some(n) => info!("Tagged track {n}: {:?}", converted.path),
                    None => info!("Tagged {:?} without a track number", converted.path),
                }
            }
            Err(err) => {
                self.summary.failed += 1;
                error!("Conversion failed: {err}");
            }
        }
    }
}

async fn convert(
    directory: &Path,
    registry: &TrackRegistry,
    tag_writer: Arc<dyn TagWriter>,
    pending: PendingConversion,
) -> ConversionResult<ConvertedTrack> {
    let from = directory.join(pending.track.file_name(FINAL_EXTENSION));
    let to = directory.join(pending.track.canonical_file_name(FINAL_EXTENSION));

    rename_track(&from, &to).await?;

    let track_number = registry.lookup(&pending.track.canonical).await;
    let tags = TrackTags {
        artist: pending.artist,
        album: pending.album,
        title: pending.track.canonical,
        track_number,
    };

    let path = to.clone();
    task::spawn_blocking(move || tag_writer.write_tags(&path, &tags)).await??;

    Ok(ConvertedTrack {
        path: to,
        track_number,
    })
}

async fn rename_track(from: &Path, to: &Path) -> ConversionResult<()> {
    let rename_error = |source| ConversionError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    // Linking fails if `to` exists, which a plain rename would silently replace.
    match tokio::fs::hard_link(from, to).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            return Err(ConversionError::RenameTargetExists {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            });
        }
        Err(err) => return Err(rename_error(err)),
    }

    tokio::fs::remove_file(from).await.map_err(rename_error)?;
    debug!("Renamed {from:?} to {to:?}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::conversion::tagger::Id3TagWriter;
    use crate::playlist::parser::parse_track_name;
    use id3::{Tag, TagLike};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records tag writes instead of touching the file, optionally stalling on one title.
    #[derive(Default)]
    struct RecordingTagWriter {
        slow_title: Option<String>,
        writes: Mutex<Vec<TrackTags>>,
    }

    impl TagWriter for RecordingTagWriter {
        fn write_tags(&self, _path: &Path, tags: &TrackTags) -> ConversionResult<()> {
            if self.slow_title.as_deref() == Some(tags.title.as_str()) {
                std::thread::sleep(Duration::from_millis(300));
            }
            self.writes.lock().unwrap().push(tags.clone());
            Ok(())
        }
    }

    fn pending(file_name: &str) -> PendingConversion {
        PendingConversion {
            track: parse_track_name(file_name).unwrap(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
        }
    }

    fn create_track(dir: &Path, file_name: &str) {
        std::fs::write(dir.join(file_name), vec![0u8; 128]).unwrap();
    }

    #[tokio::test]
    async fn renames_and_tags_track() {
        let dir = tempfile::tempdir().unwrap();
        create_track(dir.path(), "Opening-0123456789a.mp3");

        let registry = Arc::new(TrackRegistry::new());
        registry.record("Opening").await;

        let mut dispatcher =
            ConversionDispatcher::new(dir.path(), registry, Arc::new(Id3TagWriter));
        dispatcher.dispatch(pending("Opening-0123456789a.webm"));
        let summary = dispatcher.join_all().await;

        assert_eq!(summary, ConversionSummary { converted: 1, failed: 0 });
        assert!(!dir.path().join("Opening-0123456789a.mp3").exists());

        let tag = Tag::read_from_path(dir.path().join("Opening.mp3")).unwrap();
        assert_eq!(tag.artist(), Some("Artist"));
        assert_eq!(tag.album(), Some("Album"));
        assert_eq!(tag.title(), Some("Opening"));
        assert_eq!(tag.track(), Some(1));
    }

    #[tokio::test]
    async fn missing_source_skips_tagging() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(RecordingTagWriter::default());

        let mut dispatcher = ConversionDispatcher::new(
            dir.path(),
            Arc::new(TrackRegistry::new()),
            writer.clone(),
        );
        dispatcher.dispatch(pending("Ghost-0123456789a.webm"));
        let summary = dispatcher.join_all().await;

        assert_eq!(summary, ConversionSummary { converted: 0, failed: 1 });
        assert!(writer.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_target_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        create_track(dir.path(), "Twice-0123456789a.mp3");
        std::fs::write(dir.path().join("Twice.mp3"), b"keep me").unwrap();
        let writer = Arc::new(RecordingTagWriter::default());

        let err = convert(
            dir.path(),
            &TrackRegistry::new(),
            writer.clone(),
            pending("Twice-0123456789a.webm"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ConversionError::RenameTargetExists { .. }));
        assert_eq!(std::fs::read(dir.path().join("Twice.mp3")).unwrap(), b"keep me");
        assert!(dir.path().join("Twice-0123456789a.mp3").exists());
        assert!(writer.writes.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn same_canonical_name_never_overwrites_a_track() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Echo-0123456789a.mp3"), b"first take").unwrap();
        std::fs::write(dir.path().join("Echo-0123456789b.mp3"), b"second take").unwrap();
        let writer = Arc::new(RecordingTagWriter::default());

        let mut dispatcher = ConversionDispatcher::new(
            dir.path(),
            Arc::new(TrackRegistry::new()),
            writer.clone(),
        );
        dispatcher.dispatch(pending("Echo-0123456789a.webm"));
        dispatcher.dispatch(pending("Echo-0123456789b.webm"));
        let summary = dispatcher.join_all().await;

        assert_eq!(summary, ConversionSummary { converted: 1, failed: 1 });
        assert_eq!(writer.writes.lock().unwrap().len(), 1);

        let renamed = std::fs::read(dir.path().join("Echo.mp3")).unwrap();
        let leftover = ["Echo-0123456789a.mp3", "Echo-0123456789b.mp3"]
            .iter()
            .map(|name| dir.path().join(name))
            .filter(|path| path.exists())
            .map(|path| std::fs::read(path).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(leftover.len(), 1);

        let mut contents = vec![renamed, leftover[0].clone()];
        contents.sort();
        assert_eq!(contents, vec![b"first take".to_vec(), b"second take".to_vec()]);
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_other_units() {
        let dir = tempfile::tempdir().unwrap();
        create_track(dir.path(), "Present-0123456789a.mp3");
        let writer = Arc::new(RecordingTagWriter::default());

        let registry = Arc::new(TrackRegistry::new());
        registry.record("Missing").await;
        registry.record("Present").await;

        let mut dispatcher = ConversionDispatcher::new(dir.path(), registry, writer.clone());
        dispatcher.dispatch(pending("Missing-0123456789a.webm"));
        dispatcher.dispatch(pending("Present-0123456789a.webm"));
        let summary = dispatcher.join_all().await;

        assert_eq!(summary, ConversionSummary { converted: 1, failed: 1 });
        let writes = writer.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].title, "Present");
        assert_eq!(writes[0].track_number, Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn track_numbers_do_not_depend_on_completion_order() {
        let dir = tempfile::tempdir().unwrap();
        create_track(dir.path(), "First-0123456789a.mp3");
        create_track(dir.path(), "Second-0123456789a.mp3");
        let writer = Arc::new(RecordingTagWriter {
            slow_title: Some("First".to_string()),
            ..Default::default()
        });

        let registry = Arc::new(TrackRegistry::new());
        registry.record("First").await;
        registry.record("Second").await;

        let mut dispatcher = ConversionDispatcher::new(dir.path(), registry, writer.clone());
        dispatcher.dispatch(pending("First-0123456789a.webm"));
        dispatcher.dispatch(pending("Second-0123456789a.webm"));
        assert_eq!(dispatcher.in_flight(), 2);
        let summary = dispatcher.join_all().await;

        assert_eq!(summary, ConversionSummary { converted: 2, failed: 0 });
        let writes = writer.writes.lock().unwrap();
        assert_eq!(writes[0].title, "Second");
        assert_eq!(writes[0].track_number, Some(2));
        assert_eq!(writes[1].title, "First");
        assert_eq!(writes[1].track_number, Some(1));
    }

    #[tokio::test]
    async fn unregistered_track_is_tagged_without_number() {
        let dir = tempfile::tempdir().unwrap();
        create_track(dir.path(), "Loose-0123456789a.mp3");
        let writer = Arc::new(RecordingTagWriter::default());

        let converted = convert(
            dir.path(),
            &TrackRegistry::new(),
            writer.clone(),
            pending("Loose-0123456789a.webm"),
        )
        .await
        .unwrap();

        assert_eq!(converted.track_number, None);
        assert_eq!(converted.path, dir.path().join("Loose.mp3"));
        assert_eq!(writer.writes.lock().unwrap()[0].track_number, None);
    }
}
