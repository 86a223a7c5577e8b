use crate::playlist::conversion::tagger::TagWriter;
use crate::playlist::conversion::{ConversionDispatcher, PendingConversion};
use crate::playlist::downloader::DownloaderConfig;
use crate::playlist::error::{PipelineError, PipelineResult};
use crate::playlist::parser::classify_line;
use crate::playlist::parser::models::{TrackEvent, TrackName};
use crate::playlist::registry::TrackRegistry;
use indicatif::{MultiProgress, ProgressBar};
use log::{debug, info, warn};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;

pub mod conversion;
pub mod downloader;
pub mod error;
pub mod parser;
pub mod registry;

/// The playlist to fetch and the tags every track of it receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRequest {
    pub url: String,
    pub artist: String,
    pub album: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub tracks_recorded: usize,
    pub converted: usize,
    pub failed: usize,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tracks announced, {} converted, {} failed",
            self.tracks_recorded, self.converted, self.failed
        )
    }
}

#[derive(Debug)]
enum PipelineState {
    AwaitingStart,
    AwaitingDestination,
    AwaitingDeletionMarker(TrackName),
    Finished,
}

/// Runs the downloader in `directory` and converts every track as soon as it is ready.
///
/// Returns only once the downloader exited and every conversion unit finished, even
/// when the downloader fails.
pub async fn download_playlist(
    config: &DownloaderConfig,
    request: &PlaylistRequest,
    directory: &Path,
    tag_writer: Arc<dyn TagWriter>,
    progress: &MultiProgress,
) -> PipelineResult<PipelineReport> {
    let (mut child, stdout) = config.spawn(&request.url, directory)?;

    let registry = Arc::new(TrackRegistry::new());
    let mut dispatcher = ConversionDispatcher::new(directory, registry.clone(), tag_writer);

    let spinner = progress.add(ProgressBar::new_spinner());
    spinner.set_message("Waiting for the downloader...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut consumer = OutputConsumer {
        state: PipelineState::AwaitingStart,
        request,
        registry: &registry,
        dispatcher: &mut dispatcher,
        spinner: &spinner,
    };

    let (read_result, wait_result) = tokio::join!(consumer.consume(stdout), child.wait());

    spinner.set_message(format!(
        "Waiting for {} conversions...",
        dispatcher.in_flight()
    ));
    let summary = dispatcher.join_all().await;
    spinner.finish_and_clear();

    let report = PipelineReport {
        tracks_recorded: registry.track_count().await,
        converted: summary.converted,
        failed: summary.failed,
    };

    read_result?;
    let status = wait_result.map_err(PipelineError::Wait)?;
    if !status.success() {
        return Err(PipelineError::DownloaderFailed { status, report });
    }

    info!("Done: {report}");

    Ok(report)
}

struct OutputConsumer<'a> {
    state: PipelineState,
    request: &'a PlaylistRequest,
    registry: &'a TrackRegistry,
    dispatcher: &'a mut ConversionDispatcher,
    spinner: &'a ProgressBar,
}

impl OutputConsumer<'_> {
    async fn consume(&mut self, stdout: ChildStdout) -> PipelineResult<()> {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(PipelineError::OutputRead)?;
            if read == 0 {
                break;
            }

            let line = decode_line(&buf);
            self.handle_line(&line).await;
            self.dispatcher.reap_finished();

            if matches!(self.state, PipelineState::Finished) {
                break;
            }
        }

        // Whatever follows the end marker is discarded, but the pipe must not fill up.
        tokio::io::copy(&mut reader, &mut tokio::io::sink())
            .await
            .map_err(PipelineError::OutputRead)?;

        Ok(())
    }

    async fn handle_line(&mut self, line: &str) {
        let event = classify_line(line);
        let state = std::mem::replace(&mut self.state, PipelineState::Finished);

        self.state = match (state, event) {
            (PipelineState::Finished, _) => PipelineState::Finished,
            (_, TrackEvent::PlaylistFinished) => {
                info!("Finished downloading playlist");
                PipelineState::Finished
            }
            (PipelineState::AwaitingStart, TrackEvent::PlaylistStarted { title }) => {
                info!("{title}");
                PipelineState::AwaitingDestination
            }
            (state, TrackEvent::PlaylistStarted { title }) => {
                debug!("Ignoring repeated playlist marker: {title}");
                state
            }
            (state, TrackEvent::TrackDestination(track)) => {
                abandon_pending(state);

                let position = self.registry.record(&track.canonical).await;
                info!("Downloading track {position}: {}", track.canonical);
                self.spinner
                    .set_message(format!("Downloading track {position}: {}", track.canonical));

                PipelineState::AwaitingDeletionMarker(track)
            }
            (PipelineState::AwaitingDeletionMarker(track), TrackEvent::TrackDeletedOriginal) => {
                self.dispatcher.dispatch(PendingConversion {
                    track,
                    artist: self.request.artist.clone(),
                    album: self.request.album.clone(),
                });
                PipelineState::AwaitingDestination
            }
            (state, TrackEvent::TrackDeletedOriginal) => {
                debug!("Deletion marker without a pending track: {line}");
                state
            }
            (state, TrackEvent::MalformedDestination(raw)) => {
                abandon_pending(state);
                warn!("Destination {raw:?} is too short to carry a track identifier, skipping it");
                PipelineState::AwaitingDestination
            }
            (state, TrackEvent::Unrecognized) => state,
        };
    }
}

/// Drops a track that was announced but never finalized, returning it.
fn abandon_pending(state: PipelineState) -> Option<TrackName> {
    match state {
        PipelineState::AwaitingDeletionMarker(track) => {
            warn!(
                "{:?} was never finalized, it will not be renamed or tagged",
                track.canonical
            );
            Some(track)
        }
        _ => None,
    }
}

/// Lossy UTF-8 view of one output line without its line terminator.
fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes)
}
