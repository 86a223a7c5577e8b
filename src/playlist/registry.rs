use log::warn;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub type TrackPosition = u32;

/// Maps canonical track names to their 1-based position in the playlist.
///
/// Written by the output reader only, read by every conversion unit.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    inner: RwLock<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    positions: HashMap<String, TrackPosition>,
    last_position: TrackPosition,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next position to `name` and returns it.
    ///
    /// A name that was already recorded keeps its first position.
    pub async fn record(&self, name: &str) -> TrackPosition {
        let mut state = self.inner.write().await;
        state.last_position += 1;
        let position = state.last_position;

        if let Some(existing) = state.positions.get(name) {
            warn!("Track {name:?} appears twice in the playlist, keeping track number {existing}");
        } else {
            state.positions.insert(name.to_string(), position);
        }

        position
    }

    pub async fn lookup(&self, name: &str) -> Option<TrackPosition> {
        self.inner.read().await.positions.get(name).copied()
    }

    /// Number of positions handed out so far.
    pub async fn track_count(&self) -> usize {
        self.inner.read().await.last_position as usize
    }
}
