use crate::FacingMode;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub id: u64,
    pub label: String,
    pub facing: FacingMode,
}

/// Book-keeping of live tracks shared between a backend and the streams it
/// hands out, so the backend can still list them after the stream moved to
/// another thread.
#[derive(Debug, Clone, Default)]
pub struct TrackRegistry {
    next_id: Arc<AtomicU64>,
    tracks: Arc<Mutex<Vec<TrackInfo>>>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, label: impl Into<String>, facing: FacingMode) -> TrackInfo {
        let track = TrackInfo {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
            facing,
        };

        self.lock().push(track.clone());
        log::debug!("track {} ({}) started", track.id, track.label);
        track
    }

    pub fn release(&self, id: u64) {
        let mut tracks = self.lock();
        if let Some(pos) = tracks.iter().position(|t| t.id == id) {
            let track = tracks.remove(pos);
            log::debug!("track {} ({}) stopped", track.id, track.label);
        }
    }

    pub fn list(&self) -> Vec<TrackInfo> {
        self.lock().clone()
    }

    pub fn is_active(&self, facing: FacingMode) -> bool {
        self.lock().iter().any(|t| t.facing == facing)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TrackInfo>> {
        // the list stays consistent even if a holder panicked
        self.tracks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
