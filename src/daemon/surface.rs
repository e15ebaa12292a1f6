//! Playing-status notification surfaces.
//!
//! The engine reports `(prayer, playing)` to whatever surface the
//! provider returns at the time of the event. A provider returning None
//! simply means nobody is listening.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use tracing::debug;

use crate::types::{PlayingStatus, Prayer};

/// Receives playing-status notifications.
pub trait NotificationSurface: Send + Sync {
    fn playing_status(&self, prayer: Prayer, playing: bool);
}

/// Returns the current surface, if any.
pub type SurfaceProvider = Arc<dyn Fn() -> Option<Arc<dyn NotificationSurface>> + Send + Sync>;

/// Builds a provider that always returns `surface`.
pub fn fixed_surface(surface: Arc<dyn NotificationSurface>) -> SurfaceProvider {
    Arc::new(move || Some(Arc::clone(&surface)))
}

/// Builds a provider that never has a surface.
pub fn no_surface() -> SurfaceProvider {
    Arc::new(|| None)
}

// ============================================================================
// StatusBoard
// ============================================================================

/// Remembers the most recent playing-status event for `status` queries.
#[derive(Debug, Default)]
pub struct StatusBoard {
    last: Mutex<Option<PlayingStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<PlayingStatus> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl NotificationSurface for StatusBoard {
    fn playing_status(&self, prayer: Prayer, playing: bool) {
        debug!("Playing status: {} {}", prayer, playing);
        let status = PlayingStatus {
            prayer,
            playing,
            at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(status);
    }
}

// ============================================================================
// RecordingSurface
// ============================================================================

/// Surface that records every event. For tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<(Prayer, bool)>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Prayer, bool)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationSurface for RecordingSurface {
    fn playing_status(&self, prayer: Prayer, playing: bool) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((prayer, playing));
    }
}
