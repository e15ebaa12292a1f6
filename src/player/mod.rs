//! Adhan audio trigger.
//!
//! This module starts Adhan playback for the scheduler:
//!
//! - Audio file resolution with fallback to the default Adhan
//! - Out-of-process playback through an external player (VLC)
//! - Asynchronous completion reporting through a callback
//! - Graceful degradation: every failure is a value, never a panic
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   AdhanPlayer    │ ← Capability used by the scheduling engine
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ resolve_audio_   │────▶│ requested file   │
//! │ path             │     ├──────────────────┤
//! │                  │────▶│ default Adhan    │
//! └────────┬─────────┘     └──────────────────┘
//!          ▼
//! ┌──────────────────┐
//! │ VLC child process│ → on_finish(PlaybackOutcome)
//! └──────────────────┘
//! ```

mod error;
mod source;
mod vlc;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub use error::PlayerError;
pub use source::resolve_audio_path;
pub use vlc::VlcPlayer;

/// How a playback attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The player process exited (code is None if killed by a signal).
    Finished { code: Option<i32> },
    /// The player process could not be supervised.
    Failed(String),
}

/// Invoked once when playback ends.
pub type PlaybackCallback = Box<dyn FnOnce(PlaybackOutcome) + Send + 'static>;

/// Trait for Adhan playback implementations.
///
/// Implementations must not block: `play` returns once playback has been
/// handed off, and `on_finish` is called later from a background task.
pub trait AdhanPlayer: Send + Sync {
    /// Starts playing `audio`. `label` names the prayer for logging.
    ///
    /// # Errors
    ///
    /// Returns an error if playback could not be started. `on_finish`
    /// is not called in that case.
    fn play(&self, audio: &Path, label: &str, on_finish: PlaybackCallback)
        -> Result<(), PlayerError>;

    /// Returns true if the player can currently start playback.
    fn is_available(&self) -> bool;
}

/// Mock Adhan player for testing.
///
/// Records every request and holds the completion callbacks until
/// [`MockAdhanPlayer::finish_all`] is called.
pub struct MockAdhanPlayer {
    play_calls: Mutex<Vec<(PathBuf, String)>>,
    pending: Mutex<Vec<PlaybackCallback>>,
    available: AtomicBool,
    should_fail: AtomicBool,
}

impl Default for MockAdhanPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdhanPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            play_calls: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.play_calls.lock().unwrap().len()
    }

    /// Returns `(audio, label)` for every accepted request.
    #[must_use]
    pub fn get_play_calls(&self) -> Vec<(PathBuf, String)> {
        self.play_calls.lock().unwrap().clone()
    }

    /// Returns the labels of every accepted request, in order.
    #[must_use]
    pub fn played_labels(&self) -> Vec<String> {
        self.play_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, label)| label.clone())
            .collect()
    }

    /// Completes every in-flight playback. Returns how many finished.
    pub fn finish_all(&self, outcome: PlaybackOutcome) -> usize {
        let pending: Vec<PlaybackCallback> = self.pending.lock().unwrap().drain(..).collect();
        let count = pending.len();
        for on_finish in pending {
            on_finish(outcome.clone());
        }
        count
    }
}

impl std::fmt::Debug for MockAdhanPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAdhanPlayer")
            .field("play_calls", &self.play_calls.lock().unwrap().len())
            .field("pending", &self.pending.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}

impl AdhanPlayer for MockAdhanPlayer {
    fn play(
        &self,
        audio: &Path,
        label: &str,
        on_finish: PlaybackCallback,
    ) -> Result<(), PlayerError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(PlayerError::PlayerNotFound("mock".to_string()));
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(PlayerError::SpawnFailed(
                label.to_string(),
                "Mock failure".to_string(),
            ));
        }
        self.play_calls
            .lock()
            .unwrap()
            .push((audio.to_path_buf(), label.to_string()));
        self.pending.lock().unwrap().push(on_finish);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
