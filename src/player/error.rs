//! Audio trigger error types.
//!
//! None of these errors stop the scheduler; the engine logs them and
//! keeps polling.

use thiserror::Error;

/// Errors that can occur when starting Adhan playback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// Neither the requested audio file nor the default one exists.
    #[error("Adhan audio file not found: {0}")]
    FileNotFound(String),

    /// The external player executable is missing.
    #[error("player executable not found: {0}")]
    PlayerNotFound(String),

    /// The player process could not be spawned.
    #[error("failed to start player for {0}: {1}")]
    SpawnFailed(String, String),

    /// Playback was requested outside an async runtime.
    #[error("no async runtime available to supervise playback")]
    NoRuntime,
}

impl PlayerError {
    /// Returns true if this error is related to the audio file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::FileNotFound(_))
    }

    /// Returns true if this error is related to the player executable.
    #[must_use]
    pub fn is_player_error(&self) -> bool {
        matches!(self, Self::PlayerNotFound(_) | Self::SpawnFailed(_, _))
    }

    /// Returns a user-facing suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "Check default_adhan_path in the config file",
            Self::PlayerNotFound(_) => "Install VLC or set player_path in the config file",
            Self::SpawnFailed(_, _) => "Check that player_path points to an executable",
            Self::NoRuntime => "Start playback from within the daemon",
        }
    }
}
