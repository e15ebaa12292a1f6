//! External-process Adhan playback through VLC.
//!
//! VLC runs headless (`--intf dummy --play-and-exit`) as a child process.
//! The call returns as soon as the process is spawned; a background task
//! waits for it to exit and reports the outcome through the callback.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, error, info};

use super::error::PlayerError;
use super::source::resolve_audio_path;
use super::{AdhanPlayer, PlaybackCallback, PlaybackOutcome};

/// Arguments that make VLC play one file without a window and exit.
const VLC_ARGS: &[&str] = &["--intf", "dummy", "--play-and-exit", "--no-video"];

/// Plays Adhan files by spawning an external VLC process.
#[derive(Debug, Clone)]
pub struct VlcPlayer {
    /// Path to the VLC executable.
    player_path: PathBuf,
    /// Fallback audio when a requested file is missing.
    default_adhan: PathBuf,
}

impl VlcPlayer {
    /// Creates a player for the given executable and default Adhan file.
    pub fn new(player_path: impl Into<PathBuf>, default_adhan: impl Into<PathBuf>) -> Self {
        Self {
            player_path: player_path.into(),
            default_adhan: default_adhan.into(),
        }
    }

    /// Returns the player executable path.
    #[must_use]
    pub fn player_path(&self) -> &Path {
        &self.player_path
    }
}

impl AdhanPlayer for VlcPlayer {
    fn play(
        &self,
        audio: &Path,
        label: &str,
        on_finish: PlaybackCallback,
    ) -> Result<(), PlayerError> {
        info!("Attempting to play Adhan for {} from {}", label, audio.display());

        let resolved = resolve_audio_path(audio, &self.default_adhan)?;

        if !self.is_available() {
            error!(
                "Player executable not found at {}, cannot play Adhan",
                self.player_path.display()
            );
            return Err(PlayerError::PlayerNotFound(
                self.player_path.display().to_string(),
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PlayerError::NoRuntime)?;

        debug!(
            "Spawning {} {} {}",
            self.player_path.display(),
            VLC_ARGS.join(" "),
            resolved.display()
        );
        let mut child = Command::new(&self.player_path)
            .args(VLC_ARGS)
            .arg(&resolved)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlayerError::SpawnFailed(label.to_string(), e.to_string()))?;

        let label = label.to_string();
        runtime.spawn(async move {
            let outcome = match child.wait().await {
                Ok(status) => {
                    info!("Player for {} exited with {}", label, status);
                    PlaybackOutcome::Finished {
                        code: status.code(),
                    }
                }
                Err(e) => {
                    error!("Failed waiting on player for {}: {}", label, e);
                    PlaybackOutcome::Failed(e.to_string())
                }
            };
            on_finish(outcome);
        });

        Ok(())
    }

    fn is_available(&self) -> bool {
        self.player_path.is_file()
    }
}
