//! Adhan audio file resolution.
//!
//! A per-prayer override may point at a file that has since been moved or
//! deleted. Resolution falls back to the configured default Adhan before
//! giving up.

use std::path::{Path, PathBuf};

use tracing::{error, warn};

use super::error::PlayerError;

/// Resolves the audio file to play for `requested`.
///
/// Returns `requested` if it exists, otherwise `default_adhan` if that
/// exists and differs from `requested`.
///
/// # Errors
///
/// Returns `PlayerError::FileNotFound` if neither file exists.
pub fn resolve_audio_path(requested: &Path, default_adhan: &Path) -> Result<PathBuf, PlayerError> {
    if requested.is_file() {
        return Ok(requested.to_path_buf());
    }

    warn!("Adhan audio file not found: {}", requested.display());

    if requested != default_adhan && default_adhan.is_file() {
        warn!("Falling back to default Adhan: {}", default_adhan.display());
        return Ok(default_adhan.to_path_buf());
    }

    error!(
        "Default Adhan also unavailable, cannot play: {}",
        default_adhan.display()
    );
    Err(PlayerError::FileNotFound(default_adhan.display().to_string()))
}
