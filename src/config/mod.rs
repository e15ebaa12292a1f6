//! Application configuration.
//!
//! Settings are resolved once at process start from a JSON file
//! (`<config dir>/adhan/config.json` by default). Every field has a
//! default, so a missing file or a partial file is valid.

mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use error::ConfigError;

/// Application directory name under the platform config/data dirs.
const APP_DIR: &str = "adhan";

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.json";

/// Default Adhan audio file name, looked up under `<data dir>/adhan/audios`.
const DEFAULT_ADHAN_FILE: &str = "azan1.mp3";

/// ISNA (North America).
const DEFAULT_CALCULATION_METHOD: u8 = 2;

/// Reference polling cadence in seconds.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Largest accepted cadence. Keeps at least one tick in every wall-clock
/// minute even when a tick runs late.
const MAX_POLL_INTERVAL_SECS: u64 = 45;

fn base_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_player_path() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/VLC.app/Contents/MacOS/VLC")
    } else if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files\VideoLAN\VLC\vlc.exe")
    } else {
        PathBuf::from("/usr/bin/vlc")
    }
}

fn default_adhan_path() -> PathBuf {
    base_data_dir().join("audios").join(DEFAULT_ADHAN_FILE)
}

fn default_data_dir() -> PathBuf {
    base_data_dir().join("prayer-times")
}

fn default_settings_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_calculation_method() -> u8 {
    DEFAULT_CALCULATION_METHOD
}

fn default_socket_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".adhan")
        .join("adhan.sock")
}

/// Adhan scheduler configuration.
///
/// # Example
///
/// ```
/// use adhan::config::AdhanConfig;
///
/// let config: AdhanConfig = serde_json::from_str(r#"{"poll_interval_secs": 15}"#).unwrap();
/// assert_eq!(config.poll_interval_secs, 15);
/// assert_eq!(config.calculation_method, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdhanConfig {
    /// External player executable (VLC).
    #[serde(default = "default_player_path")]
    pub player_path: PathBuf,

    /// Adhan played when a prayer has no override, and the fallback
    /// when an override file is missing.
    #[serde(default = "default_adhan_path")]
    pub default_adhan_path: PathBuf,

    /// Directory holding saved yearly schedules (`<city>_<country>.json`).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding user settings such as the home location.
    #[serde(default = "default_settings_dir")]
    pub settings_dir: PathBuf,

    /// Seconds between scheduler ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Timing API calculation method.
    #[serde(default = "default_calculation_method")]
    pub calculation_method: u8,

    /// Unix socket the daemon listens on.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
}

impl Default for AdhanConfig {
    fn default() -> Self {
        Self {
            player_path: default_player_path(),
            default_adhan_path: default_adhan_path(),
            data_dir: default_data_dir(),
            settings_dir: default_settings_dir(),
            poll_interval_secs: default_poll_interval_secs(),
            calculation_method: default_calculation_method(),
            socket_path: default_socket_path(),
        }
    }
}

impl AdhanConfig {
    /// Returns the default config file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        default_settings_dir().join(CONFIG_FILE)
    }

    /// Loads the configuration from `path`, using defaults if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a
    /// value fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Validates value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 || self.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_secs must be between 1 and {MAX_POLL_INTERVAL_SECS}"
            )));
        }
        if self.player_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("player_path must not be empty".to_string()));
        }
        if self.default_adhan_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "default_adhan_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the tick period.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
