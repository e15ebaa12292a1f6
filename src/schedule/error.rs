//! Error types for schedule storage, fetching and editing.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Prayer;

/// Errors raised while loading, fetching or editing prayer schedules.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A schedule or settings file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A schedule or settings file is not valid JSON.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The requested saved schedule does not exist.
    #[error("Saved schedule not found: {0}")]
    NotFound(String),

    /// A file name that would escape the data directory.
    #[error("Invalid schedule file name: {0}")]
    InvalidFileName(String),

    /// City or country missing.
    #[error("City and country must not be empty")]
    InvalidLocation,

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The timing API could not be reached.
    #[error("Network error fetching month {month}: {message}")]
    Network { month: u32, message: String },

    /// The timing API answered with an error or an unexpected body.
    #[error("API error for month {month}: {message}")]
    Api { month: u32, message: String },

    /// A date key that is not `YYYY-MM-DD`.
    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// A time that is not `HH:MM`.
    #[error("Invalid time '{0}' (expected HH:MM, 24-hour)")]
    InvalidTime(String),

    /// The schedule has no entry for the date being edited.
    #[error("No prayer times for {0} in the active schedule")]
    MissingDay(String),

    /// An edit was requested with nothing loaded.
    #[error("No schedule is loaded")]
    NoActiveSchedule,
}

impl ScheduleError {
    /// Returns true for failures reaching the timing API.
    pub fn is_network_error(&self) -> bool {
        matches!(self, ScheduleError::Network { .. })
    }

    /// Returns true for failures caused by user input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScheduleError::InvalidFileName(_)
                | ScheduleError::InvalidLocation
                | ScheduleError::InvalidDate(_)
                | ScheduleError::InvalidTime(_)
        )
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ScheduleError::Network { .. } => "Failed to connect. Check internet.".to_string(),
            other => other.to_string(),
        }
    }

    pub(crate) fn invalid_prayer_time(prayer: Prayer, time: &str) -> Self {
        ScheduleError::InvalidTime(format!("{prayer} {time}"))
    }
}
