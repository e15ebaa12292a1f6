//! Adhan Scheduler Library
//!
//! This library provides the core functionality for the Adhan CLI.
//! It includes:
//! - Prayer-time engine and scheduler that trigger the Adhan on time
//! - Yearly schedule storage, fetching and editing
//! - External audio player integration (VLC)
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Configuration and shared type definitions

pub mod cli;
pub mod config;
pub mod daemon;
pub mod player;
pub mod schedule;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{AdhanConfig, ConfigError};
pub use types::{
    DayEntry, IpcRequest, IpcResponse, Location, Prayer, PrayerTime, ResponseData,
    YearlySchedule,
};

// Re-export engine types
pub use daemon::{
    AdhanScheduler, Clock, EngineContext, ManualClock, NotificationSurface, SchedulerError,
    SystemClock,
};

// Re-export player types
pub use player::{AdhanPlayer, MockAdhanPlayer, PlaybackOutcome, PlayerError, VlcPlayer};

// Re-export schedule types
pub use schedule::{PrayerTimesClient, ScheduleError, ScheduleStore};
