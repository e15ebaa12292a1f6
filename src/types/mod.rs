//! Core data types for the Adhan scheduler.
//!
//! This module defines the data structures used for:
//! - Prayers and their scheduled times of day
//! - Per-day and yearly prayer schedules (the on-disk JSON format)
//! - IPC request/response serialization

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Prayer
// ============================================================================

/// One of the five daily prayers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    /// All prayers in canonical (chronological) order.
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    /// Returns the display name of the prayer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prayer::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown prayer '{s}' (expected one of Fajr, Dhuhr, Asr, Maghrib, Isha)")
            })
    }
}

// ============================================================================
// PrayerTime
// ============================================================================

/// A wall-clock time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrayerTime {
    pub hour: u32,
    pub minute: u32,
}

impl PrayerTime {
    /// Creates a time, returning None when out of range.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parses `HH:MM`, ignoring anything after the first whitespace
    /// (the timing API appends a zone such as `"05:12 (EET)"`).
    pub fn parse(s: &str) -> Option<Self> {
        let token = s.split_whitespace().next()?;
        let (hour, minute) = token.split_once(':')?;
        let is_field =
            |f: &str| (1..=2).contains(&f.len()) && f.bytes().all(|b| b.is_ascii_digit());
        if !is_field(hour) || !is_field(minute) {
            return None;
        }
        Self::new(hour.parse().ok()?, minute.parse().ok()?)
    }

    /// Returns true if this time falls on the given hour and minute.
    pub fn matches(&self, hour: u32, minute: u32) -> bool {
        self.hour == hour && self.minute == minute
    }
}

impl fmt::Display for PrayerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ============================================================================
// Date keys
// ============================================================================

/// Formats a calendar date as a schedule key (`YYYY-MM-DD`).
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a strict `YYYY-MM-DD` schedule key.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let bytes = key.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

// ============================================================================
// DayEntry
// ============================================================================

/// One calendar day's prayer times and per-prayer Adhan overrides.
///
/// Serialized as the flat object used by saved schedule files:
/// `{"Fajr": "05:12", ..., "FajrAdhan": "/path/azan.mp3", ..., "hijri": ..., "readableDate": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    #[serde(rename = "Fajr", default)]
    pub fajr: Option<String>,
    #[serde(rename = "Dhuhr", default)]
    pub dhuhr: Option<String>,
    #[serde(rename = "Asr", default)]
    pub asr: Option<String>,
    #[serde(rename = "Maghrib", default)]
    pub maghrib: Option<String>,
    #[serde(rename = "Isha", default)]
    pub isha: Option<String>,

    #[serde(rename = "FajrAdhan", default)]
    pub fajr_adhan: Option<PathBuf>,
    #[serde(rename = "DhuhrAdhan", default)]
    pub dhuhr_adhan: Option<PathBuf>,
    #[serde(rename = "AsrAdhan", default)]
    pub asr_adhan: Option<PathBuf>,
    #[serde(rename = "MaghribAdhan", default)]
    pub maghrib_adhan: Option<PathBuf>,
    #[serde(rename = "IshaAdhan", default)]
    pub isha_adhan: Option<PathBuf>,

    /// Hijri calendar date as reported by the timing API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hijri: Option<String>,
    /// Human-readable gregorian date (e.g. "18 May 2025").
    #[serde(rename = "readableDate", default, skip_serializing_if = "Option::is_none")]
    pub readable_date: Option<String>,
}

impl DayEntry {
    /// Creates an entry with the given times and no Adhan overrides.
    pub fn with_times(times: [&str; 5]) -> Self {
        let mut entry = Self::default();
        for (prayer, time) in Prayer::ALL.into_iter().zip(times) {
            *entry.time_slot_mut(prayer) = Some(time.to_string());
        }
        entry
    }

    /// Placeholder shown for a date the schedule has no entry for.
    pub fn unavailable(default_adhan: &Path) -> Self {
        let mut entry = Self::with_times(["N/A"; 5]);
        entry.readable_date = Some("Date Not Available".to_string());
        entry.hijri = Some("N/A".to_string());
        entry.fill_default_adhans(default_adhan);
        entry
    }

    /// Returns the raw time string for a prayer.
    pub fn time_str(&self, prayer: Prayer) -> Option<&str> {
        self.time_slot(prayer).as_deref()
    }

    /// Returns the parsed scheduled time, or None if missing or malformed.
    pub fn time(&self, prayer: Prayer) -> Option<PrayerTime> {
        self.time_str(prayer).and_then(PrayerTime::parse)
    }

    /// Sets the scheduled time for a prayer.
    pub fn set_time(&mut self, prayer: Prayer, time: PrayerTime) {
        *self.time_slot_mut(prayer) = Some(time.to_string());
    }

    /// Returns the Adhan override for a prayer. Empty paths count as unset.
    pub fn adhan(&self, prayer: Prayer) -> Option<&Path> {
        self.adhan_slot(prayer)
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Sets (or clears) the Adhan override for a prayer.
    pub fn set_adhan(&mut self, prayer: Prayer, path: Option<PathBuf>) {
        *self.adhan_slot_mut(prayer) = path;
    }

    /// Replaces every unset Adhan override with `default_adhan`.
    ///
    /// Returns the prayers that were corrected. Applying this to an
    /// already-normalized entry changes nothing.
    pub fn fill_default_adhans(&mut self, default_adhan: &Path) -> Vec<Prayer> {
        let missing: Vec<Prayer> = Prayer::ALL
            .into_iter()
            .filter(|p| self.adhan(*p).is_none())
            .collect();
        for prayer in &missing {
            *self.adhan_slot_mut(*prayer) = Some(default_adhan.to_path_buf());
        }
        missing
    }

    /// Returns true if every prayer has an Adhan resource.
    pub fn is_normalized(&self) -> bool {
        Prayer::ALL.into_iter().all(|p| self.adhan(p).is_some())
    }

    fn time_slot(&self, prayer: Prayer) -> &Option<String> {
        match prayer {
            Prayer::Fajr => &self.fajr,
            Prayer::Dhuhr => &self.dhuhr,
            Prayer::Asr => &self.asr,
            Prayer::Maghrib => &self.maghrib,
            Prayer::Isha => &self.isha,
        }
    }

    fn time_slot_mut(&mut self, prayer: Prayer) -> &mut Option<String> {
        match prayer {
            Prayer::Fajr => &mut self.fajr,
            Prayer::Dhuhr => &mut self.dhuhr,
            Prayer::Asr => &mut self.asr,
            Prayer::Maghrib => &mut self.maghrib,
            Prayer::Isha => &mut self.isha,
        }
    }

    fn adhan_slot(&self, prayer: Prayer) -> &Option<PathBuf> {
        match prayer {
            Prayer::Fajr => &self.fajr_adhan,
            Prayer::Dhuhr => &self.dhuhr_adhan,
            Prayer::Asr => &self.asr_adhan,
            Prayer::Maghrib => &self.maghrib_adhan,
            Prayer::Isha => &self.isha_adhan,
        }
    }

    fn adhan_slot_mut(&mut self, prayer: Prayer) -> &mut Option<PathBuf> {
        match prayer {
            Prayer::Fajr => &mut self.fajr_adhan,
            Prayer::Dhuhr => &mut self.dhuhr_adhan,
            Prayer::Asr => &mut self.asr_adhan,
            Prayer::Maghrib => &mut self.maghrib_adhan,
            Prayer::Isha => &mut self.isha_adhan,
        }
    }
}

// ============================================================================
// YearlySchedule
// ============================================================================

/// A year of day entries keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearlySchedule {
    days: BTreeMap<String, DayEntry>,
}

impl YearlySchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for a date key.
    pub fn get(&self, key: &str) -> Option<&DayEntry> {
        self.days.get(key)
    }

    /// Returns a mutable entry for a date key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut DayEntry> {
        self.days.get_mut(key)
    }

    /// Inserts or replaces the entry for a date key.
    pub fn insert(&mut self, key: impl Into<String>, entry: DayEntry) -> Option<DayEntry> {
        self.days.insert(key.into(), entry)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Iterates over entries in date order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DayEntry)> {
        self.days.iter()
    }

    /// Back-fills missing Adhan overrides on every day.
    ///
    /// Returns `(date_key, prayer)` for each corrected field.
    pub fn normalize(&mut self, default_adhan: &Path) -> Vec<(String, Prayer)> {
        let mut corrected = Vec::new();
        for (key, entry) in &mut self.days {
            for prayer in entry.fill_default_adhans(default_adhan) {
                corrected.push((key.clone(), prayer));
            }
        }
        corrected
    }

    /// Sets the Adhan override for one prayer on every day.
    pub fn set_adhan_for_all(&mut self, prayer: Prayer, path: &Path) {
        for entry in self.days.values_mut() {
            entry.set_adhan(prayer, Some(path.to_path_buf()));
        }
    }
}

impl FromIterator<(String, DayEntry)> for YearlySchedule {
    fn from_iter<I: IntoIterator<Item = (String, DayEntry)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Locations
// ============================================================================

/// A city/country pair identifying a saved schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// A schedule file found in the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub city: String,
    pub country: String,
    pub filename: String,
}

/// The last playing-status event reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayingStatus {
    pub prayer: Prayer,
    pub playing: bool,
    /// Local time the event was recorded (`YYYY-MM-DD HH:MM:SS`).
    pub at: String,
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Load (or fetch) a location's schedule and start the scheduler
    Load {
        #[serde(flatten)]
        location: Location,
    },
    /// Show the prayer times for a date (today when omitted)
    Show {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
    },
    /// Query the current status
    Status,
    /// Stop the scheduler
    Stop,
    /// Change one prayer's time on one day of the active schedule
    SetTime {
        date: String,
        prayer: Prayer,
        time: String,
    },
    /// Use a custom Adhan file for one prayer on every day
    SetAdhan { prayer: Prayer, path: PathBuf },
    /// List saved schedule files
    List,
    /// Delete a saved schedule file
    Delete { filename: String },
    /// Save the home location
    SetHome {
        #[serde(flatten)]
        location: Location,
    },
    /// Read the home location
    GetHome,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Active location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Whether the scheduler is running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    /// Date key the day data refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Prayer times for `date`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<DayEntry>,
    /// Prayers already played today
    #[serde(skip_serializing_if = "Option::is_none")]
    pub played: Option<Vec<Prayer>>,
    /// Last playing-status event
    #[serde(rename = "lastPlaying", skip_serializing_if = "Option::is_none")]
    pub last_playing: Option<PlayingStatus>,
    /// Saved schedule files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<Vec<SavedLocation>>,
    /// Home location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<Location>,
    /// True if the schedule had to be fetched from the timing API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched: Option<bool>,
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
