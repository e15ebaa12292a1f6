//! On-disk storage for yearly schedules and the home location.
//!
//! Schedules live in the data directory as `<city>_<country>.json`; the
//! home location lives in the settings directory as `home_location.json`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::ScheduleError;
use crate::config::AdhanConfig;
use crate::types::{Location, SavedLocation, YearlySchedule};

/// Home location file name inside the settings directory.
const HOME_FILE: &str = "home_location.json";

/// Returns the schedule file name for a location.
///
/// ```
/// use adhan::schedule::schedule_file_name;
///
/// assert_eq!(schedule_file_name("New  York", "USA"), "new_york_usa.json");
/// ```
pub fn schedule_file_name(city: &str, country: &str) -> String {
    format!("{}_{}.json", slug(city), slug(country))
}

fn slug(part: &str) -> String {
    part.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn capitalize_words(words: &[&str]) -> String {
    words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derives a display location from a saved file name.
fn saved_location(filename: &str) -> SavedLocation {
    let stem = filename.strip_suffix(".json").unwrap_or(filename);
    let parts: Vec<&str> = stem.split('_').collect();
    let (city, country) = match parts.split_last() {
        Some((country, city)) if !city.is_empty() => {
            (capitalize_words(city), capitalize_words(&[*country]))
        }
        _ => (capitalize_words(&parts), String::new()),
    };
    SavedLocation {
        city,
        country,
        filename: filename.to_string(),
    }
}

/// File-backed schedule store.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    data_dir: PathBuf,
    settings_dir: PathBuf,
    default_adhan: PathBuf,
}

impl ScheduleStore {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        settings_dir: impl Into<PathBuf>,
        default_adhan: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            settings_dir: settings_dir.into(),
            default_adhan: default_adhan.into(),
        }
    }

    pub fn from_config(config: &AdhanConfig) -> Self {
        Self::new(
            &config.data_dir,
            &config.settings_dir,
            &config.default_adhan_path,
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn default_adhan(&self) -> &Path {
        &self.default_adhan
    }

    /// Creates the data and settings directories.
    pub fn ensure_directories(&self) -> Result<(), ScheduleError> {
        for dir in [&self.data_dir, &self.settings_dir] {
            fs::create_dir_all(dir).map_err(|source| ScheduleError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Writes a schedule as pretty-printed JSON.
    pub fn save(
        &self,
        city: &str,
        country: &str,
        schedule: &YearlySchedule,
    ) -> Result<PathBuf, ScheduleError> {
        let path = self.data_dir.join(schedule_file_name(city, country));
        write_json(&path, schedule)?;
        info!("Saved prayer times to {}", path.display());
        Ok(path)
    }

    /// Loads and normalizes the saved schedule for a location.
    ///
    /// Returns `Ok(None)` if nothing is saved for it.
    pub fn load(&self, city: &str, country: &str) -> Result<Option<YearlySchedule>, ScheduleError> {
        self.load_file(&schedule_file_name(city, country))
    }

    /// Loads and normalizes a saved schedule by file name.
    pub fn load_file(&self, filename: &str) -> Result<Option<YearlySchedule>, ScheduleError> {
        let path = self.checked_path(filename)?;
        let Some(mut schedule) = read_json::<YearlySchedule>(&path)? else {
            debug!("No saved schedule at {}", path.display());
            return Ok(None);
        };

        for (key, prayer) in schedule.normalize(&self.default_adhan) {
            warn!(
                "Missing Adhan for {} on {} in {}, using default",
                prayer, key, filename
            );
        }

        debug!("Loaded {} days from {}", schedule.len(), path.display());
        Ok(Some(schedule))
    }

    /// Lists saved schedules, sorted by file name.
    pub fn list_saved(&self) -> Result<Vec<SavedLocation>, ScheduleError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ScheduleError::Io {
                    path: self.data_dir.clone(),
                    source,
                })
            }
        };

        let mut saved: Vec<SavedLocation> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| name.ends_with(".json"))
            .map(|name| saved_location(&name))
            .collect();
        saved.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(saved)
    }

    /// Deletes a saved schedule.
    pub fn delete(&self, filename: &str) -> Result<(), ScheduleError> {
        let path = self.checked_path(filename)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ScheduleError::NotFound(filename.to_string()))
            }
            Err(source) => Err(ScheduleError::Io { path, source }),
        }
    }

    /// Reads the home location, if one is saved.
    pub fn load_home(&self) -> Result<Option<Location>, ScheduleError> {
        read_json(&self.settings_dir.join(HOME_FILE))
    }

    /// Saves the home location.
    pub fn save_home(&self, location: &Location) -> Result<(), ScheduleError> {
        if location.city.trim().is_empty() || location.country.trim().is_empty() {
            return Err(ScheduleError::InvalidLocation);
        }
        write_json(&self.settings_dir.join(HOME_FILE), location)?;
        info!("Home location set to {}", location);
        Ok(())
    }

    fn checked_path(&self, filename: &str) -> Result<PathBuf, ScheduleError> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename == "."
            || filename == ".."
        {
            return Err(ScheduleError::InvalidFileName(filename.to_string()));
        }
        Ok(self.data_dir.join(filename))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, ScheduleError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ScheduleError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ScheduleError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ScheduleError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ScheduleError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|source| ScheduleError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    })
}
