//! In-place edits and lookups on a yearly schedule.

use std::path::Path;

use chrono::NaiveDate;

use super::error::ScheduleError;
use super::resolver::resolve_date_key;
use crate::types::{date_key, parse_date_key, DayEntry, Prayer, PrayerTime, YearlySchedule};

/// Changes one prayer's time on one day.
///
/// Returns the parsed date so callers can tell whether today was edited.
pub fn set_prayer_time(
    schedule: &mut YearlySchedule,
    key: &str,
    prayer: Prayer,
    time: &str,
) -> Result<NaiveDate, ScheduleError> {
    let date = parse_date_key(key).ok_or_else(|| ScheduleError::InvalidDate(key.to_string()))?;
    let parsed = parse_strict_time(time)
        .ok_or_else(|| ScheduleError::invalid_prayer_time(prayer, time))?;
    let entry = schedule
        .get_mut(key)
        .ok_or_else(|| ScheduleError::MissingDay(key.to_string()))?;

    entry.set_time(prayer, parsed);
    Ok(date)
}

/// Uses `path` as the Adhan for `prayer` on every day.
pub fn set_prayer_adhan(schedule: &mut YearlySchedule, prayer: Prayer, path: &Path) {
    schedule.set_adhan_for_all(prayer, path);
}

/// Returns the normalized entry for `key`, or the `N/A` placeholder if
/// the schedule has no such day. Defaults to `today` when `key` is None.
pub fn show_day(
    schedule: &YearlySchedule,
    key: Option<&str>,
    today: NaiveDate,
    default_adhan: &Path,
) -> Result<(String, DayEntry), ScheduleError> {
    let key = match key {
        Some(k) => {
            parse_date_key(k).ok_or_else(|| ScheduleError::InvalidDate(k.to_string()))?;
            k.to_string()
        }
        None => date_key(today),
    };
    let entry = resolve_date_key(schedule, &key, default_adhan)
        .unwrap_or_else(|| DayEntry::unavailable(default_adhan));
    Ok((key, entry))
}

/// Accepts only `HH:MM` with two-digit fields.
fn parse_strict_time(time: &str) -> Option<PrayerTime> {
    let time = time.trim();
    let bytes = time.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    PrayerTime::parse(time)
}
