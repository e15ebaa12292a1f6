//! Projects the yearly schedule onto a single calendar day.

use std::path::Path;

use chrono::NaiveDate;

use crate::types::{date_key, DayEntry, YearlySchedule};

/// Returns the normalized entry for `as_of`, or None if the schedule has
/// no prayers that day.
///
/// Every unset Adhan override in the returned copy is back-filled with
/// `default_adhan`; the schedule itself is not modified.
pub fn resolve_today(
    schedule: &YearlySchedule,
    as_of: NaiveDate,
    default_adhan: &Path,
) -> Option<DayEntry> {
    resolve_date_key(schedule, &date_key(as_of), default_adhan)
}

/// Same as [`resolve_today`] for an already formatted `YYYY-MM-DD` key.
pub fn resolve_date_key(
    schedule: &YearlySchedule,
    key: &str,
    default_adhan: &Path,
) -> Option<DayEntry> {
    let mut entry = schedule.get(key)?.clone();
    entry.fill_default_adhans(default_adhan);
    Some(entry)
}
