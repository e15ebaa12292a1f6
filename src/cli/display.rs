//! Display utilities for the Adhan CLI.
//!
//! This module provides formatted output for:
//! - Daily prayer-time tables
//! - Scheduler status
//! - Saved schedules and the home location
//! - Error messages

use crate::types::{DayEntry, IpcResponse, Prayer, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a `load` request.
    pub fn show_load(response: &IpcResponse) {
        println!("* {}", response.message);
        if let Some(data) = &response.data {
            if let (Some(date), Some(day)) = (&data.date, &data.day) {
                println!();
                print!("{}", Self::format_day(date, day));
            }
        }
    }

    /// Shows a day's prayer times.
    pub fn show_day(response: &IpcResponse) {
        match response.data.as_ref().and_then(|d| d.date.as_deref().zip(d.day.as_ref())) {
            Some((date, day)) => print!("{}", Self::format_day(date, day)),
            None => println!("No prayer times available"),
        }
    }

    /// Shows the current scheduler status.
    pub fn show_status(response: &IpcResponse) {
        match &response.data {
            Some(data) => print!("{}", Self::format_status(data)),
            None => println!("The daemon did not report a status"),
        }
    }

    /// Shows the saved schedules.
    pub fn show_list(response: &IpcResponse) {
        let saved = response
            .data
            .as_ref()
            .and_then(|d| d.saved.as_deref())
            .unwrap_or_default();
        if saved.is_empty() {
            println!("No saved schedules");
            return;
        }
        println!("Saved schedules:");
        for entry in saved {
            println!("  {}, {}  ({})", entry.city, entry.country, entry.filename);
        }
    }

    /// Shows the home location.
    pub fn show_home(response: &IpcResponse) {
        match response.data.as_ref().and_then(|d| d.home.as_ref()) {
            Some(home) => println!("Home location: {}", home),
            None => println!("{}", response.message),
        }
    }

    /// Shows a plain success message.
    pub fn show_message(response: &IpcResponse) {
        println!("* {}", response.message);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Formats one day as a table of prayer times.
    fn format_day(date: &str, day: &DayEntry) -> String {
        let mut out = String::new();
        match &day.readable_date {
            Some(readable) => out.push_str(&format!("Prayer times for {} ({})\n", readable, date)),
            None => out.push_str(&format!("Prayer times for {}\n", date)),
        }
        if let Some(hijri) = &day.hijri {
            out.push_str(&format!("Hijri: {}\n", hijri));
        }
        out.push_str("─────────────────────────────\n");
        for prayer in Prayer::ALL {
            let time = day.time_str(prayer).unwrap_or("--:--");
            match day.adhan(prayer) {
                Some(adhan) => out.push_str(&format!(
                    "{:<8} {}  {}\n",
                    prayer.as_str(),
                    time,
                    Self::file_label(adhan)
                )),
                None => out.push_str(&format!("{:<8} {}\n", prayer.as_str(), time)),
            }
        }
        out
    }

    fn format_status(data: &ResponseData) -> String {
        let mut out = String::from("Adhan scheduler status\n─────────────────────────────\n");
        match &data.location {
            Some(location) => out.push_str(&format!("Location: {}\n", location)),
            None => out.push_str("Location: none loaded\n"),
        }
        let running = if data.running.unwrap_or(false) {
            "running"
        } else {
            "stopped"
        };
        out.push_str(&format!("Scheduler: {}\n", running));
        if let Some(date) = &data.date {
            out.push_str(&format!("Date: {}\n", date));
        }
        if let Some(day) = &data.day {
            let next: Vec<String> = Prayer::ALL
                .iter()
                .filter_map(|p| day.time_str(*p).map(|t| format!("{} {}", p, t)))
                .collect();
            if !next.is_empty() {
                out.push_str(&format!("Today: {}\n", next.join(", ")));
            }
        }
        let played = data.played.as_deref().unwrap_or_default();
        if played.is_empty() {
            out.push_str("Played today: none\n");
        } else {
            let names: Vec<&str> = played.iter().map(|p| p.as_str()).collect();
            out.push_str(&format!("Played today: {}\n", names.join(", ")));
        }
        if let Some(last) = &data.last_playing {
            let state = if last.playing { "started" } else { "finished" };
            out.push_str(&format!("Last Adhan: {} {} at {}\n", last.prayer, state, last.at));
        }
        out
    }

    /// Shortens an audio path to its file name.
    fn file_label(path: &std::path::Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
