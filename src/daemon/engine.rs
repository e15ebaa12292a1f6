//! Scheduling engine session.
//!
//! One `EngineSession` exists per running schedule. Each tick compares the
//! wall clock with today's prayer times and triggers the Adhan at most
//! once per prayer per day:
//!
//! - On a calendar date change, today's entry is re-resolved and the
//!   played set cleared
//! - With no entry for today, ticks do nothing
//! - Prayers are scanned in canonical order; the first due one that has
//!   not played yet is triggered, and the scan stops
//! - Matching is exact to the minute; a minute with no tick is missed

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Timelike};
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::surface::SurfaceProvider;
use crate::player::{AdhanPlayer, PlaybackCallback, PlaybackOutcome};
use crate::schedule::resolve_today;
use crate::types::{DayEntry, Prayer, YearlySchedule};

// ============================================================================
// EngineContext
// ============================================================================

/// Collaborators shared by every session of a scheduler.
#[derive(Clone)]
pub struct EngineContext {
    pub player: Arc<dyn AdhanPlayer>,
    pub clock: Arc<dyn Clock>,
    /// Adhan used for prayers without an override.
    pub default_adhan: PathBuf,
    /// Time between ticks.
    pub poll_interval: Duration,
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("default_adhan", &self.default_adhan)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EngineSession
// ============================================================================

/// State of one running schedule.
pub struct EngineSession {
    context: EngineContext,
    schedule: Arc<YearlySchedule>,
    /// Today's normalized entry, None when the schedule has no such day.
    today: Option<DayEntry>,
    /// Calendar date `today` was resolved for.
    loaded_for: NaiveDate,
    played: HashSet<Prayer>,
    surface: Option<SurfaceProvider>,
    cancelled: Arc<AtomicBool>,
}

impl EngineSession {
    /// Creates a session and resolves today's entry.
    pub fn new(
        context: EngineContext,
        schedule: Arc<YearlySchedule>,
        surface: Option<SurfaceProvider>,
    ) -> Self {
        let date = context.clock.now().date();
        let today = resolve_today(&schedule, date, &context.default_adhan);
        if today.is_none() {
            info!("No prayer times for {} in the loaded schedule", date);
        }
        Self {
            context,
            schedule,
            today,
            loaded_for: date,
            played: HashSet::new(),
            surface,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs one scheduling step. Returns the prayer triggered, if any.
    pub fn tick(&mut self) -> Option<Prayer> {
        if self.is_cancelled() {
            return None;
        }

        let now = self.context.clock.now();
        if now.date() != self.loaded_for {
            info!("Date changed to {}, reloading today's prayer times", now.date());
            self.resolve(now.date());
        }

        let (hour, minute) = (now.hour(), now.minute());
        let today = self.today.as_ref()?;

        let (prayer, audio) = Prayer::ALL.into_iter().find_map(|prayer| {
            if self.played.contains(&prayer) {
                return None;
            }
            let audio = today.adhan(prayer)?;
            today
                .time(prayer)
                .filter(|t| t.matches(hour, minute))
                .map(|_| (prayer, audio.to_path_buf()))
        })?;

        debug!("{} due at {:02}:{:02}", prayer, hour, minute);
        self.played.insert(prayer);
        self.trigger(prayer, &audio);
        Some(prayer)
    }

    /// Swaps in a new schedule, re-resolving today and clearing the
    /// played set. Does nothing on a cancelled session.
    pub fn replace(&mut self, schedule: Arc<YearlySchedule>) {
        if self.is_cancelled() {
            return;
        }
        self.schedule = schedule;
        self.resolve(self.context.clock.now().date());
        info!("Schedule replaced");
    }

    /// Swaps in an edited schedule and re-resolves today, keeping the
    /// played set so nothing already played today plays again.
    pub fn update_schedule(&mut self, schedule: Arc<YearlySchedule>) {
        if self.is_cancelled() {
            return;
        }
        self.schedule = schedule;
        self.today = resolve_today(&self.schedule, self.loaded_for, &self.context.default_adhan);
        debug!("Schedule updated, {} prayer(s) already played today", self.played.len());
    }

    /// Ends the session: later ticks and playback completions are ignored.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.schedule = Arc::default();
        self.today = None;
        self.played.clear();
        self.surface = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Today's resolved entry.
    pub fn today(&self) -> Option<&DayEntry> {
        self.today.as_ref()
    }

    pub fn has_played(&self, prayer: Prayer) -> bool {
        self.played.contains(&prayer)
    }

    /// Prayers played today, in canonical order.
    pub fn played(&self) -> Vec<Prayer> {
        Prayer::ALL
            .into_iter()
            .filter(|p| self.played.contains(p))
            .collect()
    }

    fn resolve(&mut self, date: NaiveDate) {
        self.today = resolve_today(&self.schedule, date, &self.context.default_adhan);
        self.loaded_for = date;
        self.played.clear();
        if self.today.is_none() {
            info!("No prayer times for {} in the loaded schedule", date);
        }
    }

    fn trigger(&self, prayer: Prayer, audio: &Path) {
        info!("Time for {}, playing Adhan", prayer);
        let on_finish = self.completion_callback(prayer);
        match self.context.player.play(audio, prayer.as_str(), on_finish) {
            Ok(()) => self.notify(prayer, true),
            Err(e) => error!(
                "Could not play Adhan for {}: {} ({})",
                prayer,
                e,
                e.suggestion()
            ),
        }
    }

    fn notify(&self, prayer: Prayer, playing: bool) {
        if let Some(surface) = self.surface.as_ref().and_then(|provider| provider()) {
            surface.playing_status(prayer, playing);
        }
    }

    fn completion_callback(&self, prayer: Prayer) -> PlaybackCallback {
        let cancelled = Arc::clone(&self.cancelled);
        let surface = self.surface.clone();
        Box::new(move |outcome| {
            match outcome {
                PlaybackOutcome::Finished { code: Some(0) } => {
                    info!("Adhan for {} finished", prayer)
                }
                PlaybackOutcome::Finished { code } => {
                    warn!("Adhan player for {} exited with {:?}", prayer, code)
                }
                PlaybackOutcome::Failed(e) => warn!("Adhan playback for {} failed: {}", prayer, e),
            }
            if cancelled.load(Ordering::SeqCst) {
                debug!("Session stopped, not reporting end of {}", prayer);
                return;
            }
            if let Some(surface) = surface.as_ref().and_then(|provider| provider()) {
                surface.playing_status(prayer, false);
            }
        })
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("days", &self.schedule.len())
            .field("loaded_for", &self.loaded_for)
            .field("has_today", &self.today.is_some())
            .field("played", &self.played())
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
