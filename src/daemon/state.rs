//! Daemon-wide state behind the IPC handler.
//!
//! Tracks the active location and its schedule, and keeps the scheduler,
//! the schedule files and the status board consistent with each other.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::engine::EngineContext;
use super::scheduler::AdhanScheduler;
use super::surface::{fixed_surface, StatusBoard, SurfaceProvider};
use crate::config::AdhanConfig;
use crate::player::VlcPlayer;
use crate::schedule::{
    self, schedule_file_name, transform_days, PrayerTimesClient, ScheduleError, ScheduleStore,
};
use crate::types::{date_key, DayEntry, Location, Prayer, ResponseData, SavedLocation, YearlySchedule};

/// The schedule the daemon is currently serving.
#[derive(Debug, Clone)]
pub struct ActiveSchedule {
    pub location: Location,
    pub filename: String,
    pub schedule: Arc<YearlySchedule>,
}

/// Mutable daemon state, shared by connections behind a mutex.
#[derive(Debug)]
pub struct DaemonState {
    scheduler: AdhanScheduler,
    store: ScheduleStore,
    fetcher: PrayerTimesClient,
    board: Arc<StatusBoard>,
    active: Option<ActiveSchedule>,
}

impl DaemonState {
    pub fn new(scheduler: AdhanScheduler, store: ScheduleStore, fetcher: PrayerTimesClient) -> Self {
        Self {
            scheduler,
            store,
            fetcher,
            board: Arc::new(StatusBoard::new()),
            active: None,
        }
    }

    /// Builds the production state: VLC playback and the system clock.
    pub fn from_config(config: &AdhanConfig) -> Result<Self> {
        let context = EngineContext {
            player: Arc::new(VlcPlayer::new(
                &config.player_path,
                &config.default_adhan_path,
            )),
            clock: Arc::new(SystemClock),
            default_adhan: config.default_adhan_path.clone(),
            poll_interval: config.poll_interval(),
        };
        let fetcher = PrayerTimesClient::new(config.calculation_method)?;
        Ok(Self::new(
            AdhanScheduler::new(context),
            ScheduleStore::from_config(config),
            fetcher,
        ))
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn scheduler(&self) -> &AdhanScheduler {
        &self.scheduler
    }

    pub fn board(&self) -> &Arc<StatusBoard> {
        &self.board
    }

    pub fn active(&self) -> Option<&ActiveSchedule> {
        self.active.as_ref()
    }

    fn surface_provider(&self) -> SurfaceProvider {
        fixed_surface(self.board.clone())
    }

    fn today(&self) -> NaiveDate {
        self.scheduler.context().clock.now().date()
    }

    fn default_adhan(&self) -> &Path {
        self.store.default_adhan()
    }

    fn active_or_err(&self) -> Result<&ActiveSchedule, ScheduleError> {
        self.active.as_ref().ok_or(ScheduleError::NoActiveSchedule)
    }

    /// Makes `schedule` the active one and starts the engine on it.
    ///
    /// A freshly fetched schedule is saved first.
    pub fn activate(
        &mut self,
        location: Location,
        mut schedule: YearlySchedule,
        fetched: bool,
    ) -> Result<ResponseData> {
        if fetched {
            self.store
                .save(&location.city, &location.country, &schedule)
                .context("Failed to save prayer times")?;
        }
        schedule.normalize(self.default_adhan());

        let schedule = Arc::new(schedule);
        let provider = self.surface_provider();
        self.board.clear();
        if let Err(e) = self.scheduler.start(Arc::clone(&schedule), provider) {
            // The previous session is already stopped
            self.active = None;
            return Err(e.into());
        }

        info!("Serving prayer times for {}", location);
        self.active = Some(ActiveSchedule {
            filename: schedule_file_name(&location.city, &location.country),
            location,
            schedule,
        });

        let mut data = self.status();
        data.fetched = Some(fetched);
        Ok(data)
    }

    /// Returns the day shown for `date` (today when None).
    pub fn show(&self, date: Option<&str>) -> Result<(String, DayEntry), ScheduleError> {
        let active = self.active_or_err()?;
        schedule::show_day(&active.schedule, date, self.today(), self.default_adhan())
    }

    /// Changes one prayer's time on one day and persists it.
    ///
    /// A running engine picks the edit up immediately. Prayers already
    /// played today stay played.
    pub fn set_prayer_time(&mut self, date: &str, prayer: Prayer, time: &str) -> Result<()> {
        let active = self.active_or_err()?;
        let mut edited = (*active.schedule).clone();
        let edited_date = schedule::set_prayer_time(&mut edited, date, prayer, time)?;
        let location = active.location.clone();

        self.store
            .save(&location.city, &location.country, &edited)
            .context("Failed to save prayer times")?;

        if edited_date == self.today() {
            debug!("Today's {} time changed to {}", prayer, time);
        }
        let edited = Arc::new(edited);
        self.scheduler.update(Arc::clone(&edited));
        self.set_active_schedule(edited);
        Ok(())
    }

    /// Uses `path` as the Adhan for `prayer` on every day and persists it.
    pub fn set_prayer_adhan(&mut self, prayer: Prayer, path: &Path) -> Result<()> {
        let active = self.active_or_err()?;
        if !path.is_file() {
            warn!(
                "Adhan file {} does not exist, the default will play instead",
                path.display()
            );
        }
        let mut edited = (*active.schedule).clone();
        schedule::set_prayer_adhan(&mut edited, prayer, path);
        let location = active.location.clone();

        self.store
            .save(&location.city, &location.country, &edited)
            .context("Failed to save prayer times")?;

        let edited = Arc::new(edited);
        self.scheduler.update(Arc::clone(&edited));
        self.set_active_schedule(edited);
        Ok(())
    }

    fn set_active_schedule(&mut self, schedule: Arc<YearlySchedule>) {
        if let Some(active) = self.active.as_mut() {
            active.schedule = schedule;
        }
    }

    /// Stops the engine. The active location stays selected.
    pub fn stop(&mut self) -> bool {
        let was_running = self.scheduler.is_running();
        self.scheduler.stop();
        was_running
    }

    /// Snapshot for the `status` command.
    pub fn status(&self) -> ResponseData {
        let today = self.today();
        let day = self.scheduler.today().or_else(|| {
            self.active.as_ref().and_then(|active| {
                schedule::resolve_today(&active.schedule, today, self.default_adhan())
            })
        });
        ResponseData {
            location: self.active.as_ref().map(|a| a.location.clone()),
            running: Some(self.scheduler.is_running()),
            date: Some(date_key(today)),
            day,
            played: Some(self.scheduler.played_today()),
            last_playing: self.board.last(),
            ..Default::default()
        }
    }

    pub fn list(&self) -> Result<Vec<SavedLocation>, ScheduleError> {
        self.store.list_saved()
    }

    /// Deletes a saved schedule. Returns true if it was the active one,
    /// in which case the engine is stopped.
    pub fn delete(&mut self, filename: &str) -> Result<bool, ScheduleError> {
        self.store.delete(filename)?;
        let was_active = self
            .active
            .as_ref()
            .is_some_and(|active| active.filename == filename);
        if was_active {
            info!("Active schedule {} deleted, stopping", filename);
            self.scheduler.stop();
            self.active = None;
            self.board.clear();
        }
        Ok(was_active)
    }

    pub fn home(&self) -> Result<Option<Location>, ScheduleError> {
        self.store.load_home()
    }

    pub fn set_home(&self, location: &Location) -> Result<(), ScheduleError> {
        self.store.save_home(location)
    }
}

/// Loads the saved schedule for `location` (fetching and saving it when
/// nothing is saved) and starts the engine on it.
///
/// The state lock is not held while downloading.
pub async fn load_location(state: &Mutex<DaemonState>, location: Location) -> Result<ResponseData> {
    if location.city.trim().is_empty() || location.country.trim().is_empty() {
        return Err(ScheduleError::InvalidLocation.into());
    }

    let (saved, fetcher, year, default_adhan) = {
        let state = state.lock().await;
        (
            state.store.load(&location.city, &location.country),
            state.fetcher.clone(),
            state.today().year(),
            state.default_adhan().to_path_buf(),
        )
    };

    let (schedule, fetched) = match saved? {
        Some(schedule) => {
            info!("Loaded saved prayer times for {}", location);
            (schedule, false)
        }
        None => {
            info!("No saved prayer times for {}, fetching", location);
            let days = fetcher
                .fetch_year(&location.city, &location.country, year, |percent| {
                    debug!("Fetch progress: {}%", percent)
                })
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            let schedule = transform_days(&days, &default_adhan);
            if schedule.is_empty() {
                return Err(anyhow!("The timing API returned no days for {}", location));
            }
            (schedule, true)
        }
    };

    state.lock().await.activate(location, schedule, fetched)
}
