//! Engine lifecycle controller.
//!
//! `AdhanScheduler` owns at most one `EngineSession` and the tokio task
//! that ticks it. It is the only entry point the rest of the daemon uses
//! to start, stop or update scheduling.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::engine::{EngineContext, EngineSession};
use super::surface::SurfaceProvider;
use crate::types::{DayEntry, Prayer, YearlySchedule};

// ============================================================================
// SchedulerError
// ============================================================================

/// Errors returned by the scheduler's entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Start was called with a schedule holding no days.
    #[error("Cannot start the scheduler with an empty schedule")]
    EmptySchedule,

    /// Start was called outside a tokio runtime.
    #[error("No async runtime available to run the scheduler")]
    NoRuntime,
}

// ============================================================================
// AdhanScheduler
// ============================================================================

struct ActiveSession {
    session: Arc<Mutex<EngineSession>>,
    handle: JoinHandle<()>,
}

/// Starts, stops and updates the scheduling engine.
pub struct AdhanScheduler {
    context: EngineContext,
    active: Option<ActiveSession>,
}

impl AdhanScheduler {
    pub fn new(context: EngineContext) -> Self {
        Self {
            context,
            active: None,
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Starts scheduling `schedule`, replacing any running session.
    ///
    /// The first tick happens one poll interval after this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedule is empty or no tokio runtime is
    /// available. The previous session is stopped either way.
    pub fn start(
        &mut self,
        schedule: Arc<YearlySchedule>,
        surface: SurfaceProvider,
    ) -> Result<(), SchedulerError> {
        self.stop();

        if schedule.is_empty() {
            return Err(SchedulerError::EmptySchedule);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let days = schedule.len();
        let session = Arc::new(Mutex::new(EngineSession::new(
            self.context.clone(),
            schedule,
            Some(surface),
        )));
        let handle = runtime.spawn(run_ticks(Arc::clone(&session), self.context.poll_interval));

        self.active = Some(ActiveSession { session, handle });
        info!(
            "Adhan scheduler started ({} days, checking every {:?})",
            days, self.context.poll_interval
        );
        Ok(())
    }

    /// Stops scheduling. Safe to call when not running.
    ///
    /// No tick acts and no playing status is reported after this returns.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.handle.abort();
        lock(&active.session).cancel();
        info!("Adhan scheduler stopped");
    }

    /// Swaps the running session's schedule, keeping its timer.
    ///
    /// Returns false (and does nothing) if the scheduler is stopped.
    pub fn replace(&self, schedule: Arc<YearlySchedule>) -> bool {
        match &self.active {
            Some(active) => {
                lock(&active.session).replace(schedule);
                true
            }
            None => {
                debug!("Replace ignored, scheduler is not running");
                false
            }
        }
    }

    /// Applies an edited schedule to the running session without
    /// forgetting which prayers already played today.
    ///
    /// Returns false (and does nothing) if the scheduler is stopped.
    pub fn update(&self, schedule: Arc<YearlySchedule>) -> bool {
        match &self.active {
            Some(active) => {
                lock(&active.session).update_schedule(schedule);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Prayers already played today by the running session.
    pub fn played_today(&self) -> Vec<Prayer> {
        self.active
            .as_ref()
            .map(|active| lock(&active.session).played())
            .unwrap_or_default()
    }

    /// Today's resolved entry in the running session.
    pub fn today(&self) -> Option<DayEntry> {
        self.active
            .as_ref()
            .and_then(|active| lock(&active.session).today().cloned())
    }
}

impl Drop for AdhanScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AdhanScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdhanScheduler")
            .field("context", &self.context)
            .field("running", &self.is_running())
            .finish()
    }
}

fn lock(session: &Mutex<EngineSession>) -> std::sync::MutexGuard<'_, EngineSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ticks `session` every `period` until it is cancelled.
async fn run_ticks(session: Arc<Mutex<EngineSession>>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let running = {
            let mut session = lock(&session);
            if session.is_cancelled() {
                false
            } else {
                session.tick();
                true
            }
        };
        if !running {
            break;
        }
    }
    debug!("Tick loop ended");
}

// ============================================================================
// Tests
// ============================================================================
