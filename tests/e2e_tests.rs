//! End-to-end tests for the Adhan daemon.
//!
//! These tests drive the daemon state through a whole day on paused
//! tokio time with a manual clock and a mock player:
//! - Each prayer plays once at its time
//! - Playing status reaches the status board
//! - Edits made while running take effect
//! - Midnight rollover picks up the next day
//! - Stopping and player failures

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use adhan::daemon::{AdhanScheduler, DaemonState, EngineContext, ManualClock};
use adhan::player::{MockAdhanPlayer, PlaybackOutcome};
use adhan::schedule::{PrayerTimesClient, ScheduleStore};
use adhan::types::{DayEntry, Location, Prayer, YearlySchedule};

// ============================================================================
// Test Helpers
// ============================================================================

const PERIOD: Duration = Duration::from_secs(30);
const DEFAULT_ADHAN: &str = "/audio/azan1.mp3";

fn at(date: &str, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn schedule() -> YearlySchedule {
    [
        ("2025-01-01", ["05:30", "12:10", "15:20", "17:45", "19:05"]),
        ("2025-01-02", ["05:31", "12:10", "15:21", "17:46", "19:06"]),
    ]
    .into_iter()
    .map(|(k, times)| (k.to_string(), DayEntry::with_times(times)))
    .collect()
}

struct Harness {
    _dir: tempfile::TempDir,
    state: DaemonState,
    player: Arc<MockAdhanPlayer>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new(now: NaiveDateTime) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let player = Arc::new(MockAdhanPlayer::new());
        let clock = Arc::new(ManualClock::new(now));
        let context = EngineContext {
            player: player.clone(),
            clock: clock.clone(),
            default_adhan: PathBuf::from(DEFAULT_ADHAN),
            poll_interval: PERIOD,
        };
        let store = ScheduleStore::new(
            dir.path().join("data"),
            dir.path().join("settings"),
            DEFAULT_ADHAN,
        );
        let state = DaemonState::new(
            AdhanScheduler::new(context),
            store,
            PrayerTimesClient::new(2).unwrap(),
        );
        Self {
            _dir: dir,
            state,
            player,
            clock,
        }
    }

    fn activate(&mut self) {
        self.state
            .activate(Location::new("Cairo", "Egypt"), schedule(), true)
            .unwrap();
    }

    fn played(&self) -> Vec<Prayer> {
        self.state.status().played.unwrap_or_default()
    }
}

async fn first_tick() {
    tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
}

async fn next_tick() {
    tokio::time::sleep(PERIOD).await;
}

// ============================================================================
// Full Day Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_e2e_full_day_plays_each_prayer_once() {
    let mut h = Harness::new(at("2025-01-01", 5, 29));
    h.activate();

    first_tick().await;
    assert_eq!(h.player.play_count(), 0);

    let times = [(5, 30), (12, 10), (15, 20), (17, 45), (19, 5)];
    for (hour, minute) in times {
        h.clock.set(at("2025-01-01", hour, minute));
        next_tick().await;
        // A second tick within the same minute must not replay
        h.clock.advance(TimeDelta::seconds(30));
        next_tick().await;
        h.player.finish_all(PlaybackOutcome::Finished { code: Some(0) });
    }

    assert_eq!(
        h.player.played_labels(),
        vec!["Fajr", "Dhuhr", "Asr", "Maghrib", "Isha"]
    );
    assert_eq!(h.played(), Prayer::ALL.to_vec());
    for (audio, _) in h.player.get_play_calls() {
        assert_eq!(audio, Path::new(DEFAULT_ADHAN));
    }
}

#[tokio::test(start_paused = true)]
async fn test_e2e_playing_status_reaches_status() {
    let mut h = Harness::new(at("2025-01-01", 5, 30));
    h.activate();

    first_tick().await;

    let playing = h.state.status().last_playing.unwrap();
    assert_eq!(playing.prayer, Prayer::Fajr);
    assert!(playing.playing);

    assert_eq!(
        h.player.finish_all(PlaybackOutcome::Finished { code: Some(0) }),
        1
    );
    let finished = h.state.status().last_playing.unwrap();
    assert_eq!(finished.prayer, Prayer::Fajr);
    assert!(!finished.playing);
}

// ============================================================================
// Edit Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_e2e_edit_today_applies_immediately() {
    let mut h = Harness::new(at("2025-01-01", 11, 0));
    h.activate();
    first_tick().await;

    h.state
        .set_prayer_time("2025-01-01", Prayer::Dhuhr, "11:02")
        .unwrap();
    assert_eq!(
        h.state.status().day.unwrap().time_str(Prayer::Dhuhr),
        Some("11:02")
    );

    h.clock.set(at("2025-01-01", 11, 2));
    first_tick().await;

    assert_eq!(h.player.played_labels(), vec!["Dhuhr"]);
}

#[tokio::test(start_paused = true)]
async fn test_e2e_edit_in_played_minute_does_not_replay() {
    let mut h = Harness::new(at("2025-01-01", 5, 29) + TimeDelta::seconds(50));
    h.activate();

    h.clock.set(at("2025-01-01", 5, 30) + TimeDelta::seconds(20));
    first_tick().await;
    assert_eq!(h.player.played_labels(), vec!["Fajr"]);

    h.state
        .set_prayer_time("2025-01-02", Prayer::Isha, "19:10")
        .unwrap();
    h.state
        .set_prayer_adhan(Prayer::Dhuhr, Path::new("/audio/dhuhr.mp3"))
        .unwrap();
    h.clock.advance(TimeDelta::seconds(30));
    next_tick().await;

    assert_eq!(h.player.play_count(), 1);
    assert_eq!(h.played(), vec![Prayer::Fajr]);
}

#[tokio::test(start_paused = true)]
async fn test_e2e_custom_adhan_is_played() {
    let mut h = Harness::new(at("2025-01-01", 15, 0));
    h.activate();
    h.state
        .set_prayer_adhan(Prayer::Asr, Path::new("/audio/asr.mp3"))
        .unwrap();

    first_tick().await;
    h.clock.set(at("2025-01-01", 15, 20));
    next_tick().await;

    assert_eq!(
        h.player.get_play_calls(),
        vec![(PathBuf::from("/audio/asr.mp3"), "Asr".to_string())]
    );
}

// ============================================================================
// Rollover Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_e2e_midnight_rollover() {
    let mut h = Harness::new(at("2025-01-01", 19, 5));
    h.activate();

    first_tick().await;
    assert_eq!(h.played(), vec![Prayer::Isha]);

    h.clock.set(at("2025-01-02", 0, 0));
    next_tick().await;
    assert!(h.played().is_empty());
    assert_eq!(h.state.status().date.as_deref(), Some("2025-01-02"));

    h.clock.set(at("2025-01-02", 5, 31));
    next_tick().await;

    assert_eq!(h.player.played_labels(), vec!["Isha", "Fajr"]);
    assert_eq!(h.played(), vec![Prayer::Fajr]);
}

#[tokio::test(start_paused = true)]
async fn test_e2e_day_missing_from_schedule_plays_nothing() {
    let mut h = Harness::new(at("2025-01-02", 23, 0));
    h.activate();
    first_tick().await;

    h.clock.set(at("2025-01-03", 5, 31));
    next_tick().await;

    assert_eq!(h.player.play_count(), 0);
    assert!(h.state.status().day.is_none());
    assert!(h.state.scheduler().is_running());
}

// ============================================================================
// Stop and Failure Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_e2e_stop_prevents_playback() {
    let mut h = Harness::new(at("2025-01-01", 5, 29));
    h.activate();
    first_tick().await;

    assert!(h.state.stop());
    h.clock.set(at("2025-01-01", 5, 30));
    next_tick().await;
    next_tick().await;

    assert_eq!(h.player.play_count(), 0);
    assert_eq!(h.state.status().running, Some(false));
    assert_eq!(
        h.state.status().location,
        Some(Location::new("Cairo", "Egypt"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_e2e_player_failure_is_not_retried() {
    let mut h = Harness::new(at("2025-01-01", 5, 30));
    h.player.set_should_fail(true);
    h.activate();

    first_tick().await;
    h.player.set_should_fail(false);
    next_tick().await;

    assert_eq!(h.player.play_count(), 0);
    assert_eq!(h.played(), vec![Prayer::Fajr]);
    assert!(h.state.status().last_playing.is_none());
}
