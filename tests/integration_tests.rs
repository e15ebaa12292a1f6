//! Integration tests for Daemon-CLI IPC communication.
//!
//! These tests run the real IPC server and request handler against the
//! CLI client, with a mock player, a manual clock and temporary data
//! directories:
//! - Loading a saved schedule and querying it
//! - Editing times and Adhan files through the daemon
//! - Fetching an unsaved location from the timing API
//! - Saved schedules and the home location
//! - Connection error handling

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use mockito::{Matcher, Server};
use tempfile::TempDir;
use tokio::sync::Mutex;

use adhan::cli::IpcClient;
use adhan::daemon::{AdhanScheduler, DaemonState, EngineContext, IpcServer, ManualClock, RequestHandler};
use adhan::player::MockAdhanPlayer;
use adhan::schedule::{PrayerTimesClient, ScheduleStore};
use adhan::types::{DayEntry, Location, Prayer, YearlySchedule};

// ============================================================================
// Test Helpers
// ============================================================================

const DEFAULT_ADHAN: &str = "/audio/azan1.mp3";

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn cairo_schedule() -> YearlySchedule {
    let mut first = DayEntry::with_times(["05:30", "12:10", "15:20", "17:45", "19:05"]);
    first.readable_date = Some("01 Jan 2025".to_string());
    first.hijri = Some("01-07-1446".to_string());
    let second = DayEntry::with_times(["05:31", "12:10", "15:21", "17:46", "19:06"]);
    [("2025-01-01", first), ("2025-01-02", second)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// A daemon serving on a temporary socket.
struct TestDaemon {
    dir: TempDir,
    client: IpcClient,
    player: Arc<MockAdhanPlayer>,
    state: Arc<Mutex<DaemonState>>,
    _server: tokio::task::JoinHandle<()>,
}

impl TestDaemon {
    fn store(&self) -> ScheduleStore {
        ScheduleStore::new(
            self.dir.path().join("data"),
            self.dir.path().join("settings"),
            DEFAULT_ADHAN,
        )
    }

    fn data_file(&self, name: &str) -> PathBuf {
        self.dir.path().join("data").join(name)
    }
}

/// Starts a daemon whose fetcher talks to `endpoint`.
fn start_daemon(endpoint: &str) -> TestDaemon {
    let dir = tempfile::tempdir().unwrap();
    let player = Arc::new(MockAdhanPlayer::new());
    let context = EngineContext {
        player: player.clone(),
        clock: Arc::new(ManualClock::new(at(4, 0))),
        default_adhan: PathBuf::from(DEFAULT_ADHAN),
        poll_interval: Duration::from_secs(30),
    };
    let store = ScheduleStore::new(
        dir.path().join("data"),
        dir.path().join("settings"),
        DEFAULT_ADHAN,
    );
    store.ensure_directories().unwrap();
    let fetcher = PrayerTimesClient::new(2)
        .unwrap()
        .with_endpoint(endpoint)
        .with_request_delay(Duration::ZERO);
    let state = Arc::new(Mutex::new(DaemonState::new(
        AdhanScheduler::new(context),
        store,
        fetcher,
    )));

    let socket_path = dir.path().join("adhan.sock");
    let server = IpcServer::new(&socket_path).unwrap();
    let handler = RequestHandler::new(Arc::clone(&state));
    let server_task = tokio::spawn(async move {
        while let Ok(stream) = server.accept().await {
            let handler = handler.clone();
            tokio::spawn(async move { handler.serve(stream).await });
        }
    });

    TestDaemon {
        client: IpcClient::with_socket_path(socket_path),
        dir,
        player,
        state,
        _server: server_task,
    }
}

/// A daemon with a saved Cairo schedule and no reachable API.
fn start_daemon_with_cairo() -> TestDaemon {
    let daemon = start_daemon("http://127.0.0.1:1/v1/calendarByCity");
    daemon
        .store()
        .save("Cairo", "Egypt", &cairo_schedule())
        .unwrap();
    daemon
}

fn api_day(date: &str) -> serde_json::Value {
    serde_json::json!({
        "timings": {
            "Fajr": "05:20 (+03)", "Sunrise": "06:45 (+03)", "Dhuhr": "12:20 (+03)",
            "Asr": "15:30 (+03)", "Maghrib": "17:55 (+03)", "Isha": "19:25 (+03)"
        },
        "date": {
            "readable": "01 Jan 2025",
            "gregorian": {"date": date},
            "hijri": {"date": "01-07-1446"}
        }
    })
}

// ============================================================================
// Load and Query Tests
// ============================================================================

#[tokio::test]
async fn test_load_saved_schedule_via_ipc() {
    let daemon = start_daemon_with_cairo();

    let response = daemon.client.load("Cairo", "Egypt").await.unwrap();

    assert_eq!(response.message, "Loaded prayer times for Cairo, Egypt");
    let data = response.data.unwrap();
    assert_eq!(data.fetched, Some(false));
    assert_eq!(data.running, Some(true));
    assert_eq!(data.location, Some(Location::new("Cairo", "Egypt")));
    assert!(daemon.state.lock().await.scheduler().is_running());
}

#[tokio::test]
async fn test_show_before_load_fails() {
    let daemon = start_daemon_with_cairo();

    let err = daemon.client.show(None).await.unwrap_err();

    assert_eq!(err.to_string(), "No schedule is loaded");
}

#[tokio::test]
async fn test_show_today_and_other_day() {
    let daemon = start_daemon_with_cairo();
    daemon.client.load("Cairo", "Egypt").await.unwrap();

    let today = daemon.client.show(None).await.unwrap().data.unwrap();
    assert_eq!(today.date.as_deref(), Some("2025-01-01"));
    let day = today.day.unwrap();
    assert_eq!(day.time_str(Prayer::Fajr), Some("05:30"));
    assert_eq!(day.hijri.as_deref(), Some("01-07-1446"));
    assert_eq!(day.adhan(Prayer::Fajr), Some(Path::new(DEFAULT_ADHAN)));

    let next = daemon
        .client
        .show(Some("2025-01-02".to_string()))
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(next.day.unwrap().time_str(Prayer::Isha), Some("19:06"));
}

#[tokio::test]
async fn test_show_missing_day_returns_placeholder() {
    let daemon = start_daemon_with_cairo();
    daemon.client.load("Cairo", "Egypt").await.unwrap();

    let data = daemon
        .client
        .show(Some("2025-06-01".to_string()))
        .await
        .unwrap()
        .data
        .unwrap();

    let day = data.day.unwrap();
    assert_eq!(day.time_str(Prayer::Dhuhr), Some("N/A"));
    assert_eq!(day.readable_date.as_deref(), Some("Date Not Available"));
}

#[tokio::test]
async fn test_status_and_stop() {
    let daemon = start_daemon_with_cairo();

    let idle = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(idle.running, Some(false));
    assert!(idle.location.is_none());

    daemon.client.load("Cairo", "Egypt").await.unwrap();
    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.running, Some(true));
    assert_eq!(status.played, Some(vec![]));
    assert_eq!(status.day.unwrap().time_str(Prayer::Asr), Some("15:20"));

    let stopped = daemon.client.stop().await.unwrap();
    assert_eq!(stopped.message, "Adhan scheduler stopped");
    assert_eq!(stopped.data.unwrap().running, Some(false));

    let again = daemon.client.stop().await.unwrap();
    assert_eq!(again.message, "Adhan scheduler was not running");
    assert_eq!(daemon.player.play_count(), 0);
}

// ============================================================================
// Edit Tests
// ============================================================================

#[tokio::test]
async fn test_set_time_persists_and_shows() {
    let daemon = start_daemon_with_cairo();
    daemon.client.load("Cairo", "Egypt").await.unwrap();

    let response = daemon
        .client
        .set_time("2025-01-02".to_string(), Prayer::Asr, "15:45".to_string())
        .await
        .unwrap();
    assert_eq!(response.message, "Asr time on 2025-01-02 updated to 15:45");

    let shown = daemon
        .client
        .show(Some("2025-01-02".to_string()))
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(shown.day.unwrap().time_str(Prayer::Asr), Some("15:45"));

    let saved = daemon.store().load("Cairo", "Egypt").unwrap().unwrap();
    assert_eq!(saved.get("2025-01-02").unwrap().time_str(Prayer::Asr), Some("15:45"));
}

#[tokio::test]
async fn test_set_time_rejects_bad_input() {
    let daemon = start_daemon_with_cairo();
    daemon.client.load("Cairo", "Egypt").await.unwrap();

    let bad_time = daemon
        .client
        .set_time("2025-01-01".to_string(), Prayer::Asr, "25:00".to_string())
        .await;
    assert!(bad_time.is_err());

    let missing_day = daemon
        .client
        .set_time("2025-07-01".to_string(), Prayer::Asr, "15:00".to_string())
        .await
        .unwrap_err();
    assert!(missing_day.to_string().contains("2025-07-01"));

    let saved = daemon.store().load("Cairo", "Egypt").unwrap().unwrap();
    assert_eq!(saved.get("2025-01-01").unwrap().time_str(Prayer::Asr), Some("15:20"));
}

#[tokio::test]
async fn test_set_adhan_applies_to_every_day() {
    let daemon = start_daemon_with_cairo();
    daemon.client.load("Cairo", "Egypt").await.unwrap();
    let custom = daemon.dir.path().join("fajr.mp3");
    std::fs::write(&custom, b"audio").unwrap();

    let response = daemon
        .client
        .set_adhan(Prayer::Fajr, custom.clone())
        .await
        .unwrap();
    assert!(response.message.starts_with("Fajr Adhan set to"));

    let saved = daemon.store().load("Cairo", "Egypt").unwrap().unwrap();
    for key in ["2025-01-01", "2025-01-02"] {
        let day = saved.get(key).unwrap();
        assert_eq!(day.adhan(Prayer::Fajr), Some(custom.as_path()));
        assert_eq!(day.adhan(Prayer::Isha), Some(Path::new(DEFAULT_ADHAN)));
    }
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_load_unsaved_location_fetches_and_saves() {
    let mut server = Server::new_async().await;
    let body = serde_json::json!({
        "code": 200,
        "status": "OK",
        "data": [api_day("01-01-2025")]
    });
    let mock = server
        .mock("GET", "/v1/calendarByCity")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("city".into(), "Mecca".into()),
            Matcher::UrlEncoded("country".into(), "Saudi Arabia".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(12)
        .create_async()
        .await;
    let daemon = start_daemon(&format!("{}/v1/calendarByCity", server.url()));

    let response = daemon.client.load("Mecca", "Saudi Arabia").await.unwrap();

    mock.assert_async().await;
    assert_eq!(
        response.message,
        "Fetched and saved prayer times for Mecca, Saudi Arabia"
    );
    assert_eq!(response.data.unwrap().fetched, Some(true));
    assert!(daemon.data_file("mecca_saudi_arabia.json").exists());

    let today = daemon.client.show(None).await.unwrap().data.unwrap();
    assert_eq!(today.day.unwrap().time_str(Prayer::Fajr), Some("05:20"));
}

#[tokio::test]
async fn test_load_reports_network_failure() {
    let daemon = start_daemon("http://127.0.0.1:1/v1/calendarByCity");

    let err = daemon.client.load("Nowhere", "Land").await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to connect. Check internet.");
    assert!(!daemon.state.lock().await.scheduler().is_running());
    assert!(!daemon.data_file("nowhere_land.json").exists());
}

// ============================================================================
// Saved Schedules and Home Tests
// ============================================================================

#[tokio::test]
async fn test_list_and_delete() {
    let daemon = start_daemon_with_cairo();
    daemon
        .store()
        .save("New York", "USA", &cairo_schedule())
        .unwrap();

    let listed = daemon.client.list().await.unwrap().data.unwrap().saved.unwrap();
    let names: Vec<&str> = listed.iter().map(|s| s.filename.as_str()).collect();
    assert_eq!(names, vec!["cairo_egypt.json", "new_york_usa.json"]);
    assert_eq!(listed[1].city, "New York");
    assert_eq!(listed[1].country, "Usa");

    daemon.client.load("Cairo", "Egypt").await.unwrap();
    let deleted = daemon
        .client
        .delete("cairo_egypt.json".to_string())
        .await
        .unwrap();
    assert_eq!(
        deleted.message,
        "Deleted cairo_egypt.json (it was active, scheduler stopped)"
    );
    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.running, Some(false));
    assert!(status.location.is_none());

    let missing = daemon.client.delete("cairo_egypt.json".to_string()).await;
    assert!(missing.is_err());
    let escaped = daemon.client.delete("../settings".to_string()).await;
    assert!(escaped.is_err());
}

#[tokio::test]
async fn test_home_location_round_trip() {
    let daemon = start_daemon_with_cairo();

    let none = daemon.client.get_home().await.unwrap();
    assert_eq!(none.message, "No home location set");
    assert!(none.data.unwrap().home.is_none());

    let set = daemon.client.set_home("Cairo", "Egypt").await.unwrap();
    assert_eq!(set.message, "Home location set to Cairo, Egypt");

    let home = daemon.client.get_home().await.unwrap().data.unwrap().home;
    assert_eq!(home, Some(Location::new("Cairo", "Egypt")));
    assert_eq!(daemon.store().load_home().unwrap(), home);
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_client_without_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let client = IpcClient::with_socket_path(dir.path().join("missing.sock"));

    let err = client.load("Cairo", "Egypt").await.unwrap_err();

    assert!(format!("{:#}", err).contains("Cannot connect to the daemon"));
}

#[tokio::test]
async fn test_concurrent_clients() {
    let daemon = start_daemon_with_cairo();
    daemon.client.load("Cairo", "Egypt").await.unwrap();
    let socket = daemon.client.socket_path().to_path_buf();

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let client = IpcClient::with_socket_path(socket.clone());
        tasks.push(tokio::spawn(async move { client.status().await }));
    }

    for task in tasks {
        let data = task.await.unwrap().unwrap().data.unwrap();
        assert_eq!(data.running, Some(true));
    }
}
