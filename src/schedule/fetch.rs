//! Yearly prayer-time download from the Aladhan calendar API.
//!
//! One request is made per month. Each day's timings are reduced to
//! `HH:MM` and keyed by `YYYY-MM-DD`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::error::ScheduleError;
use crate::types::{parse_date_key, DayEntry, YearlySchedule};

/// Calendar-by-city endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://api.aladhan.com/v1/calendarByCity";

/// Pause before each monthly request.
const REQUEST_DELAY: Duration = Duration::from_millis(250);

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MONTHS: u32 = 12;

// ============================================================================
// API payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: i64,
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default)]
    data: serde_json::Value,
}

/// One day as returned by the calendar API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDay {
    pub timings: ApiTimings,
    pub date: ApiDate,
}

/// Prayer timings, possibly suffixed with a zone (`"05:12 (EET)"`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTimings {
    #[serde(rename = "Fajr")]
    pub fajr: String,
    #[serde(rename = "Dhuhr")]
    pub dhuhr: String,
    #[serde(rename = "Asr")]
    pub asr: String,
    #[serde(rename = "Maghrib")]
    pub maghrib: String,
    #[serde(rename = "Isha")]
    pub isha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiDate {
    pub readable: String,
    pub gregorian: ApiCalendarDate,
    pub hijri: ApiCalendarDate,
}

/// A calendar date in `DD-MM-YYYY` form.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCalendarDate {
    pub date: String,
}

// ============================================================================
// PrayerTimesClient
// ============================================================================

/// HTTP client for the prayer-time calendar API.
#[derive(Debug, Clone)]
pub struct PrayerTimesClient {
    http: reqwest::Client,
    endpoint: String,
    method: u8,
    request_delay: Duration,
}

impl PrayerTimesClient {
    /// Creates a client using the given calculation method.
    pub fn new(method: u8) -> Result<Self, ScheduleError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ScheduleError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            method,
            request_delay: REQUEST_DELAY,
        })
    }

    /// Points the client at a different calendar endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Downloads every month of `year` for a location.
    ///
    /// `progress` receives the completed percentage after each month.
    ///
    /// # Errors
    ///
    /// Fails on the first month that cannot be fetched; nothing is
    /// returned for the months already downloaded.
    pub async fn fetch_year(
        &self,
        city: &str,
        country: &str,
        year: i32,
        mut progress: impl FnMut(u8),
    ) -> Result<Vec<ApiDay>, ScheduleError> {
        info!(
            "Fetching prayer times for {}, {} ({}), method {}",
            city, country, year, self.method
        );

        let mut days = Vec::new();
        for month in 1..=MONTHS {
            tokio::time::sleep(self.request_delay).await;
            days.extend(self.fetch_month(city, country, year, month).await?);
            progress(percent_done(month));
        }

        info!("Fetched {} days for {}, {}", days.len(), city, country);
        Ok(days)
    }

    async fn fetch_month(
        &self,
        city: &str,
        country: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<ApiDay>, ScheduleError> {
        debug!("Requesting month {} from {}", month, self.endpoint);

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("city", city.to_string()),
                ("country", country.to_string()),
                ("method", self.method.to_string()),
                ("month", month.to_string()),
                ("year", year.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ScheduleError::Network {
                month,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("data").and_then(|d| d.as_str()).map(String::from))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(ScheduleError::Api {
                month,
                message: format!("HTTP {}: {}", status.as_u16(), detail),
            });
        }

        let envelope: ApiEnvelope = response.json().await.map_err(|e| ScheduleError::Api {
            month,
            message: format!("unreadable response: {e}"),
        })?;

        if envelope.code != 200 || !envelope.data.is_array() {
            let status = envelope
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unexpected content".to_string());
            return Err(ScheduleError::Api {
                month,
                message: format!("code {}: {}", envelope.code, status),
            });
        }

        serde_json::from_value(envelope.data).map_err(|e| ScheduleError::Api {
            month,
            message: format!("unexpected day format: {e}"),
        })
    }
}

fn percent_done(month: u32) -> u8 {
    ((f64::from(month) / f64::from(MONTHS)) * 100.0).round() as u8
}

/// Converts API days into a schedule keyed by `YYYY-MM-DD`, with every
/// Adhan set to `default_adhan`.
pub fn transform_days(days: &[ApiDay], default_adhan: &Path) -> YearlySchedule {
    days.iter()
        .filter_map(|day| {
            let Some(key) = gregorian_key(&day.date.gregorian.date) else {
                warn!("Skipping day with malformed date '{}'", day.date.gregorian.date);
                return None;
            };
            let t = &day.timings;
            let mut entry = DayEntry::with_times([
                first_token(&t.fajr),
                first_token(&t.dhuhr),
                first_token(&t.asr),
                first_token(&t.maghrib),
                first_token(&t.isha),
            ]);
            entry.fill_default_adhans(default_adhan);
            entry.hijri = Some(day.date.hijri.date.clone());
            entry.readable_date = Some(day.date.readable.clone());
            Some((key, entry))
        })
        .collect()
}

fn first_token(time: &str) -> &str {
    time.split_whitespace().next().unwrap_or("")
}

/// `DD-MM-YYYY` -> `YYYY-MM-DD`.
fn gregorian_key(date: &str) -> Option<String> {
    let mut parts = date.split('-');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let key = format!("{year}-{month}-{day}");
    parse_date_key(&key).map(|_| key)
}
