//! Prayer schedule data management.
//!
//! - `resolver`: projects a yearly schedule onto one calendar day
//! - `store`: saved schedule files and the home location
//! - `fetch`: downloads a year of prayer times from the timing API
//! - `edit`: time and Adhan overrides on a loaded schedule

mod edit;
mod error;
mod fetch;
mod resolver;
mod store;

pub use edit::{set_prayer_adhan, set_prayer_time, show_day};
pub use error::ScheduleError;
pub use fetch::{
    transform_days, ApiCalendarDate, ApiDate, ApiDay, ApiTimings, PrayerTimesClient,
    DEFAULT_ENDPOINT,
};
pub use resolver::{resolve_date_key, resolve_today};
pub use store::{schedule_file_name, ScheduleStore};
