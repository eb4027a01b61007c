//! Calendar handling for billing
//!
//! Bill and payment dates are calendar dates (`YYYY-MM-DD`), while audit
//! timestamps are UTC instants. Services read "now" through a [`Clock`]
//! so overdue and month-boundary logic can be pinned in tests.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::sync::RwLock;
use thiserror::Error;

/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid {field}: '{value}' is not a YYYY-MM-DD date")]
    InvalidDate { field: String, value: String },
}

/// Parses a required calendar date
pub fn parse_calendar_date(field: &str, value: &str) -> Result<NaiveDate, TemporalError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| TemporalError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Parses an optional calendar date; a blank string counts as absent
pub fn parse_optional_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, TemporalError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_calendar_date(field, raw).map(Some),
    }
}

/// First calendar day of the month containing `date`
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Source of the current time
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    /// Today's calendar date in UTC
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Pins the clock to midday UTC of the given date
    pub fn on_date(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now);
        Self::new(noon)
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut guard) = self.instant.write() {
            *guard = instant;
        }
    }

    pub fn advance_days(&self, days: i64) {
        if let Ok(mut guard) = self.instant.write() {
            *guard += chrono::Duration::days(days);
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.instant.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
