//! The inclusive date window a statistics run covers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Longest window the statistics endpoints accept, in whole days.
pub const MAX_WINDOW_DAYS: i64 = 180;

/// Date format the Cian API expects for `dateFrom` / `dateTo`.
const API_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("start of the period ({from}) is after its end ({to})")]
    Inverted {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },

    #[error("period spans {days} days; at most {max} days are allowed")]
    TooLong { days: i64, max: i64 },

    #[error(
        "unrecognised date '{0}' (expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or DD.MM.YYYY)"
    )]
    Unparseable(String),
}

/// Validated `[date_from, date_to]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    date_from: NaiveDateTime,
    date_to: NaiveDateTime,
}

impl ReportWindow {
    /// Validates and builds a window.
    ///
    /// # Errors
    ///
    /// - [`WindowError::Inverted`] if `date_from` is after `date_to`.
    /// - [`WindowError::TooLong`] if the span exceeds [`MAX_WINDOW_DAYS`]
    ///   whole days.
    pub fn new(date_from: NaiveDateTime, date_to: NaiveDateTime) -> Result<Self, WindowError> {
        if date_from > date_to {
            return Err(WindowError::Inverted {
                from: date_from,
                to: date_to,
            });
        }
        let days = (date_to - date_from).num_days();
        if days > MAX_WINDOW_DAYS {
            return Err(WindowError::TooLong {
                days,
                max: MAX_WINDOW_DAYS,
            });
        }
        Ok(Self { date_from, date_to })
    }

    #[must_use]
    pub fn date_from(&self) -> NaiveDateTime {
        self.date_from
    }

    #[must_use]
    pub fn date_to(&self) -> NaiveDateTime {
        self.date_to
    }

    #[must_use]
    pub fn api_date_from(&self) -> String {
        self.date_from.format(API_DATE_FORMAT).to_string()
    }

    #[must_use]
    pub fn api_date_to(&self) -> String {
        self.date_to.format(API_DATE_FORMAT).to_string()
    }

    /// Window start as a UTC instant. Naive CLI input is taken to be UTC.
    #[must_use]
    pub fn start_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date_from)
    }
}

impl std::fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.date_from, self.date_to)
    }
}

/// Parses a date or date-time given on the command line.
///
/// Dates without a time component resolve to midnight. Input carrying a UTC
/// offset is rejected: the window is naive and its start is compared as UTC.
///
/// # Errors
///
/// Returns [`WindowError::Unparseable`] when no supported format matches.
pub fn parse_cli_datetime(raw: &str) -> Result<NaiveDateTime, WindowError> {
    let trimmed = raw.trim();

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(at);
        }
    }
    for format in ["%Y-%m-%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN));
        }
    }

    Err(WindowError::Unparseable(raw.to_owned()))
}
