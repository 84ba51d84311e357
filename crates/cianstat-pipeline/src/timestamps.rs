//! Lenient parsing of the timestamps and day strings Cian returns.
//!
//! Values arrive as RFC 3339 with an offset, as naive date-times, or as bare
//! dates depending on the endpoint. Naive values are taken to be UTC. The
//! calendar day of an offset timestamp is the day in its own offset, which is
//! how the agency cabinet displays it.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::PipelineError;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// Parses an API timestamp, keeping its offset.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at);
    }
    let utc = FixedOffset::east_opt(0)?;
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
        }
    }
    None
}

/// Calendar day of an API timestamp or day string.
#[must_use]
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|at| at.date_naive())
}

/// Like [`parse_timestamp`], failing with context when the value is garbage.
pub(crate) fn require_timestamp(
    raw: &str,
    context: &str,
) -> Result<DateTime<FixedOffset>, PipelineError> {
    parse_timestamp(raw).ok_or_else(|| PipelineError::InvalidTimestamp {
        context: context.to_owned(),
        value: raw.to_owned(),
    })
}

/// Like [`parse_day`], failing with context when the value is garbage.
pub(crate) fn require_day(raw: &str, context: &str) -> Result<NaiveDate, PipelineError> {
    require_timestamp(raw, context).map(|at| at.date_naive())
}

/// Converts an offset timestamp to a UTC instant for window comparisons.
#[must_use]
pub fn to_utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}
