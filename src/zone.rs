//! Target time zone resolution.
//!
//! Scoring is only reproducible with an explicit IANA zone. When the caller
//! omits one, [`TimeZoneSpec::Local`] falls back to the host's zone, so the
//! same samples can rank differently on different machines.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::ConfigurationError;

/// The zone publish timestamps are converted into before bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZoneSpec {
    Named(Tz),
    /// Host local zone, resolved by the OS at conversion time.
    Local,
}

/// Calendar fields of a timestamp seen in the target zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalParts {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub hour: u32,
}

impl TimeZoneSpec {
    /// Parses `Some(name)` as an IANA zone, `None` as the host zone.
    pub fn resolve(name: Option<&str>) -> Result<Self, ConfigurationError> {
        match name {
            Some(name) => name.parse(),
            None => Ok(TimeZoneSpec::Local),
        }
    }

    /// Splits `ts` into date, weekday and 24-hour clock hour in this zone.
    pub fn local_parts(&self, ts: DateTime<Utc>) -> LocalParts {
        match self {
            TimeZoneSpec::Named(tz) => parts_of(&ts.with_timezone(tz)),
            TimeZoneSpec::Local => parts_of(&ts.with_timezone(&Local)),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, TimeZoneSpec::Local)
    }
}

fn parts_of<Z: TimeZone>(local: &DateTime<Z>) -> LocalParts {
    LocalParts {
        date: local.date_naive(),
        weekday: local.weekday(),
        hour: local.hour(),
    }
}

impl FromStr for TimeZoneSpec {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        name.parse::<Tz>()
            .map(TimeZoneSpec::Named)
            .map_err(|_| ConfigurationError::UnknownTimeZone(name.to_string()))
    }
}

impl fmt::Display for TimeZoneSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZoneSpec::Named(tz) => f.write_str(tz.name()),
            TimeZoneSpec::Local => f.write_str("local"),
        }
    }
}
