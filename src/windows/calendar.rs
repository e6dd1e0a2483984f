//! Per-year publish calendar: one cell per day, padded to whole Sunday-first weeks.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::error::ValidationError;
use crate::windows::bucket::parse_published_at;
use crate::windows::types::VideoSample;
use crate::zone::TimeZoneSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub count: usize,
    /// False for padding days from the neighbouring years.
    pub in_year: bool,
}

impl CalendarDay {
    /// Shade bucket: 0, 1, 2, 3, or 4 for four or more uploads.
    pub fn level(&self) -> u8 {
        self.count.min(4) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCalendar {
    pub year: i32,
    days: Vec<CalendarDay>,
}

/// Distinct publish years in `zone`, newest first.
pub fn available_years(
    samples: &[VideoSample],
    zone: &TimeZoneSpec,
) -> Result<Vec<i32>, ValidationError> {
    let mut years = BTreeSet::new();
    for (index, sample) in samples.iter().enumerate() {
        let ts = parse_published_at(index, sample)?;
        years.insert(zone.local_parts(ts).date.year());
    }
    Ok(years.into_iter().rev().collect())
}

impl PublishCalendar {
    /// Counts uploads per local date for `year`.
    ///
    /// Returns an empty calendar if `year` is outside chrono's date range.
    pub fn for_year(
        samples: &[VideoSample],
        zone: &TimeZoneSpec,
        year: i32,
    ) -> Result<Self, ValidationError> {
        let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
        for (index, sample) in samples.iter().enumerate() {
            let ts = parse_published_at(index, sample)?;
            let date = zone.local_parts(ts).date;
            if date.year() == year {
                *counts.entry(date).or_default() += 1;
            }
        }

        let days = match year_range(year) {
            Some((start, end)) => start
                .iter_days()
                .take_while(|d| *d <= end)
                .map(|date| CalendarDay {
                    date,
                    count: counts.get(&date).copied().unwrap_or(0),
                    in_year: date.year() == year,
                })
                .collect(),
            None => Vec::new(),
        };

        debug!(year, days = days.len(), active_days = counts.len(), "Built publish calendar");

        Ok(Self { year, days })
    }

    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay]> {
        self.days.chunks(7)
    }

    /// Uploads within the year itself.
    pub fn total(&self) -> usize {
        self.days.iter().filter(|d| d.in_year).map(|d| d.count).sum()
    }
}

/// Sunday on/before Jan 1 through Saturday on/after Dec 31.
fn year_range(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
    let lead = first.weekday().num_days_from_sunday() as u64;
    let trail = 6 - last.weekday().num_days_from_sunday() as u64;
    let start = first.checked_sub_days(Days::new(lead))?;
    let end = last.checked_add_days(Days::new(trail))?;
    Some((start, end))
}
