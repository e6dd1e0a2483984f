//! Output formatting and persistence for posting-window results.
//!
//! Supports pretty JSON reports and CSV files for rankings, heatmap cells
//! and calendar days.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::windows::ScoredWindow;
use crate::windows::calendar::PublishCalendar;
use crate::windows::heatmap::ViewHeatmap;

/// Ranking plus the inputs needed to reproduce it.
#[derive(Debug, Serialize)]
pub struct PostingReport {
    pub generated_at: DateTime<Utc>,
    pub time_zone: String,
    pub prior_weight: f64,
    pub sample_count: usize,
    pub global_mean: Option<f64>,
    pub top_windows: Vec<String>,
    pub windows: Vec<ScoredWindow>,
}

#[derive(Serialize)]
struct CalendarRow<'a> {
    date: &'a chrono::NaiveDate,
    count: usize,
    level: u8,
}

/// Renders a report as pretty-printed JSON.
pub fn render_json(report: &PostingReport) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    debug!(windows = report.windows.len(), bytes = json.len(), "Rendered JSON report");
    Ok(json)
}

/// Writes every scored window as a CSV row, best first.
pub fn write_windows<P: AsRef<Path>>(path: P, windows: &[ScoredWindow]) -> Result<()> {
    write_rows(path.as_ref(), windows.iter())
}

/// Writes all 168 heatmap cells as CSV rows.
pub fn write_heatmap<P: AsRef<Path>>(path: P, heatmap: &ViewHeatmap) -> Result<()> {
    write_rows(path.as_ref(), heatmap.cells().iter())
}

/// Writes the in-year days of a calendar as CSV rows.
pub fn write_calendar<P: AsRef<Path>>(path: P, calendar: &PublishCalendar) -> Result<()> {
    let rows = calendar
        .days()
        .iter()
        .filter(|d| d.in_year)
        .map(|d| CalendarRow {
            date: &d.date,
            count: d.count,
            level: d.level(),
        });
    write_rows(path.as_ref(), rows)
}

fn write_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    let mut written = 0usize;
    for row in rows {
        writer.serialize(row)?;
        written += 1;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = written, "Wrote CSV");
    Ok(())
}
