//! Data types shared by the bucketing, scoring and heatmap code.

use chrono::Weekday;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One published video's timing and performance, as supplied by a sample source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoSample {
    /// ISO-8601 publish timestamp with an offset or `Z`.
    #[serde(alias = "publishedAt")]
    pub published_at: String,

    /// Absent counts score as zero.
    #[serde(
        default,
        rename = "views",
        alias = "view_count",
        alias = "viewCount",
        deserialize_with = "deserialize_view_count"
    )]
    pub view_count: Option<u64>,
}

impl VideoSample {
    pub fn new(published_at: impl Into<String>, view_count: Option<u64>) -> Self {
        Self {
            published_at: published_at.into(),
            view_count,
        }
    }

    pub fn views(&self) -> u64 {
        self.view_count.unwrap_or(0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(u64),
    Text(String),
}

/// Accepts JSON numbers, numeric strings (the YouTube Data API sends counts as
/// strings), nulls and empty CSV fields.
fn deserialize_view_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawCount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCount::Number(n)) => Ok(Some(n)),
        Some(RawCount::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse()
                    .map(Some)
                    .map_err(|_| de::Error::custom(format!("invalid view count {s:?}")))
            }
        }
    }
}

/// A (weekday, hour) cell in the target zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub weekday: Weekday,
    /// 0..=23
    pub hour: u32,
}

impl BucketKey {
    /// `hour` must be 0..=23; bucketing takes it from `Timelike::hour`.
    pub fn new(weekday: Weekday, hour: u32) -> Self {
        debug_assert!(hour < 24, "hour out of range: {hour}");
        Self { weekday, hour }
    }

    /// `"Tue 14:00"`
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00", weekday_name(self.weekday), self.hour)
    }
}

/// Calendar order: Sunday first, then hour.
impl Ord for BucketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.weekday.num_days_from_sunday(), self.hour)
            .cmp(&(other.weekday.num_days_from_sunday(), other.hour))
    }
}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Short English weekday name used in labels.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// Accumulated views and sample count for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    pub sum: u64,
    pub count: usize,
}

impl Bucket {
    pub fn add(&mut self, views: u64) {
        self.sum = self.sum.saturating_add(views);
        self.count += 1;
    }

    /// Raw mean views per sample.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// A bucket with its shrinkage-adjusted score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredWindow {
    pub label: String,
    pub score: f64,
    pub mean_views: f64,
    pub samples: usize,
}
