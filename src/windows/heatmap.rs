use chrono::Weekday;
use serde::Serialize;

use crate::windows::bucket::Buckets;
use crate::windows::types::{BucketKey, weekday_name};

/// Grid rows, Sunday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Summed views per weekday × hour, built from the same buckets the scorer uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHeatmap {
    views: [[u64; 24]; 7],
    samples: [[usize; 24]; 7],
}

/// One grid cell, flattened for CSV output.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    pub weekday: &'static str,
    pub hour: u32,
    pub label: String,
    pub views: u64,
    pub samples: usize,
    pub intensity: f64,
}

impl ViewHeatmap {
    pub fn from_buckets(buckets: &Buckets) -> Self {
        let mut views = [[0u64; 24]; 7];
        let mut samples = [[0usize; 24]; 7];

        for (key, bucket) in buckets.iter() {
            let row = key.weekday.num_days_from_sunday() as usize;
            let col = key.hour as usize;
            views[row][col] = bucket.sum;
            samples[row][col] = bucket.count;
        }

        Self { views, samples }
    }

    pub fn views(&self, weekday: Weekday, hour: u32) -> u64 {
        self.cell(weekday, hour).map_or(0, |(v, _)| v)
    }

    pub fn samples(&self, weekday: Weekday, hour: u32) -> usize {
        self.cell(weekday, hour).map_or(0, |(_, n)| n)
    }

    /// Largest cell, never below 1 so intensities stay finite.
    pub fn max_views(&self) -> u64 {
        self.views
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// Cell views relative to the busiest cell, in `[0, 1]`.
    pub fn intensity(&self, weekday: Weekday, hour: u32) -> f64 {
        self.views(weekday, hour) as f64 / self.max_views() as f64
    }

    /// All 168 cells, Sunday 00:00 first.
    pub fn cells(&self) -> Vec<HeatmapCell> {
        let max = self.max_views() as f64;
        WEEKDAYS
            .iter()
            .flat_map(|&weekday| (0..24u32).map(move |hour| (weekday, hour)))
            .map(|(weekday, hour)| {
                let views = self.views(weekday, hour);
                HeatmapCell {
                    weekday: weekday_name(weekday),
                    hour,
                    label: BucketKey::new(weekday, hour).label(),
                    views,
                    samples: self.samples(weekday, hour),
                    intensity: views as f64 / max,
                }
            })
            .collect()
    }

    fn cell(&self, weekday: Weekday, hour: u32) -> Option<(u64, usize)> {
        let row = weekday.num_days_from_sunday() as usize;
        let col = hour as usize;
        (col < 24).then(|| (self.views[row][col], self.samples[row][col]))
    }
}
