use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::error::ValidationError;
use crate::windows::types::{Bucket, BucketKey, VideoSample};
use crate::zone::TimeZoneSpec;

/// ISO-8601 instants that RFC 3339 doesn't cover: no seconds, basic
/// offsets (`+0000`) or a space separator. `%#z` still requires an offset.
const ISO_8601_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
];

/// Parses a sample's publish timestamp as an absolute instant.
///
/// RFC 3339 is tried first, then the looser ISO-8601 forms above with a
/// trailing `Z` read as `+00:00`.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming `index` if the string has no offset or
/// matches none of the accepted forms.
pub fn parse_published_at(
    index: usize,
    sample: &VideoSample,
) -> Result<DateTime<Utc>, ValidationError> {
    let raw = sample.published_at.trim();

    let rfc3339_err = match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => return Ok(ts.with_timezone(&Utc)),
        Err(e) => e,
    };

    let normalized = match raw.strip_suffix(['Z', 'z']) {
        Some(prefix) => format!("{prefix}+00:00"),
        None => raw.to_string(),
    };

    ISO_8601_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| ValidationError {
            index,
            published_at: sample.published_at.clone(),
            reason: rfc3339_err.to_string(),
        })
}

/// Sparse (weekday, hour) aggregation of a sample set in one zone.
///
/// Only cells with at least one sample are stored.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    cells: HashMap<BucketKey, Bucket>,
}

impl Buckets {
    /// Buckets every sample by its publish weekday and hour in `zone`.
    ///
    /// Stops at the first malformed timestamp.
    pub fn from_samples(
        samples: &[VideoSample],
        zone: &TimeZoneSpec,
    ) -> Result<Self, ValidationError> {
        let mut cells: HashMap<BucketKey, Bucket> = HashMap::new();

        for (index, sample) in samples.iter().enumerate() {
            let ts = parse_published_at(index, sample)?;
            let parts = zone.local_parts(ts);
            cells
                .entry(BucketKey::new(parts.weekday, parts.hour))
                .or_default()
                .add(sample.views());
        }

        debug!(samples = samples.len(), buckets = cells.len(), zone = %zone, "Bucketed samples");

        Ok(Self { cells })
    }

    pub fn get(&self, key: &BucketKey) -> Option<&Bucket> {
        self.cells.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &Bucket)> {
        self.cells.iter()
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total_views(&self) -> u64 {
        self.cells
            .values()
            .fold(0u64, |acc, b| acc.saturating_add(b.sum))
    }

    pub fn total_samples(&self) -> usize {
        self.cells.values().map(|b| b.count).sum()
    }

    /// Mean views per sample across all cells, `None` when there are no samples.
    pub fn global_mean(&self) -> Option<f64> {
        match self.total_samples() {
            0 => None,
            n => Some(self.total_views() as f64 / n as f64),
        }
    }
}
