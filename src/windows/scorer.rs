//! Shrinkage-adjusted ranking of posting windows.
//!
//! Each (weekday, hour) bucket is scored as
//!
//! ```text
//! score = (sum + prior_weight * global_mean) / (count + prior_weight)
//! ```
//!
//! so buckets backed by only a few videos are pulled toward the channel-wide
//! mean and a single viral upload cannot dominate the ranking.

use std::cmp::Ordering;
use tracing::{debug, info};

use crate::error::{ConfigurationError, Result};
use crate::windows::bucket::Buckets;
use crate::windows::types::{ScoredWindow, VideoSample};
use crate::zone::TimeZoneSpec;

/// Pseudo-count pulling sparse buckets toward the global mean.
pub const DEFAULT_PRIOR_WEIGHT: f64 = 10.0;

/// Number of windows returned when the caller doesn't ask for a count.
pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerConfig {
    pub prior_weight: f64,
    pub top_n: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            prior_weight: DEFAULT_PRIOR_WEIGHT,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ScorerConfig {
    pub fn with_prior_weight(mut self, prior_weight: f64) -> Self {
        self.prior_weight = prior_weight;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if !self.prior_weight.is_finite() || self.prior_weight < 0.0 {
            return Err(ConfigurationError::InvalidPriorWeight(self.prior_weight));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostingWindowScorer {
    config: ScorerConfig,
}

impl PostingWindowScorer {
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidPriorWeight`] for a negative or
    /// non-finite prior weight.
    pub fn new(config: ScorerConfig) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Scores every non-empty bucket, best first.
    ///
    /// Equal scores are ordered by label so the output never depends on
    /// hash map iteration order.
    pub fn score_windows(&self, buckets: &Buckets) -> Vec<ScoredWindow> {
        let Some(global_mean) = buckets.global_mean() else {
            return Vec::new();
        };
        let prior = self.config.prior_weight;

        let mut scored: Vec<ScoredWindow> = buckets
            .iter()
            .map(|(key, bucket)| ScoredWindow {
                label: key.label(),
                score: (bucket.sum as f64 + prior * global_mean) / (bucket.count as f64 + prior),
                mean_views: bucket.mean(),
                samples: bucket.count,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });

        debug!(global_mean, prior_weight = prior, windows = scored.len(), "Scored buckets");
        scored
    }

    /// Labels of the first `top_n` windows from [`score_windows`](Self::score_windows).
    pub fn top_labels(&self, windows: &[ScoredWindow]) -> Vec<String> {
        windows
            .iter()
            .take(self.config.top_n)
            .map(|w| w.label.clone())
            .collect()
    }

    /// Returns up to `top_n` window labels, most recommended first.
    ///
    /// Every sample is validated even when `top_n` is zero.
    #[tracing::instrument(skip(self, samples, zone), fields(samples = samples.len(), zone = %zone))]
    pub fn rank(&self, samples: &[VideoSample], zone: &TimeZoneSpec) -> Result<Vec<String>> {
        let buckets = Buckets::from_samples(samples, zone)?;
        let labels = self.top_labels(&self.score_windows(&buckets));

        info!(windows = ?labels, "Ranked posting windows");
        Ok(labels)
    }
}

/// Ranks posting windows with the default prior weight.
///
/// `time_zone` is an IANA identifier; `None` uses the host's local zone, which
/// makes the result depend on where it runs. Pass a zone for reproducible output.
///
/// # Errors
///
/// - [`ScoreError::Configuration`](crate::error::ScoreError::Configuration) for an unknown zone.
/// - [`ScoreError::Validation`](crate::error::ScoreError::Validation) for the first
///   sample whose timestamp can't be parsed.
pub fn rank_posting_windows(
    samples: &[VideoSample],
    time_zone: Option<&str>,
    top_n: usize,
) -> Result<Vec<String>> {
    let zone = TimeZoneSpec::resolve(time_zone)?;
    let scorer = PostingWindowScorer::new(ScorerConfig::default().with_top_n(top_n))?;
    scorer.rank(samples, &zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoreError;

    fn sample(ts: &str, views: u64) -> VideoSample {
        VideoSample::new(ts, Some(views))
    }

    fn scores_by_label(windows: &[ScoredWindow]) -> std::collections::HashMap<&str, f64> {
        windows.iter().map(|w| (w.label.as_str(), w.score)).collect()
    }

    #[test]
    fn test_empty_input_returns_empty() {
        assert!(rank_posting_windows(&[], Some("UTC"), 3).unwrap().is_empty());
    }

    #[test]
    fn test_single_sample() {
        let samples = vec![sample("2024-03-05T14:30:00Z", 10)];
        assert_eq!(
            rank_posting_windows(&samples, Some("UTC"), 3).unwrap(),
            vec!["Tue 14:00"]
        );
    }

    #[test]
    fn test_all_samples_in_one_bucket() {
        let samples = vec![
            sample("2024-03-05T14:30:00Z", 10),
            sample("2024-03-12T14:05:00Z", 500),
            sample("2024-03-19T14:55:00Z", 0),
        ];
        assert_eq!(
            rank_posting_windows(&samples, Some("UTC"), 3).unwrap(),
            vec!["Tue 14:00"]
        );
    }

    #[test]
    fn test_zero_top_n_is_empty() {
        let samples = vec![sample("2024-03-05T14:30:00Z", 10)];
        assert!(rank_posting_windows(&samples, Some("UTC"), 0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_top_n_still_validates_samples() {
        let samples = vec![sample("2024-03-05T14:30:00Z", 10), sample("not a date", 1)];
        match rank_posting_windows(&samples, Some("UTC"), 0) {
            Err(ScoreError::Validation(e)) => assert_eq!(e.index, 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_top_labels_truncates_scored_windows() {
        let samples = vec![
            sample("2024-03-04T08:00:00Z", 100),
            sample("2024-03-04T09:00:00Z", 300),
            sample("2024-03-04T10:00:00Z", 200),
        ];
        let zone: TimeZoneSpec = "UTC".parse().unwrap();
        let buckets = Buckets::from_samples(&samples, &zone).unwrap();
        let scorer = PostingWindowScorer::new(ScorerConfig::default().with_top_n(2)).unwrap();

        let windows = scorer.score_windows(&buckets);
        assert_eq!(windows.len(), 3);
        assert_eq!(scorer.top_labels(&windows), vec!["Mon 09:00", "Mon 10:00"]);
        assert_eq!(scorer.top_labels(&windows), scorer.rank(&samples, &zone).unwrap());
    }

    #[test]
    fn test_top_n_truncation_keeps_highest_scores() {
        // One sample per bucket, mean 300: score = (v + 3000) / 11 grows with v.
        let samples = vec![
            sample("2024-03-04T08:00:00Z", 100),
            sample("2024-03-04T09:00:00Z", 400),
            sample("2024-03-04T10:00:00Z", 200),
            sample("2024-03-04T11:00:00Z", 500),
            sample("2024-03-04T12:00:00Z", 300),
        ];
        let ranked = rank_posting_windows(&samples, Some("UTC"), 3).unwrap();
        assert_eq!(ranked, vec!["Mon 11:00", "Mon 09:00", "Mon 12:00"]);
    }

    #[test]
    fn test_equal_scores_break_ties_by_label() {
        let samples = vec![
            sample("2024-03-04T09:00:00Z", 50),
            sample("2024-03-08T09:00:00Z", 50),
            sample("2024-03-05T09:00:00Z", 10),
        ];
        let ranked = rank_posting_windows(&samples, Some("UTC"), 3).unwrap();
        assert_eq!(ranked, vec!["Fri 09:00", "Mon 09:00", "Tue 09:00"]);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let samples: Vec<_> = (0..48)
            .map(|i| {
                let ts = format!("2024-03-{:02}T{:02}:15:00Z", 1 + i % 7, i % 24);
                sample(&ts, (i * 37 % 11) as u64)
            })
            .collect();
        let first = rank_posting_windows(&samples, Some("Europe/Berlin"), 5).unwrap();
        for _ in 0..10 {
            assert_eq!(rank_posting_windows(&samples, Some("Europe/Berlin"), 5).unwrap(), first);
        }
    }

    #[test]
    fn test_shrinkage_pulls_sparse_buckets_harder() {
        // A: one viral upload, B: many weak uploads, C: many strong uploads
        // setting the global mean near 5000.
        let mut samples = vec![sample("2024-03-05T14:30:00Z", 100_000)];
        samples.extend((0..1000).map(|_| sample("2024-03-04T09:10:00Z", 100)));
        samples.extend((0..1000).map(|_| sample("2024-03-06T18:20:00Z", 9_800)));

        let zone: TimeZoneSpec = "UTC".parse().unwrap();
        let buckets = Buckets::from_samples(&samples, &zone).unwrap();
        let global_mean = buckets.global_mean().unwrap();
        assert!((global_mean - 4997.5).abs() < 0.1);

        let scorer = PostingWindowScorer::default();
        let windows = scorer.score_windows(&buckets);
        let scores = scores_by_label(&windows);
        let score_a = scores["Tue 14:00"];
        let score_b = scores["Mon 09:00"];

        assert!(score_a > global_mean && score_a < 100_000.0);

        let pull_a = (100_000.0 - score_a) / (100_000.0 - global_mean);
        let pull_b = (score_b - 100.0) / (global_mean - 100.0);
        assert!(pull_b < 0.02);
        assert!(pull_a > pull_b);
    }

    #[test]
    fn test_zero_prior_weight_uses_raw_means() {
        let samples = vec![
            sample("2024-03-04T09:00:00Z", 100),
            sample("2024-03-04T09:30:00Z", 300),
            sample("2024-03-05T10:00:00Z", 150),
        ];
        let zone: TimeZoneSpec = "UTC".parse().unwrap();
        let buckets = Buckets::from_samples(&samples, &zone).unwrap();
        let scorer =
            PostingWindowScorer::new(ScorerConfig::default().with_prior_weight(0.0)).unwrap();

        let windows = scorer.score_windows(&buckets);
        assert_eq!(windows[0].label, "Mon 09:00");
        assert_eq!(windows[0].score, 200.0);
        assert_eq!(windows[1].score, 150.0);
    }

    #[test]
    fn test_timezone_changes_labels() {
        let samples = vec![sample("2024-01-01T06:00:00Z", 1)];
        assert_eq!(
            rank_posting_windows(&samples, Some("UTC"), 3).unwrap(),
            vec!["Mon 06:00"]
        );
        assert_eq!(
            rank_posting_windows(&samples, Some("America/Los_Angeles"), 3).unwrap(),
            vec!["Sun 22:00"]
        );
    }

    #[test]
    fn test_malformed_timestamp_is_validation_error() {
        let samples = vec![sample("2024-03-05T14:30:00Z", 1), sample("03/05/2024", 2)];
        match rank_posting_windows(&samples, Some("UTC"), 3) {
            Err(ScoreError::Validation(e)) => assert_eq!(e.index, 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_zone_is_configuration_error() {
        let err = rank_posting_windows(&[], Some("Nowhere/Special"), 3).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::Configuration(ConfigurationError::UnknownTimeZone(_))
        ));
    }

    #[test]
    fn test_invalid_prior_weight_rejected() {
        for w in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(PostingWindowScorer::new(ScorerConfig::default().with_prior_weight(w)).is_err());
        }
    }
}
