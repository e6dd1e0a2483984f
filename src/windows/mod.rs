//! Posting-window analysis.
//!
//! This module buckets video publish timestamps by weekday and hour in a
//! target zone, ranks the buckets with a shrinkage-adjusted score, and builds
//! the weekday × hour view heatmap and the per-year publish calendar from the
//! same samples.

pub mod bucket;
pub mod calendar;
pub mod heatmap;
pub mod scorer;
pub mod types;

pub use bucket::Buckets;
pub use scorer::{PostingWindowScorer, ScorerConfig, rank_posting_windows};
pub use types::{ScoredWindow, VideoSample};
