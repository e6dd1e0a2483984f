//! Error types for posting-window scoring.

use thiserror::Error;

/// A sample's `published_at` could not be parsed as an absolute timestamp.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("sample {index}: invalid published_at {published_at:?}: {reason}")]
pub struct ValidationError {
    /// Position of the offending sample in the input sequence.
    pub index: usize,
    pub published_at: String,
    pub reason: String,
}

/// Invalid scorer or zone configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Not a known IANA time zone identifier
    #[error("unknown time zone {0:?}")]
    UnknownTimeZone(String),

    /// Prior weight must be finite and non-negative
    #[error("prior weight must be a finite, non-negative number, got {0}")]
    InvalidPriorWeight(f64),
}

/// Errors returned by the scoring entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
