//! Unified error type for the ingestion boundary and run sessions.
//!
//! The geometry, validation and loop extraction functions are total and never
//! return errors; rejected fixes and runs are reported with typed reason enums
//! instead. Errors only arise where malformed input enters the crate or where a
//! session cannot produce a report.

use thiserror::Error;

/// Errors raised by run sessions and input handling.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    /// A fix with non-finite or out-of-range coordinates reached the ingestion boundary.
    #[error("invalid fix #{index}: ({latitude}, {longitude}) is not a valid coordinate")]
    InvalidFix {
        index: usize,
        latitude: f64,
        longitude: f64,
    },

    /// Too few points to produce a result.
    #[error("track has {point_count} points, need at least {minimum_required}")]
    InsufficientPoints {
        point_count: usize,
        minimum_required: usize,
    },

    /// An operation that needs at least one point received none.
    #[error("{context}: track is empty")]
    EmptyTrack { context: String },

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl From<serde_json::Error> for TrackError {
    fn from(err: serde_json::Error) -> Self {
        TrackError::Config {
            message: err.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TrackError>;

/// Convert `Option`s from the total geometry helpers into `TrackError`s.
pub trait OptionExt<T> {
    /// Map `None` to [`TrackError::EmptyTrack`].
    fn ok_or_empty_track(self, context: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty_track(self, context: &str) -> Result<T> {
        self.ok_or_else(|| TrackError::EmptyTrack {
            context: context.to_string(),
        })
    }
}
