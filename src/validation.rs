//! GPS fix and run validation.
//!
//! Fixes are rejected for poor horizontal accuracy or for an implied speed that
//! a runner cannot reach. A run is rejected when it is too short or when too
//! many consecutive fix pairs fail the point checks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::LocationFix;
use crate::geo_utils::haversine_distance;

/// Thresholds for fix and run validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fixes with a horizontal accuracy radius above this are rejected (meters).
    /// Default: 50.0
    pub max_accuracy_m: f64,
    /// Maximum implied speed between consecutive fixes (km/h).
    /// Default: 25.0
    pub max_speed_kmh: f64,
    /// Minimum total path length for a valid run (meters).
    /// Default: 100.0
    pub min_run_distance_m: f64,
    /// Maximum fraction of consecutive fix pairs that may fail the point checks.
    /// Default: 0.3
    pub max_invalid_fraction: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 50.0,
            max_speed_kmh: 25.0,
            min_run_distance_m: 100.0,
            max_invalid_fraction: 0.3,
        }
    }
}

/// Why a single fix was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum PointRejection {
    LowAccuracy { accuracy_m: f64 },
    SpeedExceeded { speed_kmh: f64 },
}

impl PointRejection {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            PointRejection::LowAccuracy { .. } => "low_accuracy",
            PointRejection::SpeedExceeded { .. } => "speed_exceeded",
        }
    }
}

impl fmt::Display for PointRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointRejection::LowAccuracy { accuracy_m } => {
                write!(f, "low GPS accuracy: {:.0} m", accuracy_m)
            }
            PointRejection::SpeedExceeded { speed_kmh } => {
                write!(f, "speed too high: {:.1} km/h", speed_kmh)
            }
        }
    }
}

/// Outcome of validating one fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointVerdict {
    Valid,
    Invalid { reason: PointRejection },
}

impl PointVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, PointVerdict::Valid)
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<PointRejection> {
        match self {
            PointVerdict::Valid => None,
            PointVerdict::Invalid { reason } => Some(*reason),
        }
    }
}

/// Why a whole run was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RunRejection {
    DistanceTooShort { distance_m: f64 },
    TooManyInvalidPoints { invalid: usize, total: usize },
}

impl RunRejection {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            RunRejection::DistanceTooShort { .. } => "distance_too_short",
            RunRejection::TooManyInvalidPoints { .. } => "too_many_invalid_points",
        }
    }
}

impl fmt::Display for RunRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunRejection::DistanceTooShort { distance_m } => {
                write!(f, "distance too short: {:.2} km", distance_m / 1000.0)
            }
            RunRejection::TooManyInvalidPoints { invalid, total } => {
                write!(f, "too many invalid GPS points: {} of {} fix pairs", invalid, total)
            }
        }
    }
}

/// Result of validating a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunValidation {
    /// Every reason the run failed; empty for a valid run
    pub reasons: Vec<RunRejection>,
}

impl RunValidation {
    pub fn is_valid(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// Validate a fix against the previously accepted fix.
///
/// The speed check only runs when the elapsed time is strictly positive, so
/// duplicate or out-of-order timestamps never cause a rejection on their own.
pub fn validate_point(
    fix: &LocationFix,
    previous: Option<&LocationFix>,
    config: &ValidationConfig,
) -> PointVerdict {
    if fix.horizontal_accuracy > config.max_accuracy_m {
        return PointVerdict::Invalid {
            reason: PointRejection::LowAccuracy {
                accuracy_m: fix.horizontal_accuracy,
            },
        };
    }

    if let Some(prev) = previous {
        let elapsed_s = fix.timestamp.saturating_sub(prev.timestamp) as f64 / 1000.0;
        if elapsed_s > 0.0 {
            let distance = haversine_distance(&prev.point(), &fix.point());
            let speed_kmh = distance / elapsed_s * 3.6;
            if speed_kmh > config.max_speed_kmh {
                return PointVerdict::Invalid {
                    reason: PointRejection::SpeedExceeded { speed_kmh },
                };
            }
        }
    }

    PointVerdict::Valid
}

/// Validate a complete run. Never fails; every violated rule adds a reason.
pub fn validate_run(fixes: &[LocationFix], config: &ValidationConfig) -> RunValidation {
    let mut reasons = Vec::new();

    let distance_m = track_distance(fixes);
    if distance_m < config.min_run_distance_m {
        reasons.push(RunRejection::DistanceTooShort { distance_m });
    }

    let pairs = fixes.len().saturating_sub(1);
    let invalid = fixes
        .windows(2)
        .filter(|w| !validate_point(&w[1], Some(&w[0]), config).is_valid())
        .count();
    if invalid as f64 > pairs as f64 * config.max_invalid_fraction {
        reasons.push(RunRejection::TooManyInvalidPoints {
            invalid,
            total: pairs,
        });
    }

    RunValidation { reasons }
}

/// Total path length of a sequence of fixes in meters.
pub fn track_distance(fixes: &[LocationFix]) -> f64 {
    fixes
        .windows(2)
        .map(|w| haversine_distance(&w[0].point(), &w[1].point()))
        .sum()
}

/// Total climb in meters.
///
/// Sums positive deltas between successive fixes that carry a finite altitude.
/// Fixes without altitude neither contribute nor reset the baseline.
pub fn elevation_gain(fixes: &[LocationFix]) -> f64 {
    let mut gain = 0.0;
    let mut last_altitude: Option<f64> = None;

    for altitude in fixes.iter().filter_map(|f| f.altitude.filter(|a| a.is_finite())) {
        if let Some(last) = last_altitude {
            if altitude > last {
                gain += altitude - last;
            }
        }
        last_altitude = Some(altitude);
    }

    gain
}
