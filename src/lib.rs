//! # Tracezone
//!
//! GPS run validation and closed-loop territory extraction for fitness applications.
//!
//! This library provides:
//! - Per-fix and whole-run GPS validation (accuracy and speed gates)
//! - Closed-loop extraction: finds self-returning sub-loops that enclose real area
//! - Nested loop de-duplication and a bounded, largest-first list of claim polygons
//! - Map region fitting for displaying a route
//! - A per-run session object that owns the track and produces a run report
//!
//! ## Features
//!
//! - **`parallel`** - Scan loop anchors in parallel with rayon
//! - **`synthetic`** - Deterministic synthetic track generators for tests and benchmarks
//! - **`cli`** - The `tracezone-cli` GPX inspection tool
//!
//! ## Quick Start
//!
//! ```rust
//! use tracezone::{GpsPoint, LoopConfig, extract_loops};
//!
//! // A 200m square walked in 10m steps around a park
//! let origin = GpsPoint::new(51.5074, -0.1278);
//! let step_lat = 10.0 / 110_540.0;
//! let step_lng = 10.0 / (111_320.0 * origin.latitude.to_radians().cos());
//! let mut points = Vec::new();
//! for i in 0..20 { points.push(GpsPoint::new(origin.latitude, origin.longitude + i as f64 * step_lng)); }
//! for i in 0..20 { points.push(GpsPoint::new(origin.latitude + i as f64 * step_lat, origin.longitude + 20.0 * step_lng)); }
//! for i in 0..20 { points.push(GpsPoint::new(origin.latitude + 20.0 * step_lat, origin.longitude + (20 - i) as f64 * step_lng)); }
//! for i in 0..=20 { points.push(GpsPoint::new(origin.latitude + (20 - i) as f64 * step_lat, origin.longitude)); }
//!
//! let loops = extract_loops(&points, &LoopConfig::default());
//! assert_eq!(loops.len(), 1);
//! assert!(loops[0].area_sq_m > 38_000.0);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, TrackError};

// Geographic utilities (distance, area, centroid, containment)
pub mod geo_utils;

// Per-fix and per-run validation
pub mod validation;
pub use validation::{
    PointRejection, PointVerdict, RunRejection, RunValidation, ValidationConfig, elevation_gain,
    validate_point, validate_run,
};

// Closed-loop extraction (territory polygons)
pub mod loops;
pub use loops::{CandidateSearch, LoopConfig, LoopPolygon, extract_loops, is_closed_loop};

// Map viewport fitting
pub mod region;
pub use region::{MAP_FIT_NORMAL, MAP_FIT_TIGHT, MapRegion, fit_region};

// Run session: owned track + configuration for one run
pub mod session;
pub use session::{FixCounts, FixOutcome, RunReport, RunSession, SessionConfig};

// Human readable formatting for reports
pub mod format;

// Synthetic track generation
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// This is the vertex type of every polygon produced by the crate.
///
/// # Example
/// ```
/// use tracezone::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

impl From<&LocationFix> for GpsPoint {
    fn from(fix: &LocationFix) -> Self {
        fix.point()
    }
}

/// One raw location sample from the device.
///
/// Fixes arrive roughly every two seconds and are never mutated once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds, monotonically non-decreasing within a run
    pub timestamp: i64,
    /// Horizontal accuracy radius in meters
    pub horizontal_accuracy: f64,
    /// Instantaneous speed in m/s as reported by the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl LocationFix {
    /// Create a fix without speed or altitude.
    pub fn new(latitude: f64, longitude: f64, timestamp: i64, horizontal_accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            horizontal_accuracy,
            speed: None,
            altitude: None,
        }
    }

    /// Builder-style altitude setter.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Builder-style speed setter.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// The coordinate of this fix.
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}
