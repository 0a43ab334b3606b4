//! # Run Session
//!
//! One `RunSession` owns the track and thresholds of a single run. Incoming
//! fixes are gated by [`validate_point`] against the last accepted fix and
//! throttled to the tracking cadence; [`RunSession::finish`] consumes the
//! session and produces a [`RunReport`] with validity, statistics and the
//! claimable loops.
//!
//! Sessions share no state with each other, so concurrent runs need no locking.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result, TrackError};
use crate::geo_utils::haversine_distance;
use crate::loops::{LoopConfig, LoopPolygon, extract_loops, is_closed_loop};
use crate::region::{MAP_FIT_NORMAL, MapRegion, fit_region};
use crate::validation::{
    PointRejection, PointVerdict, RunValidation, ValidationConfig, elevation_gain, validate_point,
    validate_run,
};
use crate::{GpsPoint, LocationFix};

/// Configuration for one run session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub validation: ValidationConfig,
    pub loops: LoopConfig,
    /// Accepted fixes closer than this to the last appended fix are dropped (ms).
    /// Default: 2000
    pub min_fix_interval_ms: i64,
    /// Runs with fewer fixes cannot be saved.
    /// Default: 5
    pub min_fixes_to_save: usize,
    /// Padding factor for the report's map region.
    /// Default: MAP_FIT_NORMAL
    pub region_padding: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            loops: LoopConfig::default(),
            min_fix_interval_ms: 2000,
            min_fixes_to_save: 5,
            region_padding: MAP_FIT_NORMAL,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON configuration; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What happened to an ingested fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FixOutcome {
    /// Appended to the track.
    Accepted,
    /// Failed validation against the last accepted fix.
    Rejected { reason: PointRejection },
    /// Valid but arrived before the tracking interval elapsed.
    Throttled,
}

/// Per-reason counts of fixes that did not reach the track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixCounts {
    pub accepted: usize,
    pub low_accuracy: usize,
    pub speed_exceeded: usize,
    pub throttled: usize,
}

impl FixCounts {
    pub fn rejected(&self) -> usize {
        self.low_accuracy + self.speed_exceeded
    }

    pub fn total(&self) -> usize {
        self.accepted + self.rejected() + self.throttled
    }
}

/// Everything a finished run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub validation: RunValidation,
    /// Path length in meters
    pub distance_m: f64,
    /// Time between first and last accepted fix in seconds
    pub duration_s: f64,
    /// Average pace in minutes per kilometer
    pub avg_pace_min_per_km: Option<f64>,
    /// Total climb in meters
    pub elevation_gain_m: f64,
    pub fixes: FixCounts,
    /// Claimable loops, largest first
    pub loops: Vec<LoopPolygon>,
    /// Valid run with at least one loop
    pub can_claim_territory: bool,
    /// Region framing the whole track
    pub region: Option<MapRegion>,
    /// The accepted track as `[lat, lng]` pairs
    pub route_polyline: Vec<[f64; 2]>,
}

impl RunReport {
    /// Average speed in m/s, if the run has both distance and duration.
    pub fn avg_speed_mps(&self) -> Option<f64> {
        (self.duration_s > 0.0 && self.distance_m > 0.0).then(|| self.distance_m / self.duration_s)
    }

    /// Total claimable area in square meters.
    pub fn claimed_area_sq_m(&self) -> f64 {
        self.loops.iter().map(|l| l.area_sq_m).sum()
    }

    /// Fit the route into a viewport of the given aspect ratio (width / height).
    pub fn fit_route(&self, padding_factor: f64, viewport_aspect_ratio: Option<f64>) -> Result<MapRegion> {
        let points: Vec<GpsPoint> = self
            .route_polyline
            .iter()
            .map(|&[lat, lng]| GpsPoint::new(lat, lng))
            .collect();
        fit_region(&points, padding_factor, viewport_aspect_ratio).ok_or_empty_track("fit route")
    }
}

/// Owned state of one run: configuration plus the append-only track.
#[derive(Debug, Clone)]
pub struct RunSession {
    config: SessionConfig,
    track: Vec<LocationFix>,
    counts: FixCounts,
    received: usize,
    distance_m: f64,
}

impl Default for RunSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl RunSession {
    /// Start a run with the given configuration.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            track: Vec::new(),
            counts: FixCounts::default(),
            received: 0,
            distance_m: 0.0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Feed one fix from the location source.
    ///
    /// Fixes with non-finite or out-of-range coordinates are malformed input
    /// and return [`TrackError::InvalidFix`]; every other fix yields a
    /// [`FixOutcome`].
    pub fn ingest(&mut self, fix: LocationFix) -> Result<FixOutcome> {
        let index = self.received;
        self.received += 1;

        if !fix.point().is_valid() {
            return Err(TrackError::InvalidFix {
                index,
                latitude: fix.latitude,
                longitude: fix.longitude,
            });
        }

        let last = self.track.last();
        if let PointVerdict::Invalid { reason } =
            validate_point(&fix, last, &self.config.validation)
        {
            match reason {
                PointRejection::LowAccuracy { .. } => self.counts.low_accuracy += 1,
                PointRejection::SpeedExceeded { .. } => self.counts.speed_exceeded += 1,
            }
            debug!("[Session] Fix #{} rejected: {}", index, reason);
            return Ok(FixOutcome::Rejected { reason });
        }

        if let Some(last) = last {
            if fix.timestamp.saturating_sub(last.timestamp) < self.config.min_fix_interval_ms {
                self.counts.throttled += 1;
                return Ok(FixOutcome::Throttled);
            }
            self.distance_m += haversine_distance(&last.point(), &fix.point());
        }

        self.track.push(fix);
        self.counts.accepted += 1;
        Ok(FixOutcome::Accepted)
    }

    /// Feed a batch of fixes, stopping at the first malformed one.
    pub fn ingest_all<I>(&mut self, fixes: I) -> Result<FixCounts>
    where
        I: IntoIterator<Item = LocationFix>,
    {
        for fix in fixes {
            self.ingest(fix)?;
        }
        Ok(self.counts)
    }

    /// Accepted fixes so far.
    pub fn track(&self) -> &[LocationFix] {
        &self.track
    }

    pub fn len(&self) -> usize {
        self.track.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    pub fn counts(&self) -> FixCounts {
        self.counts
    }

    /// Live path length of the accepted track in meters.
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Coordinates of the accepted track.
    pub fn points(&self) -> Vec<GpsPoint> {
        self.track.iter().map(LocationFix::point).collect()
    }

    /// Whether the track so far already contains a claimable loop.
    ///
    /// Runs the full extraction; call it sparingly on long tracks.
    pub fn has_closed_loop(&self) -> bool {
        is_closed_loop(&self.points(), &self.config.loops)
    }

    /// End the run and build its report. The track is dropped afterwards.
    pub fn finish(self) -> Result<RunReport> {
        if self.track.len() < self.config.min_fixes_to_save {
            return Err(TrackError::InsufficientPoints {
                point_count: self.track.len(),
                minimum_required: self.config.min_fixes_to_save,
            });
        }

        let points = self.points();
        let validation = validate_run(&self.track, &self.config.validation);
        let loops = extract_loops(&points, &self.config.loops);
        let can_claim_territory = validation.is_valid() && !loops.is_empty();

        let duration_s = match (self.track.first(), self.track.last()) {
            (Some(first), Some(last)) => (last.timestamp.saturating_sub(first.timestamp) as f64 / 1000.0).max(0.0),
            _ => 0.0,
        };
        let avg_pace_min_per_km = (duration_s > 0.0 && self.distance_m > 0.0)
            .then(|| duration_s / 60.0 / (self.distance_m / 1000.0));

        info!(
            "[Session] Finished run: {} fixes, {:.0} m, {} loops, valid={}",
            self.track.len(),
            self.distance_m,
            loops.len(),
            validation.is_valid()
        );

        Ok(RunReport {
            distance_m: self.distance_m,
            duration_s,
            avg_pace_min_per_km,
            elevation_gain_m: elevation_gain(&self.track),
            fixes: self.counts,
            region: fit_region(&points, self.config.region_padding, None),
            route_polyline: points.iter().map(|p| [p.latitude, p.longitude]).collect(),
            validation,
            loops,
            can_claim_territory,
        })
    }
}
