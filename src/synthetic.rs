//! Synthetic GPS runs for tests and benchmarking.
//!
//! Generates runs with known geometry (squares, out-and-back paths,
//! figure-eights, chains of separate loops) so loop extraction has a ground
//! truth. Coordinates use the same meters-per-degree factors as the area
//! projection, so a 200 m square comes out at very nearly 40 000 m².
//!
//! Feature-gated behind `synthetic`; not part of production builds.
//!
//! # Example
//!
//! ```rust
//! use tracezone::synthetic::{SyntheticRun, TrackShape};
//! use tracezone::GpsPoint;
//!
//! let run = SyntheticRun {
//!     origin: GpsPoint::new(51.5, -0.12),
//!     shape: TrackShape::Square { side_m: 200.0 },
//!     spacing_m: 10.0,
//!     interval_ms: 2000,
//!     accuracy_m: 5.0,
//!     gps_noise_sigma_meters: 0.0,
//!     seed: 42,
//! };
//!
//! let fixes = run.generate();
//! assert_eq!(fixes.len(), 81);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::geo_utils::{METERS_PER_DEG_LAT, METERS_PER_DEG_LNG};
use crate::{GpsPoint, LocationFix};

// ============================================================================
// Types
// ============================================================================

/// Shape of a generated run.
#[derive(Debug, Clone, Copy)]
pub enum TrackShape {
    /// Counter-clockwise square starting and ending at the origin.
    Square { side_m: f64 },
    /// East along a straight line and back along the same line.
    OutAndBack { length_m: f64 },
    /// A large square lobe north-east of the origin, then a small clockwise
    /// lobe south-west of it.
    FigureEight { large_side_m: f64, small_side_m: f64 },
    /// `count` separate squares along an eastward line, joined by straight connectors.
    SquareChain { count: usize, side_m: f64, gap_m: f64 },
    /// Circular laps around a center north of the origin.
    Circle { radius_m: f64, laps: usize },
}

/// Scenario configuration for generating a synthetic run.
#[derive(Debug, Clone)]
pub struct SyntheticRun {
    /// Start point of the run.
    pub origin: GpsPoint,
    /// Geometry of the run.
    pub shape: TrackShape,
    /// Distance between consecutive fixes in meters.
    pub spacing_m: f64,
    /// Time between consecutive fixes in milliseconds.
    pub interval_ms: i64,
    /// Reported horizontal accuracy of every fix.
    pub accuracy_m: f64,
    /// GPS noise standard deviation in meters.
    pub gps_noise_sigma_meters: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for SyntheticRun {
    fn default() -> Self {
        Self {
            origin: GpsPoint::new(51.5, -0.12),
            shape: TrackShape::Square { side_m: 200.0 },
            spacing_m: 10.0,
            interval_ms: 2000,
            accuracy_m: 5.0,
            gps_noise_sigma_meters: 0.0,
            seed: 42,
        }
    }
}

// ============================================================================
// Coordinate Helpers
// ============================================================================

/// Move `from` by local east/north offsets in meters.
fn offset(from: &GpsPoint, east_m: f64, north_m: f64) -> GpsPoint {
    let cos_lat = from.latitude.to_radians().cos();
    GpsPoint::new(
        from.latitude + north_m / METERS_PER_DEG_LAT,
        from.longitude + east_m / (METERS_PER_DEG_LNG * cos_lat),
    )
}

/// Append points along a polyline of local (east, north) corners, `spacing_m` apart.
///
/// The first corner is only emitted if `path` is empty.
fn walk(path: &mut Vec<GpsPoint>, origin: &GpsPoint, corners: &[(f64, f64)], spacing_m: f64) {
    if corners.is_empty() {
        return;
    }
    if path.is_empty() {
        path.push(offset(origin, corners[0].0, corners[0].1));
    }
    for w in corners.windows(2) {
        let (x0, y0) = w[0];
        let (x1, y1) = w[1];
        let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        let steps = (length / spacing_m).round().max(1.0) as usize;
        for s in 1..=steps {
            let t = s as f64 / steps as f64;
            path.push(offset(origin, x0 + t * (x1 - x0), y0 + t * (y1 - y0)));
        }
    }
}

// ============================================================================
// Shape Generation
// ============================================================================

/// Noise-free points of a counter-clockwise square with its corner at `origin`.
pub fn square_loop(origin: &GpsPoint, side_m: f64, spacing_m: f64) -> Vec<GpsPoint> {
    let mut path = Vec::new();
    walk(
        &mut path,
        origin,
        &[(0.0, 0.0), (side_m, 0.0), (side_m, side_m), (0.0, side_m), (0.0, 0.0)],
        spacing_m,
    );
    path
}

/// Noise-free points of a straight eastward out-and-back path.
pub fn out_and_back(origin: &GpsPoint, length_m: f64, spacing_m: f64) -> Vec<GpsPoint> {
    let mut path = Vec::new();
    walk(
        &mut path,
        origin,
        &[(0.0, 0.0), (length_m, 0.0), (0.0, 0.0)],
        spacing_m,
    );
    path
}

/// Noise-free figure-eight: large CCW lobe, then small CW lobe, both through `origin`.
pub fn figure_eight(
    origin: &GpsPoint,
    large_side_m: f64,
    small_side_m: f64,
    spacing_m: f64,
) -> Vec<GpsPoint> {
    let (l, s) = (large_side_m, small_side_m);
    let mut path = Vec::new();
    walk(
        &mut path,
        origin,
        &[
            (0.0, 0.0),
            (l, 0.0),
            (l, l),
            (0.0, l),
            (0.0, 0.0),
            (0.0, -s),
            (-s, -s),
            (-s, 0.0),
            (0.0, 0.0),
        ],
        spacing_m,
    );
    path
}

/// Noise-free chain of `count` separate squares joined along an eastward line.
///
/// Each square starts at its south-west corner and returns there before the
/// runner continues east along the square's bottom edge to the next one.
pub fn square_chain(
    origin: &GpsPoint,
    count: usize,
    side_m: f64,
    gap_m: f64,
    spacing_m: f64,
) -> Vec<GpsPoint> {
    let mut corners = vec![(0.0, 0.0)];
    for k in 0..count {
        let x0 = k as f64 * (side_m + gap_m);
        corners.extend_from_slice(&[
            (x0 + side_m, 0.0),
            (x0 + side_m, side_m),
            (x0, side_m),
            (x0, 0.0),
            (x0 + side_m + gap_m, 0.0),
        ]);
    }
    let mut path = Vec::new();
    walk(&mut path, origin, &corners, spacing_m);
    path
}

/// Noise-free circular laps; the circle's southernmost point is `origin`.
pub fn circle_laps(origin: &GpsPoint, radius_m: f64, laps: usize, spacing_m: f64) -> Vec<GpsPoint> {
    let per_lap = ((2.0 * PI * radius_m) / spacing_m).round().max(3.0) as usize;
    (0..=per_lap * laps.max(1))
        .map(|k| {
            let angle = -PI / 2.0 + 2.0 * PI * (k % per_lap) as f64 / per_lap as f64;
            offset(
                origin,
                radius_m * angle.cos(),
                radius_m + radius_m * angle.sin(),
            )
        })
        .collect()
}

/// Add Gaussian GPS noise to a polyline.
pub fn add_gps_noise(points: &[GpsPoint], sigma_meters: f64, rng: &mut StdRng) -> Vec<GpsPoint> {
    if sigma_meters <= 0.0 {
        return points.to_vec();
    }

    points
        .iter()
        .map(|p| {
            // Box-Muller transform for Gaussian noise
            let u1: f64 = rng.gen_range(0.0001..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            let z1 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();
            offset(p, z1 * sigma_meters, z0 * sigma_meters)
        })
        .collect()
}

/// Turn a polyline into timestamped fixes starting at t = 0.
pub fn to_fixes(points: &[GpsPoint], interval_ms: i64, accuracy_m: f64) -> Vec<LocationFix> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| LocationFix::new(p.latitude, p.longitude, i as i64 * interval_ms, accuracy_m))
        .collect()
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticRun {
    /// Noise-free geometry of this run.
    pub fn polyline(&self) -> Vec<GpsPoint> {
        match self.shape {
            TrackShape::Square { side_m } => square_loop(&self.origin, side_m, self.spacing_m),
            TrackShape::OutAndBack { length_m } => {
                out_and_back(&self.origin, length_m, self.spacing_m)
            }
            TrackShape::FigureEight {
                large_side_m,
                small_side_m,
            } => figure_eight(&self.origin, large_side_m, small_side_m, self.spacing_m),
            TrackShape::SquareChain {
                count,
                side_m,
                gap_m,
            } => square_chain(&self.origin, count, side_m, gap_m, self.spacing_m),
            TrackShape::Circle { radius_m, laps } => {
                circle_laps(&self.origin, radius_m, laps, self.spacing_m)
            }
        }
    }

    /// Generate noisy points with the scenario's seed.
    pub fn points(&self) -> Vec<GpsPoint> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        add_gps_noise(&self.polyline(), self.gps_noise_sigma_meters, &mut rng)
    }

    /// Generate timestamped fixes with a gentle altitude profile.
    pub fn generate(&self) -> Vec<LocationFix> {
        to_fixes(&self.points(), self.interval_ms, self.accuracy_m)
            .into_iter()
            .enumerate()
            .map(|(i, fix)| fix.with_altitude(30.0 + 5.0 * (i as f64 * 0.1).sin()))
            .collect()
    }
}
