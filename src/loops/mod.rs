//! # Closed-Loop Extraction
//!
//! Finds the parts of a run that come back to an earlier point and enclose
//! real area. Each such loop is a territory candidate.
//!
//! ## Algorithm
//!
//! 1. For every anchor `i` and every later point `j >= i + min_loop_points`,
//!    skip the pair unless `j` is within the closing radius of `i`
//! 2. Sample at most ~`max_polygon_vertices` points from `i..=j` and close the ring at `i`
//! 3. Keep the loop if its planar area and its reach from the anchor are large enough
//!    (this rejects straight out-and-back walks whose ends happen to meet)
//! 4. Sort every surviving candidate by area, largest first
//! 5. Greedily keep candidates whose centroid is not inside an already kept loop,
//!    up to `max_loops`
//!
//! The pair scan is quadratic. The closing-radius test runs first and is
//! cheap; the R-tree in [`index`] can replace the inner scan for long tracks
//! without changing the output.

pub mod index;

use std::cmp::Ordering;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::GpsPoint;
use crate::geo_utils::{haversine_distance, point_in_polygon, polygon_area_sq_m, polygon_centroid};

use index::TrackIndex;

/// How closing pairs are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSearch {
    /// Check every `(i, j)` pair.
    Exhaustive,
    /// Query an R-tree for each anchor. Same result as `Exhaustive`.
    Indexed,
    /// `Indexed` for tracks of at least [`AUTO_INDEX_MIN_POINTS`] points.
    Auto,
}

/// Track length from which `CandidateSearch::Auto` switches to the R-tree.
pub const AUTO_INDEX_MIN_POINTS: usize = 500;

/// Thresholds for loop extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Maximum distance between a loop's first and last point (meters).
    /// Default: 50.0
    pub closing_radius_m: f64,
    /// Minimum index gap `j - i` for a loop.
    /// Default: 15
    pub min_loop_points: usize,
    /// Tracks shorter than this never contain loops.
    /// Default: 20
    pub min_track_points: usize,
    /// Minimum enclosed area (square meters). Rules out needle shapes.
    /// Default: 2000.0
    pub min_area_sq_m: f64,
    /// Minimum distance the loop must reach from its anchor (meters).
    /// Default: 50.0
    pub min_extent_m: f64,
    /// Approximate vertex budget for each loop polygon.
    /// Default: 50
    pub max_polygon_vertices: usize,
    /// Maximum number of loops returned per run.
    /// Default: 10
    pub max_loops: usize,
    /// Candidate search strategy.
    /// Default: Auto
    pub search: CandidateSearch,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            closing_radius_m: 50.0,
            min_loop_points: 15,
            min_track_points: 20,
            min_area_sq_m: 2000.0,
            min_extent_m: 50.0,
            max_polygon_vertices: 50,
            max_loops: 10,
            search: CandidateSearch::Auto,
        }
    }
}

impl LoopConfig {
    /// Larger loops only, tighter closing (fewer, more deliberate claims)
    pub fn strict() -> Self {
        Self {
            closing_radius_m: 30.0,
            min_area_sq_m: 10_000.0,
            min_extent_m: 100.0,
            max_loops: 5,
            ..Default::default()
        }
    }

    /// Smaller loops and a wider closing radius (noisy GPS, small parks)
    pub fn lenient() -> Self {
        Self {
            closing_radius_m: 75.0,
            min_area_sq_m: 1000.0,
            min_extent_m: 30.0,
            ..Default::default()
        }
    }

    /// Builder-style search strategy override.
    pub fn with_search(mut self, search: CandidateSearch) -> Self {
        self.search = search;
        self
    }
}

/// A closed loop found in a track, ready to be claimed as territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopPolygon {
    /// Closed ring (first == last), serialized as `[[lat, lng], ...]`
    #[serde(with = "lat_lng_pairs")]
    pub polygon: Vec<GpsPoint>,
    /// Enclosed planar area in square meters
    pub area_sq_m: f64,
    /// Track index of the anchor point
    pub start_index: usize,
    /// Track index where the loop closes
    pub end_index: usize,
}

impl LoopPolygon {
    /// Mean of the ring vertices, excluding the closing vertex.
    pub fn centroid(&self) -> Option<GpsPoint> {
        polygon_centroid(&self.polygon)
    }

    /// `[lat, lng]` pairs including the closing vertex.
    pub fn to_lat_lng_pairs(&self) -> Vec<[f64; 2]> {
        self.polygon
            .iter()
            .map(|p| [p.latitude, p.longitude])
            .collect()
    }
}

/// A loop that passed every threshold, before nesting de-duplication.
#[derive(Debug, Clone)]
struct LoopCandidate {
    polygon: Vec<GpsPoint>,
    enclosed_area_sq_m: f64,
    max_extent_from_anchor_m: f64,
    start_index: usize,
    end_index: usize,
}

/// Find the claimable loops in a track, largest first.
///
/// Returns an empty list for short tracks and tracks without a qualifying
/// loop. Never returns more than `config.max_loops` polygons, and no returned
/// polygon's centroid lies inside another returned polygon.
pub fn extract_loops(points: &[GpsPoint], config: &LoopConfig) -> Vec<LoopPolygon> {
    if points.len() < config.min_track_points || points.len() <= config.min_loop_points {
        return Vec::new();
    }

    let mut candidates = find_candidates(points, config);
    if candidates.is_empty() {
        debug!("[Loops] No closed loops in {} points", points.len());
        return Vec::new();
    }

    // Stable: equal areas keep scan order
    candidates.sort_by(|a, b| {
        b.enclosed_area_sq_m
            .partial_cmp(&a.enclosed_area_sq_m)
            .unwrap_or(Ordering::Equal)
    });

    let candidate_count = candidates.len();
    let kept = select_outermost(candidates, config.max_loops);

    info!(
        "[Loops] {} candidates in {} points -> {} loops kept",
        candidate_count,
        points.len(),
        kept.len()
    );

    kept
}

/// True if the track contains at least one claimable loop.
pub fn is_closed_loop(points: &[GpsPoint], config: &LoopConfig) -> bool {
    !extract_loops(points, config).is_empty()
}

/// Greedy containment de-duplication over area-sorted candidates.
fn select_outermost(candidates: Vec<LoopCandidate>, max_loops: usize) -> Vec<LoopPolygon> {
    let mut kept: Vec<LoopPolygon> = Vec::new();

    for candidate in candidates {
        if kept.len() >= max_loops {
            break;
        }
        let nested = polygon_centroid(&candidate.polygon)
            .is_some_and(|center| kept.iter().any(|k| point_in_polygon(&center, &k.polygon)));
        if nested {
            continue;
        }

        debug!(
            "[Loops] Keeping loop {}..{}: {:.0} m², reach {:.0} m",
            candidate.start_index,
            candidate.end_index,
            candidate.enclosed_area_sq_m,
            candidate.max_extent_from_anchor_m
        );
        kept.push(LoopPolygon {
            polygon: candidate.polygon,
            area_sq_m: candidate.enclosed_area_sq_m,
            start_index: candidate.start_index,
            end_index: candidate.end_index,
        });
    }

    kept
}

/// Collect every qualifying `(i, j)` loop, in anchor then end-index order.
fn find_candidates(points: &[GpsPoint], config: &LoopConfig) -> Vec<LoopCandidate> {
    let use_index = match config.search {
        CandidateSearch::Exhaustive => false,
        CandidateSearch::Indexed => true,
        CandidateSearch::Auto => points.len() >= AUTO_INDEX_MIN_POINTS,
    };
    let index = if use_index {
        let built = TrackIndex::build(points);
        if built.is_none() {
            debug!("[Loops] Track has invalid coordinates, using exhaustive scan");
        }
        built
    } else {
        None
    };

    let last_anchor = (points.len() - config.min_loop_points).min(points.len() - 1);

    #[cfg(feature = "parallel")]
    let candidates: Vec<LoopCandidate> = {
        use rayon::prelude::*;
        (0..=last_anchor)
            .into_par_iter()
            .flat_map_iter(|i| anchor_candidates(points, i, config, index.as_ref()))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let candidates: Vec<LoopCandidate> = (0..=last_anchor)
        .flat_map(|i| anchor_candidates(points, i, config, index.as_ref()))
        .collect();

    candidates
}

/// Candidates anchored at `i`, in ascending `j` order.
fn anchor_candidates(
    points: &[GpsPoint],
    i: usize,
    config: &LoopConfig,
    index: Option<&TrackIndex>,
) -> Vec<LoopCandidate> {
    let first_end = i + config.min_loop_points;

    let closing = index.and_then(|idx| {
        idx.closing_indices(&points[i], config.closing_radius_m, first_end)
    });

    match closing {
        Some(ends) => ends
            .into_iter()
            .filter_map(|j| evaluate_pair(points, i, j, config))
            .collect(),
        None => (first_end..points.len())
            .filter_map(|j| evaluate_pair(points, i, j, config))
            .collect(),
    }
}

/// Apply every loop threshold to the sub-path `i..=j`.
fn evaluate_pair(
    points: &[GpsPoint],
    i: usize,
    j: usize,
    config: &LoopConfig,
) -> Option<LoopCandidate> {
    let anchor = &points[i];
    let gap_m = haversine_distance(anchor, &points[j]);
    if gap_m.is_nan() || gap_m > config.closing_radius_m {
        return None;
    }

    let polygon = closed_polygon(points, i, j, config.max_polygon_vertices);
    if polygon.len() < 4 {
        return None;
    }

    let enclosed_area_sq_m = polygon_area_sq_m(&polygon);
    if !enclosed_area_sq_m.is_finite() || enclosed_area_sq_m < config.min_area_sq_m {
        return None;
    }

    let max_extent_from_anchor_m = points[i..=j]
        .iter()
        .map(|p| haversine_distance(anchor, p))
        .fold(0.0, f64::max);
    if max_extent_from_anchor_m < config.min_extent_m {
        return None;
    }

    Some(LoopCandidate {
        polygon,
        enclosed_area_sq_m,
        max_extent_from_anchor_m,
        start_index: i,
        end_index: j,
    })
}

/// Evenly sample `points[i..=j]` and close the ring back at `points[i]`.
fn closed_polygon(points: &[GpsPoint], i: usize, j: usize, max_vertices: usize) -> Vec<GpsPoint> {
    let step = ((j - i + 1) / max_vertices.max(1)).max(1);
    let mut ring: Vec<GpsPoint> = points[i..=j].iter().step_by(step).copied().collect();
    ring.push(points[i]);
    ring
}

/// Serde adapter: `Vec<GpsPoint>` as `[[lat, lng], ...]`.
mod lat_lng_pairs {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde::ser::SerializeSeq;

    use crate::GpsPoint;

    pub fn serialize<S>(points: &[GpsPoint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(points.len()))?;
        for p in points {
            seq.serialize_element(&[p.latitude, p.longitude])?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<GpsPoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(pairs
            .into_iter()
            .map(|[lat, lng]| GpsPoint::new(lat, lng))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<GpsPoint> {
        (0..n)
            .map(|i| GpsPoint::new(51.5 + i as f64 * 0.0001, -0.1))
            .collect()
    }

    #[test]
    fn closed_polygon_samples_at_most_budget() {
        let points = line(200);
        let ring = closed_polygon(&points, 0, 199, 50);
        // step = 4 -> 50 samples + closing vertex
        assert_eq!(ring.len(), 51);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn closed_polygon_keeps_short_ranges_whole() {
        let points = line(30);
        let ring = closed_polygon(&points, 3, 20, 50);
        assert_eq!(ring.len(), 19);
        assert_eq!(ring[0], points[3]);
        assert_eq!(ring[17], points[20]);
        assert_eq!(ring[18], points[3]);
    }

    #[test]
    fn select_outermost_respects_cap() {
        let square = |offset: f64| {
            let base = GpsPoint::new(51.5, -0.1 + offset);
            vec![
                base,
                GpsPoint::new(base.latitude, base.longitude + 0.001),
                GpsPoint::new(base.latitude + 0.001, base.longitude + 0.001),
                GpsPoint::new(base.latitude + 0.001, base.longitude),
                base,
            ]
        };
        let candidates: Vec<LoopCandidate> = (0..5)
            .map(|k| LoopCandidate {
                polygon: square(k as f64 * 0.01),
                enclosed_area_sq_m: 5000.0,
                max_extent_from_anchor_m: 100.0,
                start_index: k,
                end_index: k + 20,
            })
            .collect();

        let kept = select_outermost(candidates, 3);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].start_index, 0);
        assert_eq!(kept[2].start_index, 2);
    }
}
