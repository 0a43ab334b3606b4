//! R-tree pre-index for closing-pair candidate search.
//!
//! For an anchor point the index returns every later point that could lie
//! within the closing radius. The query envelope is derived from the haversine
//! formula so that it always contains the exact closing disc; the caller then
//! re-checks each hit with the exact distance. Anchors whose envelope would
//! wrap the antimeridian or reach a pole report `None` and must be scanned
//! exhaustively.

use rstar::{AABB, RTree, RTreeObject};

use crate::GpsPoint;
use crate::geo_utils::EARTH_RADIUS_M;

/// Safety factor applied to the envelope half-widths.
const ENVELOPE_MARGIN: f64 = 1.05;

/// Minimum `cos(lat)` product below which the longitude bound is unusable.
const MIN_COS_PRODUCT: f64 = 1e-6;

/// A track point with its index for R-tree queries
#[derive(Debug, Clone, Copy)]
pub struct IndexedPoint {
    pub idx: usize,
    pub lat: f64,
    pub lng: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

/// Spatial index over one track.
pub struct TrackIndex {
    tree: RTree<IndexedPoint>,
}

impl TrackIndex {
    /// Build the index. Returns `None` if any coordinate is non-finite or out of range.
    pub fn build(points: &[GpsPoint]) -> Option<Self> {
        if !points.iter().all(GpsPoint::is_valid) {
            return None;
        }

        let indexed: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint {
                idx: i,
                lat: p.latitude,
                lng: p.longitude,
            })
            .collect();

        Some(Self {
            tree: RTree::bulk_load(indexed),
        })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indices `j >= min_index` that may lie within `radius_m` of `anchor`, ascending.
    ///
    /// Returns `None` when no safe envelope exists for this anchor.
    pub fn closing_indices(
        &self,
        anchor: &GpsPoint,
        radius_m: f64,
        min_index: usize,
    ) -> Option<Vec<usize>> {
        let envelope = closing_envelope(anchor, radius_m)?;

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|p| p.idx)
            .filter(|&idx| idx >= min_index)
            .collect();
        hits.sort_unstable();
        Some(hits)
    }
}

/// Degree envelope that contains every point within `radius_m` of `anchor`.
///
/// With `d <= r` the haversine terms give `|dlat| <= r / R` and
/// `cos(lat1) cos(lat2) sin^2(dlng / 2) <= sin^2(r / 2R)`, where `lat2` is at
/// most `r / R` further from the equator than `lat1`.
fn closing_envelope(anchor: &GpsPoint, radius_m: f64) -> Option<AABB<[f64; 2]>> {
    if !radius_m.is_finite() || radius_m < 0.0 {
        return None;
    }

    let angular = radius_m / EARTH_RADIUS_M;
    let dlat_deg = angular.to_degrees() * ENVELOPE_MARGIN;

    let lat_rad = anchor.latitude.to_radians();
    let far_lat = lat_rad.abs() + angular;
    if far_lat >= std::f64::consts::FRAC_PI_2 {
        return None;
    }
    let cos_product = lat_rad.cos() * far_lat.cos();
    if cos_product < MIN_COS_PRODUCT {
        return None;
    }

    let sin_half = (angular / 2.0).sin() / cos_product.sqrt();
    if sin_half >= 1.0 {
        return None;
    }
    let dlng_deg = (2.0 * sin_half.asin()).to_degrees() * ENVELOPE_MARGIN;

    let min_lng = anchor.longitude - dlng_deg;
    let max_lng = anchor.longitude + dlng_deg;
    if min_lng < -180.0 || max_lng > 180.0 {
        return None;
    }

    Some(AABB::from_corners(
        [anchor.latitude - dlat_deg, min_lng],
        [anchor.latitude + dlat_deg, max_lng],
    ))
}
