//! Geographic utilities: distance, planar area, centroid and containment.
//!
//! Polygons are slices of [`GpsPoint`] whose first and last entries are equal.
//! Area uses a flat-earth projection that is accurate for the sub-few-km
//! extents of a single run.

use crate::{Bounds, GpsPoint};

/// Mean earth radius used by the haversine formula (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of longitude at the equator, used by the area projection.
pub const METERS_PER_DEG_LNG: f64 = 111_320.0;

/// Meters per degree of latitude, used by the area projection.
pub const METERS_PER_DEG_LAT: f64 = 110_540.0;

/// Great-circle distance between two points in meters (haversine).
///
/// Symmetric and exactly zero for coincident points.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlng = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Total path length in meters (sum of consecutive haversine distances).
pub fn total_distance(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Enclosed area of a polygon in square meters.
///
/// Each vertex is projected with its own latitude:
/// `x = lng * 111320 * cos(lat)`, `y = lat * 110540`, then the shoelace
/// formula is applied. The result is independent of winding order.
/// Returns 0 for fewer than 3 entries.
pub fn polygon_area_sq_m(polygon: &[GpsPoint]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }

    let project = |p: &GpsPoint| {
        (
            p.longitude * METERS_PER_DEG_LNG * p.latitude.to_radians().cos(),
            p.latitude * METERS_PER_DEG_LAT,
        )
    };

    let mut twice_area = 0.0;
    for i in 0..n {
        let (xi, yi) = project(&polygon[i]);
        let (xj, yj) = project(&polygon[(i + 1) % n]);
        twice_area += xi * yj - xj * yi;
    }

    (twice_area / 2.0).abs()
}

/// Mean latitude and longitude of a closed polygon, ignoring the closing vertex.
///
/// Returns `None` when there is no vertex left to average.
pub fn polygon_centroid(polygon: &[GpsPoint]) -> Option<GpsPoint> {
    let n = polygon.len().checked_sub(1).filter(|&n| n > 0)?;
    let (lat_sum, lng_sum) = polygon[..n]
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.latitude, lng + p.longitude));

    Some(GpsPoint::new(lat_sum / n as f64, lng_sum / n as f64))
}

/// Ray-casting containment test against a closed polygon.
///
/// Always false when the ring has fewer than 3 distinct vertices.
pub fn point_in_polygon(point: &GpsPoint, polygon: &[GpsPoint]) -> bool {
    if polygon.len() < 4 {
        return false;
    }
    let ring = &polygon[..polygon.len() - 1];
    if distinct_vertex_count(ring, 3) < 3 {
        return false;
    }

    let (lat, lng) = (point.latitude, point.longitude);
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].longitude, ring[i].latitude);
        let (xj, yj) = (ring[j].longitude, ring[j].latitude);
        if (yi > lat) != (yj > lat) && lng < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Count distinct vertices, stopping early once `limit` is reached.
fn distinct_vertex_count(ring: &[GpsPoint], limit: usize) -> usize {
    let mut seen: Vec<&GpsPoint> = Vec::with_capacity(limit);
    for p in ring {
        if !seen.iter().any(|s| *s == p) {
            seen.push(p);
            if seen.len() >= limit {
                break;
            }
        }
    }
    seen.len()
}

/// Compute the bounding box of a track.
///
/// Returns inverted infinite bounds for an empty track; prefer
/// [`Bounds::from_points`] when emptiness must be observable.
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    Bounds::from_points(points).unwrap_or(Bounds {
        min_lat: f64::INFINITY,
        max_lat: f64::NEG_INFINITY,
        min_lng: f64::INFINITY,
        max_lng: f64::NEG_INFINITY,
    })
}

/// Convert a distance in meters to degrees of longitude at the given latitude.
///
/// Longitude degrees shrink towards the poles, so the same distance spans more
/// degrees at higher latitudes.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let cos_lat = latitude.to_radians().cos().abs().max(1e-6);
    meters / (METERS_PER_DEG_LNG * cos_lat)
}

/// Simplify a whole track into a closed polygon of at most about `max_vertices`
/// evenly spaced samples, closed back to the first sample.
///
/// This is the fallback claim shape for a run that returns to its start.
/// Returns an empty vector for an empty track.
pub fn points_to_polygon(points: &[GpsPoint], max_vertices: usize) -> Vec<GpsPoint> {
    if points.is_empty() {
        return Vec::new();
    }
    let step = (points.len() / max_vertices.max(1)).max(1);
    let mut polygon: Vec<GpsPoint> = points.iter().step_by(step).copied().collect();
    polygon.push(polygon[0]);
    polygon
}
