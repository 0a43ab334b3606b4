//! Map viewport fitting for a route polyline.
//!
//! Display only: nothing here feeds back into validation or loop extraction.

use serde::{Deserialize, Serialize};

use crate::{Bounds, GpsPoint};

/// Padding factor that lets the route nearly fill the map.
pub const MAP_FIT_TIGHT: f64 = 1.15;

/// Slightly looser padding (thumbnails, previews).
pub const MAP_FIT_NORMAL: f64 = 1.35;

/// Minimum latitude/longitude delta in degrees (~220 m).
pub const MIN_REGION_DELTA: f64 = 0.002;

/// Visible map region: center plus the spans shown in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRegion {
    pub center_lat: f64,
    pub center_lng: f64,
    pub lat_delta: f64,
    pub lng_delta: f64,
}

impl MapRegion {
    /// The region as bounds around its center.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_lat: self.center_lat - self.lat_delta / 2.0,
            max_lat: self.center_lat + self.lat_delta / 2.0,
            min_lng: self.center_lng - self.lng_delta / 2.0,
            max_lng: self.center_lng + self.lng_delta / 2.0,
        }
    }
}

/// Compute the region that frames `polyline`.
///
/// Each span is the bounding box span times `padding_factor`, floored at
/// [`MIN_REGION_DELTA`] so a single point or tiny route still gets a sane zoom.
/// When `viewport_aspect_ratio` (width / height) is given, the
/// under-represented span is inflated so the route fills the frame; longitude
/// spans are corrected for the `cos(lat)` shrinkage of longitude degrees.
///
/// Returns `None` for an empty polyline.
pub fn fit_region(
    polyline: &[GpsPoint],
    padding_factor: f64,
    viewport_aspect_ratio: Option<f64>,
) -> Option<MapRegion> {
    let bounds = Bounds::from_points(polyline)?;
    let center = bounds.center();

    let mut lat_delta = padded_span(bounds.max_lat - bounds.min_lat, padding_factor);
    let mut lng_delta = padded_span(bounds.max_lng - bounds.min_lng, padding_factor);

    if let Some(aspect) = viewport_aspect_ratio.filter(|a| a.is_finite() && *a > 0.0) {
        let cos_lat = center.latitude.to_radians().cos().max(1e-6);
        let region_aspect = lng_delta * cos_lat / lat_delta;
        if region_aspect < aspect {
            lng_delta = lat_delta * aspect / cos_lat;
        } else if region_aspect > aspect {
            lat_delta = lng_delta * cos_lat / aspect;
        }
    }

    Some(MapRegion {
        center_lat: center.latitude,
        center_lng: center.longitude,
        lat_delta,
        lng_delta,
    })
}

/// `span * padding`, floored at the minimum delta. Non-finite or zero products
/// fall back to the floor.
fn padded_span(span: f64, padding_factor: f64) -> f64 {
    let padded = span * padding_factor;
    if padded.is_finite() && padded > MIN_REGION_DELTA {
        padded
    } else {
        MIN_REGION_DELTA
    }
}
