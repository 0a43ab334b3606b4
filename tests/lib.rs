//! Tests for core types

use tracezone::{Bounds, GpsPoint, LocationFix};

#[test]
fn test_gps_point_validity() {
    assert!(GpsPoint::new(51.5, -0.12).is_valid());
    assert!(GpsPoint::new(-90.0, 180.0).is_valid());
    assert!(!GpsPoint::new(90.1, 0.0).is_valid());
    assert!(!GpsPoint::new(0.0, -180.5).is_valid());
    assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
    assert!(!GpsPoint::new(0.0, f64::INFINITY).is_valid());
}

#[test]
fn test_location_fix_builders() {
    let fix = LocationFix::new(51.5, -0.12, 1000, 4.0)
        .with_altitude(35.0)
        .with_speed(3.2);
    assert_eq!(fix.altitude, Some(35.0));
    assert_eq!(fix.speed, Some(3.2));
    assert_eq!(fix.point(), GpsPoint::new(51.5, -0.12));
    assert_eq!(GpsPoint::from(&fix), fix.point());
}

#[test]
fn test_location_fix_json() {
    let fix = LocationFix::new(51.5, -0.12, 1000, 4.0);
    let json = serde_json::to_string(&fix).unwrap();
    assert!(json.contains("\"horizontalAccuracy\":4.0"));
    assert!(!json.contains("altitude"));

    let parsed: LocationFix = serde_json::from_str(
        r#"{"latitude":51.5,"longitude":-0.12,"timestamp":1000,"horizontalAccuracy":4.0,"altitude":12.5}"#,
    )
    .unwrap();
    assert_eq!(parsed.altitude, Some(12.5));
    assert_eq!(parsed.speed, None);
}

#[test]
fn test_bounds() {
    assert!(Bounds::from_points(&[]).is_none());

    let bounds = Bounds::from_points(&[
        GpsPoint::new(51.50, -0.13),
        GpsPoint::new(51.52, -0.11),
    ])
    .unwrap();
    assert_eq!(bounds.min_lat, 51.50);
    assert_eq!(bounds.max_lng, -0.11);
    let center = bounds.center();
    assert!((center.latitude - 51.51).abs() < 1e-9);
    assert!((center.longitude + 0.12).abs() < 1e-9);
}
