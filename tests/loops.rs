//! Tests for loop extraction

use tracezone::geo_utils::{point_in_polygon, polygon_area_sq_m};
use tracezone::synthetic::{SyntheticRun, TrackShape, square_loop};
use tracezone::{CandidateSearch, GpsPoint, LoopConfig, LoopPolygon, extract_loops, is_closed_loop};

fn run(shape: TrackShape) -> Vec<GpsPoint> {
    SyntheticRun {
        shape,
        ..Default::default()
    }
    .points()
}

fn assert_no_nesting(loops: &[LoopPolygon]) {
    for (a, la) in loops.iter().enumerate() {
        let center = la.centroid().unwrap();
        for (b, lb) in loops.iter().enumerate() {
            if a != b {
                assert!(
                    !point_in_polygon(&center, &lb.polygon),
                    "centroid of loop {} lies inside loop {}",
                    a,
                    b
                );
            }
        }
    }
}

fn assert_well_formed(loops: &[LoopPolygon], config: &LoopConfig) {
    assert!(loops.len() <= config.max_loops);
    for l in loops {
        assert!(l.polygon.len() >= 4);
        assert_eq!(l.polygon.first(), l.polygon.last());
        assert!(l.area_sq_m >= config.min_area_sq_m);
        assert!(l.end_index >= l.start_index + config.min_loop_points);
    }
    for w in loops.windows(2) {
        assert!(w[0].area_sq_m >= w[1].area_sq_m, "loops not sorted by area");
    }
    assert_no_nesting(loops);
}

// ============================================================================
// Short and empty tracks
// ============================================================================

#[test]
fn test_empty_track() {
    assert!(extract_loops(&[], &LoopConfig::default()).is_empty());
}

#[test]
fn test_single_point() {
    let points = vec![GpsPoint::new(51.5, -0.12)];
    assert!(extract_loops(&points, &LoopConfig::default()).is_empty());
}

#[test]
fn test_short_track_returns_nothing() {
    // 150 m square sampled every 40 m: 17 points
    let origin = GpsPoint::new(51.5, -0.12);
    let points = square_loop(&origin, 150.0, 40.0);
    assert!(points.len() < 20);
    assert!(extract_loops(&points, &LoopConfig::default()).is_empty());
}

// ============================================================================
// Basic shapes
// ============================================================================

#[test]
fn test_square_gives_one_loop() {
    let config = LoopConfig::default();
    let points = run(TrackShape::Square { side_m: 200.0 });
    assert_eq!(points.len(), 81);

    let loops = extract_loops(&points, &config);
    assert_eq!(loops.len(), 1);
    let area = loops[0].area_sq_m;
    assert!((area - 40_000.0).abs() < 1200.0, "area was {}", area);
    assert_eq!(area, polygon_area_sq_m(&loops[0].polygon));
    assert!(loops[0].polygon.len() <= config.max_polygon_vertices + 2);
    assert_well_formed(&loops, &config);
    assert!(is_closed_loop(&points, &config));
}

#[test]
fn test_out_and_back_has_no_loop() {
    let config = LoopConfig::default();
    let points = run(TrackShape::OutAndBack { length_m: 500.0 });
    assert!(extract_loops(&points, &config).is_empty());
    assert!(!is_closed_loop(&points, &config));
}

#[test]
fn test_small_circle_below_area_threshold() {
    // r = 22 m circle encloses ~1520 m²
    let points = SyntheticRun {
        shape: TrackShape::Circle {
            radius_m: 22.0,
            laps: 1,
        },
        spacing_m: 4.0,
        ..Default::default()
    }
    .points();
    assert!(points.len() >= 20);
    assert!(extract_loops(&points, &LoopConfig::default()).is_empty());
}

#[test]
fn test_figure_eight_gives_two_loops() {
    let config = LoopConfig::default();
    let points = run(TrackShape::FigureEight {
        large_side_m: 200.0,
        small_side_m: 100.0,
    });

    let loops = extract_loops(&points, &config);
    assert_eq!(loops.len(), 2);
    assert!((loops[0].area_sq_m - 40_000.0).abs() < 2000.0);
    assert!((loops[1].area_sq_m - 10_000.0).abs() < 1000.0);
    assert_well_formed(&loops, &config);
}

#[test]
fn test_repeated_laps_deduplicated() {
    let config = LoopConfig::default();
    let points = run(TrackShape::Circle {
        radius_m: 80.0,
        laps: 3,
    });

    let loops = extract_loops(&points, &config);
    assert_eq!(loops.len(), 1);
    assert_well_formed(&loops, &config);
}

// ============================================================================
// Caps and thresholds
// ============================================================================

#[test]
fn test_loop_count_capped() {
    let config = LoopConfig::default();
    let points = run(TrackShape::SquareChain {
        count: 12,
        side_m: 100.0,
        gap_m: 100.0,
    });

    let loops = extract_loops(&points, &config);
    assert_eq!(loops.len(), 10);
    assert_well_formed(&loops, &config);
}

#[test]
fn test_custom_loop_cap() {
    let config = LoopConfig {
        max_loops: 3,
        ..Default::default()
    };
    let points = run(TrackShape::SquareChain {
        count: 5,
        side_m: 100.0,
        gap_m: 100.0,
    });

    let loops = extract_loops(&points, &config);
    assert_eq!(loops.len(), 3);
    assert_well_formed(&loops, &config);
}

#[test]
fn test_separate_loops_all_found() {
    let config = LoopConfig::default();
    let points = run(TrackShape::SquareChain {
        count: 4,
        side_m: 100.0,
        gap_m: 100.0,
    });

    let loops = extract_loops(&points, &config);
    assert_eq!(loops.len(), 4);
    for l in &loops {
        assert!((l.area_sq_m - 10_000.0).abs() < 1000.0);
    }
}

#[test]
fn test_min_area_threshold() {
    let config = LoopConfig {
        min_area_sq_m: 50_000.0,
        ..Default::default()
    };
    let points = run(TrackShape::Square { side_m: 200.0 });
    assert!(extract_loops(&points, &config).is_empty());
}

#[test]
fn test_closing_radius_threshold() {
    // Stop 80 m short of the start
    let mut points = run(TrackShape::Square { side_m: 200.0 });
    points.truncate(points.len() - 8);

    assert!(extract_loops(&points, &LoopConfig::default()).is_empty());

    let wide = LoopConfig {
        closing_radius_m: 100.0,
        ..Default::default()
    };
    assert_eq!(extract_loops(&points, &wide).len(), 1);
}

#[test]
fn test_preset_configs() {
    let points = run(TrackShape::FigureEight {
        large_side_m: 200.0,
        small_side_m: 80.0,
    });

    // 80 m lobe is 6400 m², below the strict minimum
    let strict = extract_loops(&points, &LoopConfig::strict());
    assert_eq!(strict.len(), 1);

    let lenient = extract_loops(&points, &LoopConfig::lenient());
    assert_eq!(lenient.len(), 2);
}

// ============================================================================
// Search strategies
// ============================================================================

fn assert_same_loops(points: &[GpsPoint], config: LoopConfig) {
    let exhaustive = extract_loops(points, &config.clone().with_search(CandidateSearch::Exhaustive));
    let indexed = extract_loops(points, &config.clone().with_search(CandidateSearch::Indexed));
    let auto = extract_loops(points, &config.with_search(CandidateSearch::Auto));
    assert_eq!(exhaustive, indexed);
    assert_eq!(exhaustive, auto);
}

#[test]
fn test_indexed_matches_exhaustive_clean_tracks() {
    for shape in [
        TrackShape::Square { side_m: 200.0 },
        TrackShape::OutAndBack { length_m: 500.0 },
        TrackShape::FigureEight {
            large_side_m: 200.0,
            small_side_m: 100.0,
        },
        TrackShape::SquareChain {
            count: 6,
            side_m: 100.0,
            gap_m: 50.0,
        },
    ] {
        assert_same_loops(&run(shape), LoopConfig::default());
    }
}

#[test]
fn test_indexed_matches_exhaustive_noisy_tracks() {
    for seed in [1, 7, 42] {
        let points = SyntheticRun {
            shape: TrackShape::Circle {
                radius_m: 80.0,
                laps: 3,
            },
            spacing_m: 8.0,
            gps_noise_sigma_meters: 4.0,
            seed,
            ..Default::default()
        }
        .points();
        assert_same_loops(&points, LoopConfig::default());
        assert_same_loops(&points, LoopConfig::lenient());
    }
}

#[test]
fn test_indexed_matches_exhaustive_long_track() {
    // Long enough for Auto to pick the index
    let points = SyntheticRun {
        shape: TrackShape::SquareChain {
            count: 8,
            side_m: 150.0,
            gap_m: 60.0,
        },
        spacing_m: 5.0,
        gps_noise_sigma_meters: 2.0,
        ..Default::default()
    }
    .points();
    assert!(points.len() >= 500);
    assert_same_loops(&points, LoopConfig::default());
}

#[test]
fn test_indexed_with_invalid_coordinates_falls_back() {
    let mut points = run(TrackShape::Square { side_m: 200.0 });
    points[10] = GpsPoint::new(f64::NAN, -0.12);
    let config = LoopConfig::default();
    let exhaustive = extract_loops(&points, &config.clone().with_search(CandidateSearch::Exhaustive));
    let indexed = extract_loops(&points, &config.with_search(CandidateSearch::Indexed));
    assert_eq!(exhaustive, indexed);
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_loop_polygon_json() {
    let points = run(TrackShape::Square { side_m: 200.0 });
    let loops = extract_loops(&points, &LoopConfig::default());
    let loop_polygon = &loops[0];

    let json = serde_json::to_value(loop_polygon).unwrap();
    let ring = json["polygon"].as_array().unwrap();
    assert_eq!(ring.len(), loop_polygon.polygon.len());
    assert_eq!(ring[0][0].as_f64().unwrap(), loop_polygon.polygon[0].latitude);
    assert_eq!(ring[0][1].as_f64().unwrap(), loop_polygon.polygon[0].longitude);
    assert!(json["areaSqM"].as_f64().is_some());

    let back: LoopPolygon = serde_json::from_value(json).unwrap();
    assert_eq!(&back, loop_polygon);
    assert_eq!(loop_polygon.to_lat_lng_pairs().len(), loop_polygon.polygon.len());
}
