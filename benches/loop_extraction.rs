//! Criterion benchmarks for loop extraction.
//!
//! Run with: `cargo bench --bench loop_extraction`
//!
//! Compares the exhaustive pair scan with the R-tree candidate search on
//! noisy multi-lap runs of increasing length.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tracezone::synthetic::{SyntheticRun, TrackShape};
use tracezone::{CandidateSearch, GpsPoint, LoopConfig, RunSession, extract_loops};

fn noisy_laps(laps: usize) -> Vec<GpsPoint> {
    SyntheticRun {
        shape: TrackShape::Circle {
            radius_m: 150.0,
            laps,
        },
        spacing_m: 8.0,
        gps_noise_sigma_meters: 3.0,
        ..Default::default()
    }
    .points()
}

fn bench_candidate_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate_search");
    group.sample_size(10);

    for laps in [1, 3, 6] {
        let points = noisy_laps(laps);
        for (name, search) in [
            ("exhaustive", CandidateSearch::Exhaustive),
            ("indexed", CandidateSearch::Indexed),
        ] {
            let config = LoopConfig::default().with_search(search);
            group.bench_with_input(BenchmarkId::new(name, points.len()), &points, |b, pts| {
                b.iter(|| extract_loops(black_box(pts), &config))
            });
        }
    }

    group.finish();
}

fn bench_square_chain(c: &mut Criterion) {
    let points = SyntheticRun {
        shape: TrackShape::SquareChain {
            count: 12,
            side_m: 120.0,
            gap_m: 80.0,
        },
        gps_noise_sigma_meters: 2.0,
        ..Default::default()
    }
    .points();

    c.bench_function("square_chain_auto", |b| {
        b.iter(|| extract_loops(black_box(&points), &LoopConfig::default()))
    });
}

fn bench_session_replay(c: &mut Criterion) {
    let fixes = SyntheticRun {
        shape: TrackShape::Circle {
            radius_m: 200.0,
            laps: 2,
        },
        ..Default::default()
    }
    .generate();

    c.bench_function("session_replay", |b| {
        b.iter(|| {
            let mut session = RunSession::default();
            for fix in black_box(&fixes) {
                let _ = session.ingest(*fix);
            }
            session.finish()
        })
    });
}

criterion_group!(
    benches,
    bench_candidate_search,
    bench_square_chain,
    bench_session_replay
);
criterion_main!(benches);
