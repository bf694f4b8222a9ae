//! Benchmarks for run detection, segment planning, and frame sampling.
//!
//! Run with: cargo bench
//!
//! Detection and planning use synthetic samples. The sampling benchmark
//! needs `tests/fixtures/sample_video.mp4` and is skipped without it.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::{BenchmarkId, Criterion};
use ffmpeg_next::util::log::Level as LogLevel;
use stillcut::{
    FfmpegSampler, FrameHash, Sample, SamplingOptions, TrimOptions, detect_runs, find_matches,
    plan_segments, sample_video,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// An hour of 100 ms samples where every `period`-th frame starts a new
/// still image.
fn synthetic_samples(count: usize, period: usize) -> Vec<Sample> {
    let hashes: Vec<FrameHash> = (0..count / period + 1)
        .map(|index| FrameHash::of(&index.to_le_bytes()))
        .collect();

    (0..count)
        .map(|index| Sample::new(index as f64 * 0.1, hashes[index / period]))
        .collect()
}

fn benchmark_run_detection(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("detect_runs");

    for period in [1, 5, 50] {
        let samples = synthetic_samples(36_000, period);
        group.bench_with_input(BenchmarkId::from_parameter(period), &samples, |bencher, samples| {
            bencher.iter(|| detect_runs(black_box(samples), 3));
        });
    }

    group.finish();
}

fn benchmark_segment_planning(criterion: &mut Criterion) {
    let samples = synthetic_samples(36_000, 50);
    let runs = detect_runs(&samples, 3);
    let options = TrimOptions::default();

    criterion.bench_function("plan_segments (720 runs)", |bencher| {
        bencher.iter(|| plan_segments(black_box(&runs), 3600.0, &options));
    });
}

fn benchmark_match_finding(criterion: &mut Criterion) {
    let first = synthetic_samples(7_200, 5);
    let second = synthetic_samples(7_200, 7);

    criterion.bench_function("find_matches (7200 x 7200)", |bencher| {
        bencher.iter(|| find_matches(black_box(&first), black_box(&second)));
    });
}

fn benchmark_sampling(criterion: &mut Criterion) {
    ffmpeg_next::util::log::set_level(LogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let options = SamplingOptions::new().with_interval(Duration::from_millis(500));
    let mut group = criterion.benchmark_group("sampling");
    group.sample_size(10);
    group.bench_function("sample every 500ms", |bencher| {
        bencher.iter(|| {
            let mut sampler = FfmpegSampler::open(SAMPLE_VIDEO).unwrap();
            sample_video(&mut sampler, &options).unwrap()
        });
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_run_detection,
    benchmark_segment_planning,
    benchmark_match_finding,
    benchmark_sampling,
);
criterion::criterion_main!(benches);
