//! Trim workflow integration tests.
//!
//! Each test renders a short synthetic video written into a scratch
//! directory. Output uses MPEG-4 Part 2, which every FFmpeg build ships.

#![cfg(feature = "trim")]

mod common;

use stillcut::{
    EncodeOptions, MediaFile, Reconstructor, SamplingOptions, Segment, SegmentKind, StillcutError,
    TrimOptions, VideoCodec, trim_static_frames,
};

fn fast_encoder() -> Reconstructor {
    Reconstructor::new(EncodeOptions::default().codec(VideoCodec::Mpeg4))
}

#[test]
fn render_concatenates_segments() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_motion_video(temporary_directory.path());

    let source = MediaFile::open(&path).expect("Failed to open test video");
    let total = source.duration().expect("No duration").as_secs_f64();
    assert!((total - 2.0).abs() < 0.1, "expected a two second video, got {total}s");

    let segments = [
        Segment {
            start_time: 0.0,
            end_time: 0.5,
            source_end: 0.5,
            kind: SegmentKind::Keep,
        },
        Segment {
            start_time: 0.5,
            end_time: 0.75,
            source_end: 1.0,
            kind: SegmentKind::Trimmed,
        },
        Segment {
            start_time: 1.0,
            end_time: total,
            source_end: total,
            kind: SegmentKind::Keep,
        },
    ];

    let output_path = temporary_directory.path().join("trimmed.mp4");
    let stats = fast_encoder()
        .render(&path, &output_path, &segments)
        .expect("Failed to render");
    assert!(stats.frames_written > 0);
    assert!(stats.frames_dropped > 0);

    let rendered = MediaFile::open(&output_path).expect("Failed to open render");
    let new_duration = rendered.duration().expect("No duration").as_secs_f64();
    assert!(
        (new_duration - (total - 0.25)).abs() < 0.2,
        "expected about {}s, got {new_duration}s",
        total - 0.25
    );
    assert!(rendered.metadata().video.is_some());
}

#[test]
fn trim_halves_the_frozen_opening() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_slide_video(temporary_directory.path());
    let output_path = temporary_directory.path().join("trimmed.mp4");

    let outcome = trim_static_frames(
        &path,
        &output_path,
        &SamplingOptions::new(),
        &TrimOptions::default(),
        &fast_encoder(),
    )
    .expect("Workflow failed");

    // Samples at 0.0..=1.9 s all land on the frozen slide.
    assert_eq!(outcome.plan.long_runs.len(), 1);
    let run = outcome.plan.long_runs[0];
    assert_eq!(run.start_time, 0.0);
    assert!((run.duration() - 1.9).abs() < 1e-6, "run lasted {}s", run.duration());

    let original = outcome.plan.original_duration;
    assert!((original - 4.0).abs() < 0.1, "source lasted {original}s");

    let new_duration = outcome.new_duration.expect("Nothing was written");
    let expected = original - run.duration() / 2.0;
    assert!(
        (new_duration - expected).abs() < 0.2,
        "expected about {expected}s, got {new_duration}s"
    );
    assert!(outcome.time_saved() > 0.7);
    assert!(output_path.exists());
}

#[test]
fn failed_render_leaves_no_output() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_motion_video(temporary_directory.path());
    let output_path = temporary_directory.path().join("never.mp4");

    // Past the end of the video: no frame lands in the plan.
    let segments = [Segment {
        start_time: 3600.0,
        end_time: 3601.0,
        source_end: 3601.0,
        kind: SegmentKind::Keep,
    }];

    let result = fast_encoder().render(&path, &output_path, &segments);
    match result {
        Err(StillcutError::ReconstructionFailed { output, .. }) => assert_eq!(output, output_path),
        other => panic!("expected ReconstructionFailed, got {other:?}"),
    }
    assert!(!output_path.exists());
}

#[test]
fn empty_plan_is_rejected() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_motion_video(temporary_directory.path());
    let output_path = temporary_directory.path().join("empty.mp4");

    let result = fast_encoder().render(&path, &output_path, &[]);
    assert!(matches!(result, Err(StillcutError::ReconstructionFailed { .. })));
    assert!(!output_path.exists());
}

#[test]
fn workflow_writes_nothing_without_long_runs() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = common::write_slide_video(temporary_directory.path());
    let output_path = temporary_directory.path().join("untouched.mp4");

    // The slide lasts two seconds, well under the threshold.
    let trim = TrimOptions::new().long_threshold(3600.0);
    let outcome = trim_static_frames(
        &path,
        &output_path,
        &SamplingOptions::new(),
        &trim,
        &fast_encoder(),
    )
    .expect("Workflow failed");

    assert!(outcome.plan.is_noop());
    assert!(outcome.render.is_none());
    assert_eq!(outcome.time_saved(), 0.0);
    assert!(!output_path.exists());
}
