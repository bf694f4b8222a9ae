//! End-to-end workflows: static-frame reports, video comparison, trimming.
//!
//! Each workflow comes in two flavours: one that takes any
//! [`FrameSampler`] and one that opens a file path with [`FfmpegSampler`].

use std::path::Path;

use crate::{
    config::{SamplingOptions, TrimOptions},
    error::StillcutError,
    matches::{FrameMatch, find_matches},
    runs::{StaticRun, detect_runs, total_static_time},
    sampler::{FfmpegSampler, FrameSampler, SampledVideo, sample_video},
    segments::{Segment, SegmentKind, plan_segments, planned_duration},
};

#[cfg(feature = "trim")]
use crate::{
    media::MediaFile,
    reconstruct::{Reconstructor, RenderStats},
};

/// Static runs found in one video.
#[derive(Debug, Clone)]
pub struct StaticReport {
    /// The sampling pass the runs were detected from.
    pub sampled: SampledVideo,
    /// Detected runs, ordered by start time.
    pub runs: Vec<StaticRun>,
}

impl StaticReport {
    /// Combined duration of all runs, in seconds.
    pub fn total_static_time(&self) -> f64 {
        total_static_time(&self.runs)
    }
}

/// Sample `sampler` and detect its static runs.
///
/// # Errors
///
/// Fails when the duration cannot be probed or the interval is zero.
pub fn detect_static_runs<S>(
    sampler: &mut S,
    options: &SamplingOptions,
    min_run_length: usize,
) -> Result<StaticReport, StillcutError>
where
    S: FrameSampler + ?Sized,
{
    let sampled = sample_video(sampler, options)?;
    let runs = detect_runs(&sampled.samples, min_run_length);
    log::info!("Found {} static runs", runs.len());
    Ok(StaticReport { sampled, runs })
}

/// [`detect_static_runs`] over the video at `path`.
///
/// # Errors
///
/// Also fails when the file cannot be opened or has no video stream.
pub fn find_static_runs<P: AsRef<Path>>(
    path: P,
    options: &SamplingOptions,
    min_run_length: usize,
) -> Result<StaticReport, StillcutError> {
    let mut sampler = FfmpegSampler::open(path)?;
    detect_static_runs(&mut sampler, options, min_run_length)
}

/// Sampling passes over two videos and the frames they share.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// First video's samples.
    pub first: SampledVideo,
    /// Second video's samples.
    pub second: SampledVideo,
    /// Matches in the first video's order.
    pub matches: Vec<FrameMatch>,
}

/// Sample both sources with the same options and pair identical frames.
///
/// # Errors
///
/// Fails if either sampling pass fails.
pub fn compare_samplers<A, B>(
    first: &mut A,
    second: &mut B,
    options: &SamplingOptions,
) -> Result<Comparison, StillcutError>
where
    A: FrameSampler + ?Sized,
    B: FrameSampler + ?Sized,
{
    let first = sample_video(first, options)?;
    let second = sample_video(second, options)?;
    let matches = find_matches(&first.samples, &second.samples);
    log::info!("Found {} matching frames", matches.len());
    Ok(Comparison {
        first,
        second,
        matches,
    })
}

/// [`compare_samplers`] over two video files.
///
/// # Errors
///
/// Also fails when either file cannot be opened.
pub fn compare_videos<P, Q>(first: P, second: Q, options: &SamplingOptions) -> Result<Comparison, StillcutError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut first = FfmpegSampler::open(first)?;
    let mut second = FfmpegSampler::open(second)?;
    compare_samplers(&mut first, &mut second, options)
}

/// What a trim would do to one video.
#[derive(Debug, Clone)]
pub struct TrimPlan {
    /// Duration of the source, in seconds.
    pub original_duration: f64,
    /// Runs long enough to be shrunk, ordered by start time.
    pub long_runs: Vec<StaticRun>,
    /// Segments to render.
    pub segments: Vec<Segment>,
}

impl TrimPlan {
    /// `true` when no run qualifies and rendering would copy the source.
    pub fn is_noop(&self) -> bool {
        !self
            .segments
            .iter()
            .any(|segment| segment.kind == SegmentKind::Trimmed)
    }

    /// Length of the rendered output, in seconds.
    pub fn planned_duration(&self) -> f64 {
        planned_duration(&self.segments)
    }
}

/// Sample `sampler`, detect runs with the default minimum length, and plan
/// the trimmed timeline.
///
/// # Errors
///
/// [`StillcutError::InvalidTrimOptions`] for bad thresholds, or any sampling
/// failure.
pub fn plan_trim<S>(
    sampler: &mut S,
    sampling: &SamplingOptions,
    trim: &TrimOptions,
) -> Result<TrimPlan, StillcutError>
where
    S: FrameSampler + ?Sized,
{
    trim.validate()?;

    let report = detect_static_runs(sampler, sampling, crate::config::DEFAULT_MIN_RUN_LENGTH)?;
    let original_duration = report.sampled.duration.as_secs_f64();
    let segments = plan_segments(&report.runs, original_duration, trim);
    let long_runs = report
        .runs
        .into_iter()
        .filter(|run| run.duration() > trim.long_threshold)
        .collect();

    Ok(TrimPlan {
        original_duration,
        long_runs,
        segments,
    })
}

/// Result of [`trim_static_frames`].
#[cfg(feature = "trim")]
#[derive(Debug, Clone)]
pub struct TrimOutcome {
    /// The plan that was rendered.
    pub plan: TrimPlan,
    /// Render counters, `None` when nothing needed trimming.
    pub render: Option<RenderStats>,
    /// Duration of the written file, `None` when nothing was written.
    pub new_duration: Option<f64>,
}

#[cfg(feature = "trim")]
impl TrimOutcome {
    /// Seconds removed from the source.
    pub fn time_saved(&self) -> f64 {
        self.new_duration
            .map_or(0.0, |new_duration| self.plan.original_duration - new_duration)
    }

    /// [`time_saved`](Self::time_saved) as a percentage of the source.
    pub fn percent_saved(&self) -> f64 {
        if self.plan.original_duration > 0.0 {
            self.time_saved() / self.plan.original_duration * 100.0
        } else {
            0.0
        }
    }
}

/// Shrink every long static run of `input` and write the result to
/// `output`.
///
/// When no run exceeds the threshold nothing is written and the outcome
/// carries no render.
///
/// # Errors
///
/// Sampling and planning failures, or
/// [`StillcutError::ReconstructionFailed`] from the render.
#[cfg(feature = "trim")]
pub fn trim_static_frames<P, Q>(
    input: P,
    output: Q,
    sampling: &SamplingOptions,
    trim: &TrimOptions,
    reconstructor: &Reconstructor,
) -> Result<TrimOutcome, StillcutError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref();
    let output = output.as_ref();

    let mut sampler = FfmpegSampler::open(input)?;
    let plan = plan_trim(&mut sampler, sampling, trim)?;
    drop(sampler);

    if plan.is_noop() {
        log::info!("No static run longer than {:.2}s; nothing to trim", trim.long_threshold);
        return Ok(TrimOutcome {
            plan,
            render: None,
            new_duration: None,
        });
    }

    let stats = reconstructor.render(input, output, &plan.segments)?;

    let new_duration = match MediaFile::open(output).and_then(|media| media.duration()) {
        Ok(duration) => duration.as_secs_f64(),
        Err(error) => {
            log::warn!("Could not probe {}: {error}; using planned duration", output.display());
            plan.planned_duration()
        }
    };

    Ok(TrimOutcome {
        plan,
        render: Some(stats),
        new_duration: Some(new_duration),
    })
}
