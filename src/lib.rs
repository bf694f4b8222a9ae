//! # stillcut
//!
//! Find and shrink static stretches of video.
//!
//! `stillcut` samples a video at a fixed interval, digests each sampled
//! frame, and reports runs of identical consecutive frames. Long runs can be
//! shrunk and the video re-encoded, and two videos can be compared for
//! frames they share. Decoding and encoding go through FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Report Static Runs
//!
//! ```no_run
//! use stillcut::{DEFAULT_MIN_RUN_LENGTH, SamplingOptions, find_static_runs};
//!
//! let report = find_static_runs("input.mp4", &SamplingOptions::new(), DEFAULT_MIN_RUN_LENGTH).unwrap();
//! for run in &report.runs {
//!     println!("{:.2}s..{:.2}s ({} samples)", run.start_time, run.end_time, run.count);
//! }
//! ```
//!
//! ### Compare Two Videos
//!
//! ```no_run
//! use stillcut::{DEFAULT_MATCH_INTERVAL, SamplingOptions, compare_videos};
//!
//! let options = SamplingOptions::new().with_interval(DEFAULT_MATCH_INTERVAL);
//! let comparison = compare_videos("a.mp4", "b.mp4", &options).unwrap();
//! println!("{} shared frames", comparison.matches.len());
//! ```
//!
//! ### Trim Long Static Runs
//!
//! ```no_run
//! use stillcut::{EncodeOptions, Reconstructor, SamplingOptions, TrimOptions, trim_static_frames};
//!
//! let outcome = trim_static_frames(
//!     "input.mp4",
//!     "trimmed.mp4",
//!     &SamplingOptions::new(),
//!     &TrimOptions::default(),
//!     &Reconstructor::new(EncodeOptions::default()),
//! )
//! .unwrap();
//! println!("saved {:.2}s", outcome.time_saved());
//! ```
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `trim` | Re-encoding of trimmed videos (`Reconstructor`, `trim_static_frames`). On by default. |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod hash;
pub mod matches;
pub mod media;
pub mod metadata;
pub mod progress;
#[cfg(feature = "trim")]
pub mod reconstruct;
pub mod report;
pub mod runs;
pub mod sampler;
pub mod segments;
pub mod workflow;

pub use config::{
    DEFAULT_MATCH_INTERVAL, DEFAULT_MIN_RUN_LENGTH, DEFAULT_SAMPLE_INTERVAL, SamplingOptions,
    TrimOptions,
};
pub use error::StillcutError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use hash::FrameHash;
pub use matches::{FrameMatch, find_matches};
pub use media::MediaFile;
pub use metadata::{MediaMetadata, VideoMetadata};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
#[cfg(feature = "trim")]
pub use reconstruct::{EncodeOptions, Reconstructor, RenderStats, VideoCodec};
pub use runs::{StaticRun, detect_runs, total_static_time};
pub use sampler::{FfmpegSampler, FrameSampler, Sample, SampledVideo, sample_times, sample_video};
pub use segments::{Segment, SegmentKind, SegmentTimeline, plan_segments, planned_duration};
#[cfg(feature = "trim")]
pub use workflow::{TrimOutcome, trim_static_frames};
pub use workflow::{
    Comparison, StaticReport, TrimPlan, compare_samplers, compare_videos, detect_static_runs,
    find_static_runs, plan_trim,
};
