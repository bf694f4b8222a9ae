//! Frame sampling.
//!
//! A sampling pass visits timestamps `0, interval, 2 * interval, ...` up to
//! (excluding) the media duration, and records one [`Sample`] per timestamp.
//! Each sample carries the [`FrameHash`] of the frame shown at that time, or
//! no hash when the frame could not be extracted.
//!
//! The source is abstracted by [`FrameSampler`] so that run detection can be
//! driven by something other than FFmpeg; [`FfmpegSampler`] is the
//! implementation over an opened [`MediaFile`].
//!
//! # Example
//!
//! ```no_run
//! use stillcut::{FfmpegSampler, SamplingOptions, StillcutError, sample_video};
//!
//! let mut sampler = FfmpegSampler::open("input.mp4")?;
//! let sampled = sample_video(&mut sampler, &SamplingOptions::new())?;
//! println!("{} of {} samples resolved", sampled.resolved_count(), sampled.samples.len());
//! # Ok::<(), StillcutError>(())
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};

use crate::{
    config::SamplingOptions,
    conversion::{StreamClock, frame_to_rgb_buffer},
    error::StillcutError,
    hash::FrameHash,
    media::MediaFile,
    progress::{OperationType, ProgressTracker},
};

/// Slack when comparing a decoded frame's time against the requested one.
const TIMESTAMP_EPSILON: f64 = 1e-6;

/// One sampled timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Sample time in seconds from the start of the media.
    pub time: f64,
    /// Content digest of the frame at `time`; `None` if extraction failed.
    pub hash: Option<FrameHash>,
}

impl Sample {
    /// A resolved sample.
    pub fn new(time: f64, hash: FrameHash) -> Self {
        Self {
            time,
            hash: Some(hash),
        }
    }

    /// A sample whose frame could not be extracted.
    pub fn unresolved(time: f64) -> Self {
        Self { time, hash: None }
    }

    /// `true` when a frame digest was produced.
    pub fn is_resolved(&self) -> bool {
        self.hash.is_some()
    }

    /// Exact content equality. Unresolved samples match nothing, not even
    /// each other.
    pub fn matches(&self, other: &Sample) -> bool {
        match (self.hash, other.hash) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Result of a full sampling pass over one source.
#[derive(Debug, Clone)]
pub struct SampledVideo {
    /// Duration reported by the source.
    pub duration: Duration,
    /// Samples in strictly increasing time order, unresolved ones included.
    pub samples: Vec<Sample>,
}

impl SampledVideo {
    /// Number of samples that produced a frame digest.
    pub fn resolved_count(&self) -> usize {
        self.samples.iter().filter(|sample| sample.is_resolved()).count()
    }

    /// Number of distinct frame digests seen.
    pub fn unique_hash_count(&self) -> usize {
        self.samples
            .iter()
            .filter_map(|sample| sample.hash)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// A source of frame digests.
pub trait FrameSampler {
    /// Total duration of the source.
    ///
    /// # Errors
    ///
    /// Fails when the source is unreadable or reports no duration. Sampling
    /// cannot proceed without it.
    fn probe_duration(&mut self) -> Result<Duration, StillcutError>;

    /// Digest of the frame displayed at `timestamp`.
    ///
    /// Returns `None` when the frame cannot be extracted; this never aborts
    /// the sampling pass.
    fn extract_hash(&mut self, timestamp: Duration) -> Option<FrameHash>;
}

/// Timestamps visited by a sampling pass: multiples of `interval` strictly
/// below `duration`.
///
/// # Errors
///
/// [`StillcutError::InvalidInterval`] when `interval` is zero, and
/// [`StillcutError::TooManySamples`] when the grid exceeds `u32::MAX`
/// timestamps.
pub fn sample_times(duration: Duration, interval: Duration) -> Result<Vec<Duration>, StillcutError> {
    if interval.is_zero() {
        return Err(StillcutError::InvalidInterval);
    }

    let step = interval.as_nanos();
    let count = duration.as_nanos().div_ceil(step);
    let count = u32::try_from(count)
        .map_err(|_| StillcutError::TooManySamples { duration, interval })?;

    Ok((0..count).map(|index| interval * index).collect())
}

/// Run a sequential sampling pass over `sampler`.
///
/// # Errors
///
/// Fails when the duration cannot be probed or the interval is zero.
/// Individual extraction failures become unresolved samples.
pub fn sample_video<S>(
    sampler: &mut S,
    options: &SamplingOptions,
) -> Result<SampledVideo, StillcutError>
where
    S: FrameSampler + ?Sized,
{
    let duration = sampler.probe_duration()?;
    let times = sample_times(duration, options.interval)?;

    log::info!(
        "Sampling {} timestamps every {:.3}s over {:.2}s",
        times.len(),
        options.interval.as_secs_f64(),
        duration.as_secs_f64(),
    );

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::FrameSampling,
        Some(times.len() as u64),
        options.batch_size,
    );

    let mut samples = Vec::with_capacity(times.len());
    for timestamp in times {
        let time = timestamp.as_secs_f64();
        let sample = match sampler.extract_hash(timestamp) {
            Some(hash) => Sample::new(time, hash),
            None => {
                log::debug!("No frame resolved at {time:.3}s");
                Sample::unresolved(time)
            }
        };
        samples.push(sample);
        tracker.advance(Some(timestamp));
    }
    tracker.finish();

    let sampled = SampledVideo { duration, samples };
    log::info!(
        "Sampled {} frames ({} unresolved)",
        sampled.resolved_count(),
        sampled.samples.len() - sampled.resolved_count(),
    );
    Ok(sampled)
}

/// [`FrameSampler`] over an opened media file.
///
/// Every call to [`extract_hash`](FrameSampler::extract_hash) seeks to the
/// nearest keyframe before the timestamp, decodes forward to the first frame
/// at or after it, converts that frame to RGB24, encodes it as PNG, and
/// digests the encoded bytes.
///
/// Timestamps count from the video stream's first frame, not from the
/// container's raw clock.
#[derive(Debug)]
pub struct FfmpegSampler {
    media: MediaFile,
}

impl FfmpegSampler {
    /// Open `path` for sampling.
    ///
    /// # Errors
    ///
    /// [`StillcutError::FileOpen`] if the file cannot be opened, or
    /// [`StillcutError::NoVideoStream`] if it has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StillcutError> {
        Self::new(MediaFile::open(path)?)
    }

    /// Sample an already opened file.
    ///
    /// # Errors
    ///
    /// [`StillcutError::NoVideoStream`] if the file has no video.
    pub fn new(media: MediaFile) -> Result<Self, StillcutError> {
        media.video_stream_index()?;
        Ok(Self { media })
    }

    /// The underlying media file.
    pub fn media(&self) -> &MediaFile {
        &self.media
    }

    /// PNG encoding of the frame shown at `timestamp`, if one is decoded.
    ///
    /// # Errors
    ///
    /// Propagates seek, decode, scaling, and encoding failures.
    pub fn frame_png(&mut self, timestamp: Duration) -> Result<Option<Vec<u8>>, StillcutError> {
        if timestamp > self.media.metadata.duration {
            return Err(StillcutError::InvalidTimestamp(timestamp));
        }

        let video_stream_index = self.media.video_stream_index()?;
        let stream = self
            .media
            .input_context
            .stream(video_stream_index)
            .ok_or(StillcutError::NoVideoStream)?;
        let clock = StreamClock::of_stream(&stream);
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let seek_target = clock.seek_target(timestamp);
        self.media.input_context.seek(seek_target, ..seek_target)?;

        let target_seconds = timestamp.as_secs_f64();
        let reaches_target = |frame: &VideoFrame| {
            frame
                .timestamp()
                .or_else(|| frame.pts())
                .is_some_and(|pts| clock.seconds(pts) + TIMESTAMP_EPSILON >= target_seconds)
        };

        let mut decoded_frame = VideoFrame::empty();

        for (stream, packet) in self.media.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|error| StillcutError::VideoDecodeError(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if reaches_target(&decoded_frame) {
                    return encode_png(&decoded_frame).map(Some);
                }
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if reaches_target(&decoded_frame) {
                return encode_png(&decoded_frame).map(Some);
            }
        }

        Ok(None)
    }
}

impl FrameSampler for FfmpegSampler {
    fn probe_duration(&mut self) -> Result<Duration, StillcutError> {
        self.media.duration()
    }

    fn extract_hash(&mut self, timestamp: Duration) -> Option<FrameHash> {
        match self.frame_png(timestamp) {
            Ok(Some(png)) => Some(FrameHash::of(&png)),
            Ok(None) => None,
            Err(error) => {
                log::debug!(
                    "Frame extraction failed at {:.3}s in {}: {error}",
                    timestamp.as_secs_f64(),
                    self.media.path().display(),
                );
                None
            }
        }
    }
}

/// Convert a decoded frame to RGB24 and encode it as PNG.
fn encode_png(frame: &VideoFrame) -> Result<Vec<u8>, StillcutError> {
    let width = frame.width();
    let height = frame.height();

    let mut scaler = ScalingContext::get(
        frame.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        ScalingFlags::BILINEAR,
    )?;
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgb_frame)?;

    let pixels = frame_to_rgb_buffer(&rgb_frame);
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, width, height, ExtendedColorType::Rgb8)?;
    Ok(png)
}
