//! Rendering a trimmed video from a segment plan.
//!
//! [`Reconstructor`] decodes the source video once, keeps the frames that
//! fall inside a planned [`Segment`], shifts their timestamps so that the
//! segments play back to back, and re-encodes the result. Only the video
//! stream is written; audio is dropped.
//!
//! This module is available when the `trim` feature is enabled (default).
//!
//! # Example
//!
//! ```no_run
//! use stillcut::{EncodeOptions, Reconstructor, StillcutError, TrimOptions, plan_segments};
//!
//! # let runs = Vec::new();
//! let segments = plan_segments(&runs, 42.0, &TrimOptions::default());
//! Reconstructor::new(EncodeOptions::default().crf(20))
//!     .render("input.mp4", "trimmed.mp4", &segments)?;
//! # Ok::<(), StillcutError>(())
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::codec::encoder::video::Encoder as VideoEncoder;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Dictionary, Packet, Rational};

use crate::conversion::{StreamClock, seconds_to_pts};
use crate::error::StillcutError;
use crate::media::MediaFile;
use crate::progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker};
use crate::segments::{Segment, SegmentTimeline};

/// Supported output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    /// H.264 / AVC.
    #[default]
    H264,
    /// H.265 / HEVC.
    H265,
    /// MPEG-4 Part 2.
    Mpeg4,
}

impl VideoCodec {
    fn to_codec_id(self) -> Id {
        match self {
            VideoCodec::H264 => Id::H264,
            VideoCodec::H265 => Id::HEVC,
            VideoCodec::Mpeg4 => Id::MPEG4,
        }
    }
}

impl FromStr for VideoCodec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "h264" | "avc" | "libx264" => Ok(VideoCodec::H264),
            "h265" | "hevc" | "libx265" => Ok(VideoCodec::H265),
            "mpeg4" => Ok(VideoCodec::Mpeg4),
            other => Err(format!("unsupported codec: {other}")),
        }
    }
}

/// Encoder settings for the trimmed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Output codec. Default: H.264.
    pub codec: VideoCodec,
    /// Constant Rate Factor (0-51, lower is better). Default: 23.
    pub crf: u32,
    /// Encoder speed preset. Default: `"medium"`.
    pub preset: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            codec: VideoCodec::H264,
            crf: 23,
            preset: "medium".to_string(),
        }
    }
}

impl EncodeOptions {
    /// Set the codec.
    pub fn codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the CRF quality value.
    pub fn crf(mut self, crf: u32) -> Self {
        self.crf = crf;
        self
    }

    /// Set the encoder preset (e.g. `"veryfast"`, `"slow"`).
    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    fn to_dictionary(&self) -> Dictionary<'static> {
        let mut dictionary = Dictionary::new();
        dictionary.set("crf", &self.crf.to_string());
        dictionary.set("preset", &self.preset);
        dictionary
    }
}

/// Counters from one render.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderStats {
    /// Frames encoded into the output.
    pub frames_written: u64,
    /// Decoded frames that fell outside every segment or had no timestamp.
    pub frames_dropped: u64,
}

/// Renders segment plans into video files.
pub struct Reconstructor {
    options: EncodeOptions,
    progress: Arc<dyn ProgressCallback>,
    batch_size: u64,
}

impl Reconstructor {
    /// Create a renderer with the given encoder settings.
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            options,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Attach a progress callback fired every `batch_size` decoded frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>, batch_size: u64) -> Self {
        self.progress = callback;
        self.batch_size = batch_size.max(1);
        self
    }

    /// Concatenate the video content of `segments`, in order, into `output`.
    ///
    /// The container format is inferred from the output extension.
    ///
    /// # Errors
    ///
    /// [`StillcutError::ReconstructionFailed`] wrapping the first failure.
    /// Whatever was written to `output` is deleted, so a file left at
    /// `output` is always a complete render.
    pub fn render<P, Q>(&self, input: P, output: Q, segments: &[Segment]) -> Result<RenderStats, StillcutError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let output = output.as_ref();

        log::info!(
            "Rendering {} segments of {} into {} (codec={:?}, crf={}, preset={})",
            segments.len(),
            input.as_ref().display(),
            output.display(),
            self.options.codec,
            self.options.crf,
            self.options.preset,
        );

        self.render_inner(input.as_ref(), output, segments)
            .map_err(|error| {
                if output.exists() && fs::remove_file(output).is_err() {
                    log::warn!("Could not remove partial output {}", output.display());
                }
                StillcutError::ReconstructionFailed {
                    output: output.to_path_buf(),
                    reason: error.to_string(),
                }
            })
    }

    fn render_inner(&self, input: &Path, output: &Path, segments: &[Segment]) -> Result<RenderStats, StillcutError> {
        if segments.is_empty() {
            return Err(StillcutError::VideoEncodeError("no segments to render".to_string()));
        }

        let mut media = MediaFile::open(input)?;
        let video_stream_index = media.video_stream_index()?;
        let estimated_frames = media
            .metadata
            .video
            .as_ref()
            .map(|video| (media.metadata.duration.as_secs_f64() * video.frames_per_second) as u64)
            .filter(|&frames| frames > 0);

        let (clock, frame_rate, mut decoder) = {
            let stream = media
                .input_context
                .stream(video_stream_index)
                .ok_or(StillcutError::NoVideoStream)?;
            let decoder_context = CodecContext::from_parameters(stream.parameters())?;
            (
                StreamClock::of_stream(&stream),
                stream.avg_frame_rate(),
                decoder_context.decoder().video()?,
            )
        };

        let timeline = SegmentTimeline::new(segments);
        let mut writer = FrameWriter::open(
            output,
            &self.options,
            decoder.width(),
            decoder.height(),
            clock,
            frame_rate,
            &timeline,
        )?;

        let mut tracker = ProgressTracker::new(
            self.progress.clone(),
            OperationType::Reconstruction,
            estimated_frames,
            self.batch_size,
        );

        let mut decoded_frame = VideoFrame::empty();

        for (stream, packet) in media.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|error| StillcutError::VideoDecodeError(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let source_time = writer.push(&decoded_frame)?;
                tracker.advance(source_time.and_then(|t| Duration::try_from_secs_f64(t).ok()));
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let source_time = writer.push(&decoded_frame)?;
            tracker.advance(source_time.and_then(|t| Duration::try_from_secs_f64(t).ok()));
        }
        tracker.finish();

        let stats = writer.finish()?;
        log::info!(
            "Rendered {} frames into {} ({} dropped)",
            stats.frames_written,
            output.display(),
            stats.frames_dropped,
        );
        Ok(stats)
    }
}

/// Encoder and muxer state for one render.
struct FrameWriter<'a> {
    timeline: &'a SegmentTimeline,
    clock: StreamClock,
    encoder: VideoEncoder,
    width: u32,
    height: u32,
    output: Output,
    stream_index: usize,
    output_time_base: Rational,
    scaler: Option<ScalingContext>,
    last_pts: Option<i64>,
    stats: RenderStats,
}

impl<'a> FrameWriter<'a> {
    fn open(
        path: &Path,
        options: &EncodeOptions,
        width: u32,
        height: u32,
        clock: StreamClock,
        frame_rate: Rational,
        timeline: &'a SegmentTimeline,
    ) -> Result<Self, StillcutError> {
        let codec_id = options.codec.to_codec_id();
        let time_base = clock.time_base();

        let mut output = ffmpeg_next::format::output(&path)
            .map_err(|e| StillcutError::VideoEncodeError(format!("cannot open output: {e}")))?;

        // Must be read before add_stream borrows the context.
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            StillcutError::VideoEncodeError(format!("codec {codec_id:?} not available"))
        })?;

        let mut stream = output
            .add_stream(codec)
            .map_err(|e| StillcutError::VideoEncodeError(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| StillcutError::VideoEncodeError(format!("cannot create encoder: {e}")))?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(time_base);
        if frame_rate.numerator() > 0 && frame_rate.denominator() > 0 {
            encoder.set_frame_rate(Some(frame_rate));
        }

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder
            .open_as_with(codec, options.to_dictionary())
            .map_err(|e| StillcutError::VideoEncodeError(format!("cannot open encoder: {e}")))?;

        stream.set_parameters(&encoder);
        stream.set_time_base(time_base);

        output
            .write_header()
            .map_err(|e| StillcutError::VideoEncodeError(format!("cannot write header: {e}")))?;

        // The muxer may pick its own time base during write_header.
        let output_time_base = output
            .stream(stream_index)
            .ok_or_else(|| StillcutError::VideoEncodeError("output stream vanished".to_string()))?
            .time_base();

        Ok(Self {
            timeline,
            clock,
            encoder,
            width,
            height,
            output,
            stream_index,
            output_time_base,
            scaler: None,
            last_pts: None,
            stats: RenderStats::default(),
        })
    }

    /// Encode `frame` if it falls inside a segment. Returns its source time.
    fn push(&mut self, frame: &VideoFrame) -> Result<Option<f64>, StillcutError> {
        let Some(pts) = frame.timestamp().or_else(|| frame.pts()) else {
            self.stats.frames_dropped += 1;
            return Ok(None);
        };
        let source_time = self.clock.seconds(pts);

        let Some(output_time) = self.timeline.output_time(source_time) else {
            self.stats.frames_dropped += 1;
            return Ok(Some(source_time));
        };

        let output_pts = seconds_to_pts(output_time, self.clock.time_base());
        if self.last_pts.is_some_and(|last| output_pts <= last) {
            log::debug!("Dropping frame at {source_time:.3}s: output timestamp not increasing");
            self.stats.frames_dropped += 1;
            return Ok(Some(source_time));
        }

        if self.scaler.is_none() {
            self.scaler = Some(
                ScalingContext::get(
                    frame.format(),
                    frame.width(),
                    frame.height(),
                    Pixel::YUV420P,
                    self.width,
                    self.height,
                    ScalingFlags::BILINEAR,
                )
                .map_err(|e| StillcutError::VideoEncodeError(format!("cannot create scaler: {e}")))?,
            );
        }
        let Some(scaler) = self.scaler.as_mut() else {
            return Err(StillcutError::VideoEncodeError("scaler unavailable".to_string()));
        };

        let mut yuv_frame = VideoFrame::empty();
        scaler
            .run(frame, &mut yuv_frame)
            .map_err(|e| StillcutError::VideoEncodeError(format!("scaling failed: {e}")))?;
        yuv_frame.set_pts(Some(output_pts));

        self.encoder
            .send_frame(&yuv_frame)
            .map_err(|e| StillcutError::VideoEncodeError(format!("send_frame failed: {e}")))?;
        self.last_pts = Some(output_pts);
        self.stats.frames_written += 1;

        self.write_packets()?;
        Ok(Some(source_time))
    }

    fn write_packets(&mut self) -> Result<(), StillcutError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.clock.time_base(), self.output_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| StillcutError::VideoEncodeError(format!("write packet failed: {e}")))?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<RenderStats, StillcutError> {
        if self.stats.frames_written == 0 {
            return Err(StillcutError::VideoEncodeError(
                "no decoded frame fell inside the planned segments".to_string(),
            ));
        }

        self.encoder
            .send_eof()
            .map_err(|e| StillcutError::VideoEncodeError(format!("send_eof failed: {e}")))?;
        self.write_packets()?;

        self.output
            .write_trailer()
            .map_err(|e| StillcutError::VideoEncodeError(format!("cannot write trailer: {e}")))?;

        Ok(self.stats)
    }
}
