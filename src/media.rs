//! Core [`MediaFile`] implementation.
//!
//! `MediaFile` opens a container, locates the best video stream, and caches
//! the metadata the rest of the crate relies on. The demuxer context is kept
//! open so that [`FfmpegSampler`](crate::FfmpegSampler) can seek repeatedly
//! without reopening the file.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{
    error::StillcutError,
    metadata::{MediaMetadata, VideoMetadata},
};

/// An opened media file.
///
/// # Example
///
/// ```no_run
/// use stillcut::{MediaFile, StillcutError};
///
/// let media = MediaFile::open("input.mp4")?;
/// if let Some(video) = &media.metadata().video {
///     println!("{}x{} @ {:.2} fps", video.width, video.height, video.frames_per_second);
/// }
/// # Ok::<(), StillcutError>(())
/// ```
pub struct MediaFile {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// Cached metadata extracted at open time.
    pub(crate) metadata: MediaMetadata,
    /// Path to the opened media file (kept for error messages).
    pub(crate) file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file.
    ///
    /// Initialises FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and caches its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StillcutError::FileOpen`] if the file cannot be opened or
    /// its video decoder cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StillcutError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        crate::ffmpeg::initialize().map_err(|error| StillcutError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| StillcutError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let format = input_context.format().name().to_string();

        let video = match input_context.streams().best(Type::Video) {
            Some(stream) => {
                let index = stream.index();
                let decoder_context = CodecContext::from_parameters(stream.parameters())
                    .map_err(|error| StillcutError::FileOpen {
                        path: file_path.clone(),
                        reason: format!(
                            "Failed to read video codec parameters for stream {index}: {error}"
                        ),
                    })?;
                let decoder =
                    decoder_context
                        .decoder()
                        .video()
                        .map_err(|error| StillcutError::FileOpen {
                            path: file_path.clone(),
                            reason: format!(
                                "Failed to create video decoder for stream {index}: {error}"
                            ),
                        })?;

                let frame_rate = stream.avg_frame_rate();
                let frames_per_second = if frame_rate.denominator() != 0 {
                    frame_rate.numerator() as f64 / frame_rate.denominator() as f64
                } else {
                    let rate = stream.rate();
                    if rate.denominator() != 0 {
                        rate.numerator() as f64 / rate.denominator() as f64
                    } else {
                        0.0
                    }
                };

                let codec = decoder
                    .codec()
                    .map(|codec| codec.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string());

                Some(VideoMetadata {
                    width: decoder.width(),
                    height: decoder.height(),
                    frames_per_second,
                    codec,
                    stream_index: index,
                })
            }
            None => None,
        };

        let metadata = MediaMetadata {
            video,
            duration,
            format,
        };

        log::info!(
            "Opened media file: {} (format={}, duration={:.2}s, video={})",
            file_path.display(),
            metadata.format,
            metadata.duration.as_secs_f64(),
            metadata.video.is_some(),
        );

        if let Some(video) = &metadata.video {
            log::debug!(
                "Video stream: index={}, {}x{}, {:.2} fps, codec={}",
                video.stream_index,
                video.width,
                video.height,
                video.frames_per_second,
                video.codec,
            );
        }

        Ok(Self {
            input_context,
            metadata,
            file_path,
        })
    }

    /// Get a reference to the cached media metadata.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Total duration of the container.
    ///
    /// # Errors
    ///
    /// Returns [`StillcutError::FileOpen`] when the container does not
    /// report a duration.
    pub fn duration(&self) -> Result<Duration, StillcutError> {
        if self.metadata.duration.is_zero() {
            return Err(StillcutError::FileOpen {
                path: self.file_path.clone(),
                reason: "container reports no duration".to_string(),
            });
        }
        Ok(self.metadata.duration)
    }

    pub(crate) fn video_stream_index(&self) -> Result<usize, StillcutError> {
        self.metadata
            .video
            .as_ref()
            .map(|video| video.stream_index)
            .ok_or(StillcutError::NoVideoStream)
    }
}
