//! Error types for the `stillcut` crate.
//!
//! This module defines [`StillcutError`], the unified error type returned by
//! all fallible operations in the crate. Per-sample extraction failures are
//! not errors: they surface as unresolved [`Sample`](crate::Sample)s instead.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `stillcut` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StillcutError {
    /// The media file could not be opened or probed.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A sampling interval of zero was provided.
    #[error("Sampling interval must be greater than zero")]
    InvalidInterval,

    /// The sampling grid would hold more timestamps than can be visited.
    #[error("Too many samples: {duration:?} sampled every {interval:?}")]
    TooManySamples {
        /// Duration being sampled.
        duration: Duration,
        /// Requested sampling interval.
        interval: Duration,
    },

    /// The requested timestamp lies beyond the media duration.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(Duration),

    /// Trim thresholds are out of range.
    #[error("Invalid trim options: {0}")]
    InvalidTrimOptions(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// A sampled frame could not be encoded for hashing.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The encoder could not be found, configured, or fed.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// Rendering the trimmed video failed. The partial output was removed.
    #[error("Failed to render {output}: {reason}")]
    ReconstructionFailed {
        /// Output path that was being written.
        output: PathBuf,
        /// Diagnostic from the failing stage.
        reason: String,
    },
}

impl From<FfmpegError> for StillcutError {
    fn from(error: FfmpegError) -> Self {
        StillcutError::FfmpegError(error.to_string())
    }
}
