//! Media metadata types.
//!
//! Metadata is read once when a [`MediaFile`](crate::MediaFile) is opened and
//! cached for its lifetime. Only what the sampler and the trim renderer need
//! is kept.

use std::time::Duration;

/// Container-level metadata for a media file.
///
/// # Example
///
/// ```no_run
/// use stillcut::MediaFile;
///
/// let media = MediaFile::open("input.mp4").unwrap();
/// println!("Duration: {:?}", media.metadata().duration);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Best video stream metadata, if a video stream is present.
    pub video: Option<VideoMetadata>,
    /// Total duration of the media file.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

/// Metadata for the video stream that gets sampled.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}
