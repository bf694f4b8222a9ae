//! Internal conversion helpers.
//!
//! Pixel-plane copying and timestamp conversions shared by the sampler and
//! the trim renderer.

use std::time::Duration;

use ffmpeg_next::{Rational, Stream, frame::Video as VideoFrame};

/// Copy an RGB24 frame into a tightly-packed buffer, dropping row padding.
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame) -> Vec<u8> {
    let width = video_frame.width() as usize;
    let height = video_frame.height() as usize;
    let stride = video_frame.stride(0);
    let row_length = width * 3;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * height].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * height);
        for row in 0..height {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert seconds to a PTS value in `time_base`, rounded to the nearest tick.
pub(crate) fn seconds_to_pts(seconds: f64, time_base: Rational) -> i64 {
    (seconds * time_base.denominator() as f64 / time_base.numerator() as f64).round() as i64
}

/// Media time of a stream, measured from the stream's first timestamp.
///
/// Containers such as MPEG-TS start their timestamps well above zero; every
/// time the crate exposes is relative to that start, so the first frame is
/// always at `0.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StreamClock {
    time_base: Rational,
    origin: i64,
}

impl StreamClock {
    /// `start_time` is the stream's first PTS, or `AV_NOPTS_VALUE` when
    /// unknown (treated as zero).
    pub(crate) fn new(time_base: Rational, start_time: i64) -> Self {
        let origin = if start_time == ffmpeg_sys_next::AV_NOPTS_VALUE {
            0
        } else {
            start_time
        };
        Self { time_base, origin }
    }

    pub(crate) fn of_stream(stream: &Stream) -> Self {
        Self::new(stream.time_base(), stream.start_time())
    }

    pub(crate) fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Seconds from the stream start to `pts`.
    pub(crate) fn seconds(&self, pts: i64) -> f64 {
        pts_to_seconds(pts.saturating_sub(self.origin), self.time_base)
    }

    /// Seek timestamp in AV_TIME_BASE (microseconds) for `offset` past the
    /// stream start.
    ///
    /// `Input::seek` goes through `avformat_seek_file` with
    /// `stream_index = -1`, which expects container-level microseconds.
    pub(crate) fn seek_target(&self, offset: Duration) -> i64 {
        let origin_micros = (pts_to_seconds(self.origin, self.time_base) * 1_000_000.0).round() as i64;
        (offset.as_micros() as i64).saturating_add(origin_micros)
    }
}
