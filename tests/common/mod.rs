//! Synthetic test videos.
//!
//! Frames are flat colour fields so that lossy encoding reproduces them
//! exactly: identical source frames decode to identical pixels, and
//! different luma levels never collide.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Packet, Rational, codec,
    format::{self, Pixel},
    frame::Video as VideoFrame,
};

pub const FRAME_RATE: i32 = 25;
pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 48;

/// Luma level of the frozen frame in [`write_slide_video`].
pub const SLIDE_LEVEL: u8 = 128;

/// Write `frame_count` flat frames at 25 fps; `level_at(index)` is the luma
/// of frame `index`.
pub fn write_flat_video(
    path: &Path,
    frame_count: usize,
    level_at: impl Fn(usize) -> u8,
) -> Result<(), ffmpeg_next::Error> {
    ffmpeg_next::init()?;

    let mut output = format::output(&path)?;
    let needs_global_header = output
        .format()
        .flags()
        .contains(format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(codec::Id::MPEG4)
        .ok_or(ffmpeg_next::Error::EncoderNotFound)?;
    let time_base = Rational::new(1, FRAME_RATE);

    let mut stream = output.add_stream(codec)?;
    let stream_index = stream.index();

    let mut video = codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()?;
    video.set_width(WIDTH);
    video.set_height(HEIGHT);
    video.set_format(Pixel::YUV420P);
    video.set_time_base(time_base);
    video.set_frame_rate(Some(Rational::new(FRAME_RATE, 1)));
    video.set_gop(12);
    video.set_max_b_frames(0);
    video.set_qmin(2);
    video.set_qmax(2);
    if needs_global_header {
        video.set_flags(codec::Flags::GLOBAL_HEADER);
    }

    let mut encoder = video.open_as(codec)?;
    stream.set_parameters(&encoder);
    stream.set_time_base(time_base);

    output.write_header()?;
    let output_time_base = output
        .stream(stream_index)
        .map_or(time_base, |stream| stream.time_base());

    let mut packet = Packet::empty();
    let mut drain = |encoder: &mut codec::encoder::video::Encoder,
                     output: &mut format::context::Output|
     -> Result<(), ffmpeg_next::Error> {
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(stream_index);
            packet.rescale_ts(time_base, output_time_base);
            packet.write_interleaved(output)?;
        }
        Ok(())
    };

    for index in 0..frame_count {
        let mut frame = VideoFrame::new(Pixel::YUV420P, WIDTH, HEIGHT);
        frame.data_mut(0).fill(level_at(index));
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(128);
        frame.set_pts(Some(index as i64));

        encoder.send_frame(&frame)?;
        drain(&mut encoder, &mut output)?;
    }

    encoder.send_eof()?;
    drain(&mut encoder, &mut output)?;
    output.write_trailer()
}

/// Luma of a changing frame: a multiple of 16 that only repeats every 14
/// frames, so samples 2 or 3 frames apart always differ.
pub fn motion_level(index: usize) -> u8 {
    (16 * (1 + (index * 5) % 14)) as u8
}

/// Four seconds of video: a frozen slide for the first two seconds (frames
/// 0..50), then a new frame every 1/25 s.
pub fn write_slide_video(directory: &Path) -> PathBuf {
    let path = directory.join("slide.mp4");
    write_flat_video(&path, 100, |index| {
        if index < 50 {
            SLIDE_LEVEL
        } else {
            motion_level(index)
        }
    })
    .expect("Failed to write synthetic video");
    path
}

/// Two seconds of video with no repeated frame.
pub fn write_motion_video(directory: &Path) -> PathBuf {
    let path = directory.join("motion.mp4");
    write_flat_video(&path, 50, motion_level).expect("Failed to write synthetic video");
    path
}
