//! Segment planning for the trim workflow.
//!
//! [`plan_segments`] turns detected static runs into an ordered list of
//! [`Segment`]s that, rendered back to back, form the trimmed video. Every
//! run longer than [`TrimOptions::long_threshold`] is replaced by its first
//! `shrink_factor` fraction; everything else is kept as-is.
//!
//! # Example
//!
//! ```
//! use stillcut::{FrameHash, SegmentKind, StaticRun, TrimOptions, plan_segments};
//!
//! let run = StaticRun { start_time: 10.0, end_time: 12.0, hash: FrameHash::of(b"x"), count: 21 };
//! let segments = plan_segments(&[run], 20.0, &TrimOptions::default());
//! let kinds: Vec<_> = segments.iter().map(|s| (s.kind, s.start_time, s.end_time)).collect();
//! assert_eq!(kinds, vec![
//!     (SegmentKind::Keep, 0.0, 10.0),
//!     (SegmentKind::Trimmed, 10.0, 11.0),
//!     (SegmentKind::Keep, 12.0, 20.0),
//! ]);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{config::TrimOptions, runs::StaticRun};

/// Whether a segment is copied whole or is a shortened static run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Source range rendered unchanged.
    Keep,
    /// Leading part of a long static run; the rest of the run is dropped.
    Trimmed,
}

impl Display for SegmentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SegmentKind::Keep => write!(f, "keep"),
            SegmentKind::Trimmed => write!(f, "trimmed"),
        }
    }
}

/// One piece of the trimmed timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start of the rendered source range, in seconds.
    pub start_time: f64,
    /// End (exclusive) of the rendered source range, in seconds.
    pub end_time: f64,
    /// End of the source range this segment accounts for. Equal to
    /// `end_time` for kept segments and to the run's end for trimmed ones.
    pub source_end: f64,
    /// How the segment is treated.
    pub kind: SegmentKind,
}

impl Segment {
    /// Rendered length, in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Source time removed by this segment, in seconds.
    pub fn removed(&self) -> f64 {
        self.source_end - self.end_time
    }
}

/// Plan the segments of a trimmed video.
///
/// Runs at the very start or end of the timeline follow the same rule as
/// interior runs. A qualifying run that starts before the end of the
/// previous one is skipped. With no qualifying run the plan is a single
/// kept segment spanning `[0, total_duration)`.
pub fn plan_segments(runs: &[StaticRun], total_duration: f64, options: &TrimOptions) -> Vec<Segment> {
    let mut long_runs: Vec<&StaticRun> = runs
        .iter()
        .filter(|run| run.duration() > options.long_threshold)
        .collect();
    long_runs.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut segments = Vec::with_capacity(long_runs.len() * 2 + 1);
    let mut cursor = 0.0_f64;

    for run in long_runs {
        if run.start_time < cursor {
            log::warn!(
                "Skipping static run at {:.3}s: overlaps previous run ending at {cursor:.3}s",
                run.start_time,
            );
            continue;
        }

        if run.start_time > cursor {
            segments.push(Segment {
                start_time: cursor,
                end_time: run.start_time,
                source_end: run.start_time,
                kind: SegmentKind::Keep,
            });
        }

        segments.push(Segment {
            start_time: run.start_time,
            end_time: run.start_time + run.duration() * options.shrink_factor,
            source_end: run.end_time,
            kind: SegmentKind::Trimmed,
        });

        cursor = run.end_time;
    }

    if cursor < total_duration {
        segments.push(Segment {
            start_time: cursor,
            end_time: total_duration,
            source_end: total_duration,
            kind: SegmentKind::Keep,
        });
    }

    for segment in &segments {
        log::debug!(
            "Segment {:>7}: {:.3}s..{:.3}s (accounts until {:.3}s)",
            segment.kind,
            segment.start_time,
            segment.end_time,
            segment.source_end,
        );
    }

    segments
}

/// Total rendered length of `segments`, in seconds.
pub fn planned_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::duration).sum()
}

/// Maps source timestamps onto the output timeline of a segment plan.
#[derive(Debug, Clone)]
pub struct SegmentTimeline {
    segments: Vec<Segment>,
    output_offsets: Vec<f64>,
}

impl SegmentTimeline {
    /// Build the mapping for an ordered, non-overlapping plan.
    pub fn new(segments: &[Segment]) -> Self {
        let output_offsets = segments
            .iter()
            .scan(0.0_f64, |offset, segment| {
                let start = *offset;
                *offset += segment.duration();
                Some(start)
            })
            .collect();

        Self {
            segments: segments.to_vec(),
            output_offsets,
        }
    }

    /// Output time of the source instant `source_time`, or `None` when that
    /// instant is not rendered.
    pub fn output_time(&self, source_time: f64) -> Option<f64> {
        let index = self
            .segments
            .partition_point(|segment| segment.start_time <= source_time)
            .checked_sub(1)?;
        let segment = &self.segments[index];

        if source_time < segment.end_time {
            Some(self.output_offsets[index] + (source_time - segment.start_time))
        } else {
            None
        }
    }

    /// Length of the rendered output, in seconds.
    pub fn output_duration(&self) -> f64 {
        planned_duration(&self.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep(start: f64, end: f64) -> Segment {
        Segment {
            start_time: start,
            end_time: end,
            source_end: end,
            kind: SegmentKind::Keep,
        }
    }

    #[test]
    fn timeline_shifts_frames_after_a_cut() {
        let segments = [
            keep(0.0, 10.0),
            Segment {
                start_time: 10.0,
                end_time: 11.0,
                source_end: 12.0,
                kind: SegmentKind::Trimmed,
            },
            keep(12.0, 20.0),
        ];
        let timeline = SegmentTimeline::new(&segments);

        assert_eq!(timeline.output_time(0.0), Some(0.0));
        assert_eq!(timeline.output_time(9.5), Some(9.5));
        assert_eq!(timeline.output_time(10.5), Some(10.5));
        assert_eq!(timeline.output_time(11.0), None);
        assert_eq!(timeline.output_time(11.9), None);
        assert_eq!(timeline.output_time(12.0), Some(11.0));
        assert_eq!(timeline.output_time(19.0), Some(18.0));
        assert_eq!(timeline.output_time(20.0), None);
        assert_eq!(timeline.output_duration(), 19.0);
    }

    #[test]
    fn timeline_rejects_times_before_the_plan() {
        let timeline = SegmentTimeline::new(&[keep(0.0, 5.0)]);
        assert_eq!(timeline.output_time(-0.01), None);
    }

    #[test]
    fn empty_timeline_renders_nothing() {
        let timeline = SegmentTimeline::new(&[]);
        assert_eq!(timeline.output_time(0.0), None);
        assert_eq!(timeline.output_duration(), 0.0);
    }
}
