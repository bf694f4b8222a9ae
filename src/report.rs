//! Console report formatting.
//!
//! The tables here are meant for people, not parsers; the command-line tool
//! offers `--json` for machine-readable output.
//!
//! # Example
//!
//! ```
//! use stillcut::report::format_timestamp;
//!
//! assert_eq!(format_timestamp(83.456), "01:23.46");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{matches::FrameMatch, runs::StaticRun, segments::Segment};

/// Width of the horizontal rules printed under table headers.
pub const RULE_WIDTH: usize = 70;

/// Format seconds as `MM:SS.cc`. Minutes grow past two digits as needed.
pub fn format_timestamp(seconds: f64) -> String {
    let centiseconds = (seconds.max(0.0) * 100.0).round() as u64;
    let minutes = centiseconds / 6000;
    let remainder = centiseconds % 6000;
    format!("{minutes:02}:{:02}.{:02}", remainder / 100, remainder % 100)
}

/// A horizontal rule of `width` characters.
pub fn rule(character: char, width: usize) -> String {
    std::iter::repeat_n(character, width).collect()
}

/// Table of static runs: start, end, duration, sample count.
pub struct RunTable<'a>(pub &'a [StaticRun]);

impl Display for RunTable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{:<12} {:<12} {:<12} {:<8}", "Start", "End", "Duration", "Frames")?;
        writeln!(f, "{}", rule('-', RULE_WIDTH))?;
        for run in self.0 {
            writeln!(
                f,
                "{:<12} {:<12} {:<12} {}",
                format_timestamp(run.start_time),
                format_timestamp(run.end_time),
                format!("{:.2}s", run.duration()),
                run.count,
            )?;
        }
        Ok(())
    }
}

/// Table of planned segments with their rendered and removed time.
pub struct SegmentTable<'a>(pub &'a [Segment]);

impl Display for SegmentTable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(
            f,
            "{:<9} {:<12} {:<12} {:<12} {:<10}",
            "Kind", "Start", "End", "Duration", "Removed"
        )?;
        writeln!(f, "{}", rule('-', RULE_WIDTH))?;
        for segment in self.0 {
            writeln!(
                f,
                "{:<9} {:<12} {:<12} {:<12} {}",
                segment.kind.to_string(),
                format_timestamp(segment.start_time),
                format_timestamp(segment.end_time),
                format!("{:.2}s", segment.duration()),
                format!("{:.2}s", segment.removed()),
            )?;
        }
        Ok(())
    }
}

/// Table of matching timestamps between two videos.
pub struct MatchTable<'a> {
    /// Matches to list.
    pub matches: &'a [FrameMatch],
    /// Column heading for the first video.
    pub first_label: &'a str,
    /// Column heading for the second video.
    pub second_label: &'a str,
}

impl Display for MatchTable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{:<25} {:<25}", self.first_label, self.second_label)?;
        writeln!(f, "{}", rule('-', 50))?;
        for found in self.matches {
            writeln!(
                f,
                "{:>8.2}s {:<16} {:>8.2}s   ({} / {})",
                found.first_time,
                "",
                found.second_time,
                format_timestamp(found.first_time),
                format_timestamp(found.second_time),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_to_centiseconds() {
        assert_eq!(format_timestamp(0.0), "00:00.00");
        assert_eq!(format_timestamp(0.1), "00:00.10");
        assert_eq!(format_timestamp(59.999), "01:00.00");
        assert_eq!(format_timestamp(61.25), "01:01.25");
        assert_eq!(format_timestamp(6000.5), "100:00.50");
    }

    #[test]
    fn negative_time_clamps_to_zero() {
        assert_eq!(format_timestamp(-3.0), "00:00.00");
    }

    #[test]
    fn rule_has_requested_width() {
        assert_eq!(rule('=', 5), "=====");
    }
}
