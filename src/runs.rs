//! Static run detection.
//!
//! A static run is a maximal stretch of consecutive samples that share an
//! identical frame digest. Runs shorter than the configured minimum are
//! discarded.
//!
//! # Example
//!
//! ```
//! use stillcut::{FrameHash, Sample, detect_runs};
//!
//! let a = FrameHash::of(b"a");
//! let b = FrameHash::of(b"b");
//! let samples = [
//!     Sample::new(0.0, a),
//!     Sample::new(1.0, a),
//!     Sample::new(2.0, a),
//!     Sample::new(3.0, b),
//! ];
//! let runs = detect_runs(&samples, 3);
//! assert_eq!(runs.len(), 1);
//! assert_eq!((runs[0].start_time, runs[0].end_time, runs[0].count), (0.0, 2.0, 3));
//! ```

use crate::{hash::FrameHash, sampler::Sample};

/// A maximal run of identical consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticRun {
    /// Time of the first sample in the run, in seconds.
    pub start_time: f64,
    /// Time of the last sample in the run, in seconds.
    pub end_time: f64,
    /// Digest shared by every sample in the run.
    pub hash: FrameHash,
    /// Number of samples in the run.
    pub count: usize,
}

impl StaticRun {
    /// `end_time - start_time`, in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Find every maximal run of at least `min_run_length` identical samples.
///
/// Samples are compared pairwise in order. Unresolved samples match nothing,
/// so they always end the run in progress. Values of `min_run_length` below
/// 2 behave like 2, since a single sample never forms a run.
pub fn detect_runs(samples: &[Sample], min_run_length: usize) -> Vec<StaticRun> {
    let mut runs = Vec::new();
    let mut open: Option<StaticRun> = None;

    for pair in samples.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);

        match (current.matches(next), next.hash) {
            (true, Some(hash)) => {
                open = Some(match open {
                    Some(run) => StaticRun {
                        end_time: next.time,
                        count: run.count + 1,
                        ..run
                    },
                    None => StaticRun {
                        start_time: current.time,
                        end_time: next.time,
                        hash,
                        count: 2,
                    },
                });
            }
            _ => close_run(open.take(), min_run_length, &mut runs),
        }
    }

    close_run(open, min_run_length, &mut runs);
    runs
}

fn close_run(run: Option<StaticRun>, min_run_length: usize, runs: &mut Vec<StaticRun>) {
    if let Some(run) = run
        && run.count >= min_run_length
    {
        runs.push(run);
    }
}

/// Sum of the durations of `runs`, in seconds.
pub fn total_static_time(runs: &[StaticRun]) -> f64 {
    runs.iter().map(StaticRun::duration).sum()
}
