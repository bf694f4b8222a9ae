//! Progress reporting.
//!
//! Sampling a long video performs one seek per timestamp, and rendering a
//! trimmed video decodes every frame, so both report progress through a
//! [`ProgressCallback`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillcut::{ProgressCallback, ProgressInfo, SamplingOptions};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = SamplingOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Seeking to sample timestamps and hashing frames.
    FrameSampling,
    /// Re-encoding the trimmed video.
    Reconstruction,
}

/// A snapshot of progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items (samples / frames) have been processed so far.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Source timestamp of the item just processed.
    pub current_timestamp: Option<Duration>,
}

/// Receives progress updates.
///
/// Callbacks observe the operation; they cannot stop it.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` items and once when the operation ends.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks progress timing and fires the callback in batches.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed item.
    pub(crate) fn advance(&mut self, timestamp: Option<Duration>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(timestamp);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, timestamp: Option<Duration>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_timestamp: timestamp,
        });
    }
}
