//! Sampling and trimming configuration.
//!
//! [`SamplingOptions`] threads the sampling interval and progress callback
//! through the sampling pass; [`TrimOptions`] carries the thresholds used by
//! the segment planner.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use stillcut::{SamplingOptions, TrimOptions};
//!
//! let sampling = SamplingOptions::new()
//!     .with_interval(Duration::from_millis(500))
//!     .with_batch_size(25);
//! let trim = TrimOptions::new().long_threshold(2.0).shrink_factor(0.25);
//! assert!(trim.validate().is_ok());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::error::StillcutError;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Interval between samples used by the static-frame and trim workflows.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Interval between samples used when comparing two videos.
pub const DEFAULT_MATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Minimum number of identical consecutive samples that make a static run.
pub const DEFAULT_MIN_RUN_LENGTH: usize = 3;

/// Settings for one sampling pass.
#[derive(Clone)]
pub struct SamplingOptions {
    pub(crate) interval: Duration,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
}

impl Debug for SamplingOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplingOptions")
            .field("interval", &self.interval)
            .field("has_progress", &true)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplingOptions {
    /// Defaults: 100 ms interval, no progress callback, batch size 1.
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_SAMPLE_INTERVAL,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Set the time between consecutive samples.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fire the progress callback every `size` samples. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The configured sampling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Thresholds for shrinking static runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimOptions {
    /// Runs must last strictly longer than this many seconds to be shrunk.
    pub long_threshold: f64,
    /// Fraction of a qualifying run's duration that is kept.
    pub shrink_factor: f64,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            long_threshold: 1.0,
            shrink_factor: 0.5,
        }
    }
}

impl TrimOptions {
    /// Defaults: runs longer than 1 second are cut in half.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum run duration, in seconds.
    pub fn long_threshold(mut self, seconds: f64) -> Self {
        self.long_threshold = seconds;
        self
    }

    /// Set the fraction of each qualifying run that survives.
    pub fn shrink_factor(mut self, factor: f64) -> Self {
        self.shrink_factor = factor;
        self
    }

    /// Check that the thresholds describe a valid plan.
    ///
    /// # Errors
    ///
    /// [`StillcutError::InvalidTrimOptions`] for a negative or non-finite
    /// threshold, or a shrink factor outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), StillcutError> {
        if !self.long_threshold.is_finite() || self.long_threshold < 0.0 {
            return Err(StillcutError::InvalidTrimOptions(format!(
                "long threshold must be a non-negative number of seconds, got {}",
                self.long_threshold
            )));
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor <= 1.0) {
            return Err(StillcutError::InvalidTrimOptions(format!(
                "shrink factor must be in (0, 1], got {}",
                self.shrink_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_defaults() {
        let options = SamplingOptions::new();
        assert_eq!(options.interval(), Duration::from_millis(100));
        let debug = format!("{options:?}");
        assert!(debug.contains("batch_size: 1"));
    }

    #[test]
    fn batch_size_clamps_zero() {
        let options = SamplingOptions::new().with_batch_size(0);
        assert!(format!("{options:?}").contains("batch_size: 1"));
    }

    #[test]
    fn trim_options_validation() {
        assert!(TrimOptions::new().validate().is_ok());
        assert!(TrimOptions::new().shrink_factor(1.0).validate().is_ok());
        assert!(TrimOptions::new().long_threshold(0.0).validate().is_ok());
        assert!(TrimOptions::new().shrink_factor(0.0).validate().is_err());
        assert!(TrimOptions::new().shrink_factor(1.5).validate().is_err());
        assert!(TrimOptions::new().shrink_factor(f64::NAN).validate().is_err());
        assert!(TrimOptions::new().long_threshold(-1.0).validate().is_err());
    }
}
