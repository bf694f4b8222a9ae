//! FFmpeg library setup and console verbosity.
//!
//! FFmpeg prints its own warnings to stderr independently of the Rust
//! [`log`](https://crates.io/crates/log) facade. Sampling seeks thousands of
//! times per video, so the decoder chatter adds up quickly; use
//! [`set_ffmpeg_log_level`] to quiet it.
//!
//! # Example
//!
//! ```no_run
//! use stillcut::FfmpegLogLevel;
//!
//! let level: FfmpegLogLevel = "error".parse().unwrap();
//! stillcut::set_ffmpeg_log_level(level);
//! ```

use std::str::FromStr;
use std::sync::Once;

use ffmpeg_next::util::log::Level;

use crate::error::StillcutError;

static INIT: Once = Once::new();

/// FFmpeg internal log verbosity level, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Unrecoverable errors that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Extremely verbose tracing.
    Trace,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "panic" => Ok(FfmpegLogLevel::Panic),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            "trace" => Ok(FfmpegLogLevel::Trace),
            other => Err(format!("unknown FFmpeg log level: {other}")),
        }
    }
}

/// Set the FFmpeg internal log verbosity level.
///
/// This controls what FFmpeg prints to stderr. It does not affect `log`
/// crate output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Initialise the FFmpeg libraries once per process.
pub(crate) fn initialize() -> Result<(), StillcutError> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = ffmpeg_next::init();
    });
    result.map_err(StillcutError::from)
}
