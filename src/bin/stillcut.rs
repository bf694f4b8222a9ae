use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde_json::json;
use stillcut::{
    DEFAULT_MIN_RUN_LENGTH, DEFAULT_SAMPLE_INTERVAL, EncodeOptions,
    FfmpegLogLevel, ProgressCallback, ProgressInfo, Reconstructor, SamplingOptions, TrimOptions,
    VideoCodec, compare_videos, find_static_runs,
    report::{MatchTable, RULE_WIDTH, RunTable, SegmentTable, format_timestamp, rule},
    trim_static_frames,
};

const CLI_AFTER_HELP: &str = "Examples:\n  stillcut duplicates lecture.mp4 --json\n  stillcut matches intro.mp4 episode.mp4\n  stillcut trim slides.mp4 slides_trimmed.mp4 --threshold 2 --progress\n  stillcut completions zsh > _stillcut";

#[derive(Debug, Parser)]
#[command(
    name = "stillcut",
    version,
    about = "Find, compare, and shrink static frames in videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while sampling and rendering.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report runs of identical consecutive frames (alias: static).
    #[command(
        about = "Report static frame runs",
        visible_alias = "static",
        after_help = "Examples:\n  stillcut duplicates lecture.mp4\n  stillcut duplicates a.mp4 b.mp4 --interval 0.25 --min-run 5 --json"
    )]
    Duplicates {
        /// Input video paths.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Seconds between samples.
        #[arg(long, default_value = "0.1", value_parser = parse_interval)]
        interval: Duration,
        /// Minimum number of identical consecutive samples in a run.
        #[arg(long, default_value_t = DEFAULT_MIN_RUN_LENGTH)]
        min_run: usize,
        /// Output the report as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Find frames shared by two videos.
    #[command(
        about = "Find frames present in both videos",
        after_help = "Examples:\n  stillcut matches intro.mp4 episode.mp4\n  stillcut matches a.mp4 b.mp4 --interval 1 --json"
    )]
    Matches {
        /// Video whose frames are looked up.
        first: PathBuf,
        /// Video searched for each frame.
        second: PathBuf,
        /// Seconds between samples.
        #[arg(long, default_value = "0.5", value_parser = parse_interval)]
        interval: Duration,
        /// Output the matches as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Shrink long static runs and re-encode the video.
    #[command(
        about = "Shrink long static runs",
        after_help = "Examples:\n  stillcut trim slides.mp4 trimmed.mp4\n  stillcut trim slides.mp4 trimmed.mkv --threshold 2.5 --crf 20 --preset slow --codec h265"
    )]
    Trim {
        /// Input video path.
        input: PathBuf,
        /// Output video path; the container follows the extension.
        output: PathBuf,
        /// Runs longer than this many seconds are cut in half.
        #[arg(long, default_value_t = 1.0)]
        threshold: f64,
        /// Constant Rate Factor for the encoder.
        #[arg(long, default_value_t = 23)]
        crf: u32,
        /// Encoder preset.
        #[arg(long, default_value = "medium")]
        preset: String,
        /// Output codec (h264, h265, mpeg4).
        #[arg(long, default_value = "h264")]
        codec: VideoCodec,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions { shell: Shell },
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("not a number: {value}"))?;
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(format!("interval must be a positive number of seconds, got {value}"));
    }

    let interval = Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("interval is too large: {value}"))?;
    if interval.is_zero() {
        return Err(format!("interval is below one nanosecond: {value}"));
    }
    Ok(interval)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        stillcut::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

/// Drives an indicatif bar from library progress reports.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(bars: &MultiProgress, message: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = bars.add(ProgressBar::new(0));
        let style = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_message(message.to_string());
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

fn sampling_options(
    global: &GlobalOptions,
    bars: &MultiProgress,
    interval: Duration,
    message: &str,
) -> Result<(SamplingOptions, Option<Arc<BarProgress>>), Box<dyn std::error::Error>> {
    let mut options = SamplingOptions::new().with_interval(interval);
    let bar = if global.progress {
        let bar = Arc::new(BarProgress::new(bars, message)?);
        options = options.with_progress(bar.clone()).with_batch_size(10);
        Some(bar)
    } else {
        None
    };
    Ok((options, bar))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;
    let bars = MultiProgress::new();

    match cli.command {
        Commands::Duplicates {
            inputs,
            interval,
            min_run,
            json,
        } => {
            let mut reports = Vec::with_capacity(inputs.len());

            for input in &inputs {
                let (options, bar) = sampling_options(&cli.global, &bars, interval, "sampling")?;
                let report = find_static_runs(input, &options, min_run)?;
                if let Some(bar) = bar {
                    bar.finish();
                }

                if json {
                    reports.push(json!({
                        "input": input.display().to_string(),
                        "duration_seconds": report.sampled.duration.as_secs_f64(),
                        "samples": report.sampled.samples.len(),
                        "resolved_samples": report.sampled.resolved_count(),
                        "total_static_seconds": report.total_static_time(),
                        "runs": report.runs.iter().map(|run| json!({
                            "start": run.start_time,
                            "end": run.end_time,
                            "duration": run.duration(),
                            "frames": run.count,
                            "hash": run.hash.to_hex(),
                        })).collect::<Vec<_>>(),
                    }));
                    continue;
                }

                println!("{}", rule('=', RULE_WIDTH));
                println!("{}", input.display().to_string().bold());
                println!("{}", rule('=', RULE_WIDTH));
                println!(
                    "Sampled {} frames every {}s ({} resolved)",
                    report.sampled.samples.len(),
                    interval.as_secs_f64(),
                    report.sampled.resolved_count()
                );

                if report.runs.is_empty() {
                    println!("{}", "No static runs found: all frames are unique.".green());
                } else {
                    println!(
                        "Found {} static run(s), {:.2}s of static frames\n",
                        report.runs.len(),
                        report.total_static_time()
                    );
                    print!("{}", RunTable(&report.runs));
                }
                println!();
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
        Commands::Matches {
            first,
            second,
            interval,
            json,
        } => {
            let (options, bar) = sampling_options(&cli.global, &bars, interval, "sampling")?;
            let comparison = compare_videos(&first, &second, &options)?;
            if let Some(bar) = bar {
                bar.finish();
            }

            if json {
                let payload = json!({
                    "first": {
                        "input": first.display().to_string(),
                        "duration_seconds": comparison.first.duration.as_secs_f64(),
                    },
                    "second": {
                        "input": second.display().to_string(),
                        "duration_seconds": comparison.second.duration.as_secs_f64(),
                        "unique_frames": comparison.second.unique_hash_count(),
                    },
                    "matches": comparison.matches.iter().map(|found| json!({
                        "first_time": found.first_time,
                        "second_time": found.second_time,
                        "hash": found.hash.to_hex(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            println!(
                "{}: {:.2}s",
                first.display(),
                comparison.first.duration.as_secs_f64()
            );
            println!(
                "{}: {:.2}s ({} unique frames)",
                second.display(),
                comparison.second.duration.as_secs_f64(),
                comparison.second.unique_hash_count()
            );
            println!();

            if comparison.matches.is_empty() {
                println!("{}", "No matching frames found.".yellow());
            } else {
                println!("Found {} matching frame(s)\n", comparison.matches.len());
                let first_label = first.display().to_string();
                let second_label = second.display().to_string();
                print!(
                    "{}",
                    MatchTable {
                        matches: &comparison.matches,
                        first_label: &first_label,
                        second_label: &second_label,
                    }
                );
            }
        }
        Commands::Trim {
            input,
            output,
            threshold,
            crf,
            preset,
            codec,
        } => {
            ensure_writable_path(&output, cli.global.overwrite)?;

            let trim = TrimOptions::new().long_threshold(threshold);
            trim.validate()?;

            let (sampling, sampling_bar) =
                sampling_options(&cli.global, &bars, DEFAULT_SAMPLE_INTERVAL, "sampling")?;

            let encode = EncodeOptions::default().codec(codec).crf(crf).preset(preset);
            let mut reconstructor = Reconstructor::new(encode);
            let render_bar = if cli.global.progress {
                let bar = Arc::new(BarProgress::new(&bars, "rendering")?);
                reconstructor = reconstructor.with_progress(bar.clone(), 25);
                Some(bar)
            } else {
                None
            };

            let outcome = trim_static_frames(&input, &output, &sampling, &trim, &reconstructor)?;
            for bar in [sampling_bar, render_bar].into_iter().flatten() {
                bar.finish();
            }

            let plan = &outcome.plan;
            if outcome.new_duration.is_none() {
                println!(
                    "{}",
                    format!("No trimming needed: no static run longer than {threshold}s.").green()
                );
                return Ok(());
            }

            println!("Static runs longer than {threshold}s:");
            for run in &plan.long_runs {
                println!(
                    "  {} - {}: {:.2}s -> {:.2}s",
                    format_timestamp(run.start_time),
                    format_timestamp(run.end_time),
                    run.duration(),
                    run.duration() * trim.shrink_factor
                );
            }
            println!();
            print!("{}", SegmentTable(&plan.segments));
            println!();

            if cli.global.verbose
                && let Some(stats) = outcome.render
            {
                eprintln!(
                    "encoded {} frame(s), dropped {}",
                    stats.frames_written, stats.frames_dropped
                );
            }

            println!("Original duration: {:.2}s", plan.original_duration);
            println!("New duration:      {:.2}s", outcome.new_duration.unwrap_or_default());
            println!(
                "Time saved:        {:.2}s ({:.1}%)",
                outcome.time_saved(),
                outcome.percent_saved()
            );
            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Wrote {}", output.display()).green()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stillcut", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use std::time::Duration;

    use indicatif::{MultiProgress, ProgressDrawTarget};
    use stillcut::{OperationType, ProgressCallback, ProgressInfo};

    use super::{BarProgress, Cli, Commands, parse_interval};

    fn report(operation: OperationType, current: u64, total: u64) -> ProgressInfo {
        ProgressInfo {
            operation,
            current,
            total: Some(total),
            percentage: None,
            elapsed: Duration::ZERO,
            estimated_remaining: None,
            current_timestamp: None,
        }
    }

    #[test]
    fn sampling_and_render_bars_stay_separate() {
        let bars = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let sampling = BarProgress::new(&bars, "sampling").unwrap();
        let rendering = BarProgress::new(&bars, "rendering").unwrap();

        sampling.on_progress(&report(OperationType::FrameSampling, 40, 40));
        sampling.finish();
        rendering.on_progress(&report(OperationType::Reconstruction, 12, 75));

        assert!(sampling.bar.is_finished());
        assert_eq!(sampling.bar.position(), 40);
        assert!(!rendering.bar.is_finished());
        assert_eq!(rendering.bar.position(), 12);
        assert_eq!(rendering.bar.length(), Some(75));
    }

    #[test]
    fn parse_interval_accepts_positive_seconds() {
        assert_eq!(parse_interval("0.5"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_interval(" 2 "), Ok(Duration::from_secs(2)));
        assert_eq!(parse_interval("1e-9"), Ok(Duration::from_nanos(1)));
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("-1").is_err());
        assert!(parse_interval("inf").is_err());
        assert!(parse_interval("fast").is_err());
        assert!(parse_interval("1e20").is_err());
        assert!(parse_interval("1e-10").is_err());
    }

    #[test]
    fn parse_interval_rejects_unrepresentable_values() {
        let too_small = parse_interval("1e-10").unwrap_err();
        assert!(too_small.contains("below one nanosecond"), "{too_small}");

        let too_large = parse_interval("1e20").unwrap_err();
        assert!(too_large.contains("too large"), "{too_large}");
    }

    #[test]
    fn static_alias_and_defaults() {
        let cli = Cli::try_parse_from(["stillcut", "static", "a.mp4", "b.mp4"]).unwrap();
        match cli.command {
            Commands::Duplicates {
                inputs,
                interval,
                min_run,
                json,
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(interval, stillcut::DEFAULT_SAMPLE_INTERVAL);
                assert_eq!(min_run, 3);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn matches_default_interval() {
        let cli = Cli::try_parse_from(["stillcut", "matches", "a.mp4", "b.mp4"]).unwrap();
        match cli.command {
            Commands::Matches { interval, .. } => {
                assert_eq!(interval, stillcut::DEFAULT_MATCH_INTERVAL);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn oversized_interval_is_a_usage_error() {
        let result = Cli::try_parse_from(["stillcut", "duplicates", "a.mp4", "--interval", "1e20"]);
        assert!(result.is_err());
    }

    #[test]
    fn trim_parses_codec_and_global_flags() {
        let cli = Cli::try_parse_from([
            "stillcut", "trim", "in.mp4", "out.mp4", "--codec", "hevc", "--overwrite",
        ])
        .unwrap();
        assert!(cli.global.overwrite);
        match cli.command {
            Commands::Trim { codec, crf, threshold, .. } => {
                assert_eq!(codec, stillcut::VideoCodec::H265);
                assert_eq!(crf, 23);
                assert_eq!(threshold, 1.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn duplicates_requires_an_input() {
        assert!(Cli::try_parse_from(["stillcut", "duplicates"]).is_err());
    }
}
