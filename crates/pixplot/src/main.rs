//! pixplot: convert a raster image into a G-code program.
//!
//! Traces the dark regions of an image, simplifies and orders the
//! outlines, and writes a program for pen plotters, laser engravers and
//! similar single-tool machines.
//!
//! # Usage
//!
//! ```text
//! pixplot [OPTIONS] <INPUT> <OUTPUT>
//! ```
//!
//! Parameters come from built-in defaults, then an optional `--config`
//! JSON file, then individual flags (highest precedence). Logs go to
//! stderr; stdout carries only `--diagnostics` output.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pixplot_export::DotPolicy;
use pixplot_io::{ConversionConfig, ConversionRequest};
use tracing_subscriber::EnvFilter;

/// Convert a raster image into G-code toolpaths.
///
/// Dark pixels (at or below the threshold) are foreground; their
/// outlines become drawing moves.
#[derive(Parser)]
#[command(name = "pixplot", version)]
struct Cli {
    /// Source image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Destination G-code file. Replaced atomically.
    output: PathBuf,

    /// JSON configuration file (`{"pipeline": {...}, "gcode": {...}}`).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Intensity cutoff, 0-255. Pixels at or below are foreground.
    #[arg(long)]
    threshold: Option<u16>,

    /// Treat pixels brighter than the threshold as foreground.
    #[arg(long, overrides_with = "no_invert")]
    invert: bool,

    /// Treat pixels at or below the threshold as foreground.
    #[arg(long, overrides_with = "invert")]
    no_invert: bool,

    /// Downsample so the longest side is at most this many pixels.
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Gaussian blur sigma applied before thresholding (0 disables).
    #[arg(long)]
    blur_sigma: Option<f32>,

    /// Simplification tolerance in pixels.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Simplify contours and optimize travel.
    #[arg(long, overrides_with = "no_simplify")]
    simplify: bool,

    /// Skip simplification and travel optimization.
    #[arg(long, overrides_with = "simplify")]
    no_simplify: bool,

    /// Trace the inner boundaries of holes.
    #[arg(long, overrides_with = "no_holes")]
    holes: bool,

    /// Do not trace the inner boundaries of holes.
    #[arg(long, overrides_with = "holes")]
    no_holes: bool,

    /// Command that lifts the tool.
    #[arg(long)]
    tool_up: Option<String>,

    /// Command that lowers the tool.
    #[arg(long)]
    tool_down: Option<String>,

    /// Drawing feed rate (units/min).
    #[arg(long)]
    feed_rate: Option<f64>,

    /// Travel feed rate (units/min).
    #[arg(long)]
    travel_feed_rate: Option<f64>,

    /// Dwell after lowering the tool, in milliseconds.
    #[arg(long)]
    dwell_ms: Option<u32>,

    /// Machine units per image pixel.
    #[arg(long)]
    units_per_pixel: Option<f64>,

    /// Added to every X coordinate.
    #[arg(long, allow_negative_numbers = true)]
    offset_x: Option<f64>,

    /// Added to every Y coordinate.
    #[arg(long, allow_negative_numbers = true)]
    offset_y: Option<f64>,

    /// Flip Y so the top of the image is at the highest Y.
    #[arg(long, overrides_with = "no_invert_y")]
    invert_y: bool,

    /// Keep image rows as Y coordinates.
    #[arg(long, overrides_with = "invert_y")]
    no_invert_y: bool,

    /// Drop isolated pixels instead of dabbing a dot.
    #[arg(long, overrides_with = "dab_dots")]
    skip_dots: bool,

    /// Dab a dot for each isolated pixel.
    #[arg(long, overrides_with = "skip_dots")]
    dab_dots: bool,

    /// Prefix the program with comments naming the source and config.
    #[arg(long)]
    comments: bool,

    /// Print pipeline diagnostics as JSON on stdout.
    #[arg(long)]
    diagnostics: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Defaults, overlaid by the config file, overlaid by flags.
    fn conversion_config(&self) -> Result<ConversionConfig, pixplot_io::ConfigFileError> {
        let mut config = match &self.config {
            Some(path) => ConversionConfig::from_json_file(path)?,
            None => ConversionConfig::default(),
        };

        let pipeline = &mut config.pipeline;
        if let Some(threshold) = self.threshold {
            pipeline.threshold = threshold;
        }
        if let Some(invert) = switch(self.invert, self.no_invert) {
            pipeline.invert = invert;
        }
        if let Some(max_dimension) = self.max_dimension {
            pipeline.max_dimension = max_dimension;
        }
        if let Some(sigma) = self.blur_sigma {
            pipeline.blur_sigma = sigma;
        }
        if let Some(tolerance) = self.tolerance {
            pipeline.simplify_tolerance = tolerance;
        }
        if let Some(simplify) = switch(self.simplify, self.no_simplify) {
            pipeline.simplify = simplify;
        }
        if let Some(holes) = switch(self.holes, self.no_holes) {
            pipeline.include_holes = holes;
        }

        let gcode = &mut config.gcode;
        if let Some(ref command) = self.tool_up {
            gcode.tool_up.clone_from(command);
        }
        if let Some(ref command) = self.tool_down {
            gcode.tool_down.clone_from(command);
        }
        if let Some(rate) = self.feed_rate {
            gcode.feed_rate = rate;
        }
        if let Some(rate) = self.travel_feed_rate {
            gcode.travel_feed_rate = rate;
        }
        if let Some(ms) = self.dwell_ms {
            gcode.dwell_ms = ms;
        }
        if let Some(scale) = self.units_per_pixel {
            gcode.units_per_pixel = scale;
        }
        if let Some(x) = self.offset_x {
            gcode.origin_offset.x = x;
        }
        if let Some(y) = self.offset_y {
            gcode.origin_offset.y = y;
        }
        if let Some(invert_y) = switch(self.invert_y, self.no_invert_y) {
            gcode.invert_y = invert_y;
        }
        match switch(self.skip_dots, self.dab_dots) {
            Some(true) => gcode.dot_policy = DotPolicy::Skip,
            Some(false) => gcode.dot_policy = DotPolicy::Dab,
            None => {}
        }

        Ok(config)
    }
}

/// The value of a `--flag` / `--no-flag` pair, if either was given.
///
/// The pair overrides each other, so at most one is set.
const fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Log filter from `RUST_LOG` directives. The `-v` level applies only
/// when `directives` is empty.
fn log_filter(verbose: u8, directives: &str) -> EnvFilter {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives)
}

/// Install a stderr `tracing` subscriber honouring `RUST_LOG`.
fn init_logging(verbose: u8) {
    use tracing_subscriber::prelude::*;

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let env_filter = log_filter(verbose, &directives);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Print `err` and every cause beneath it.
fn print_error_chain(err: &dyn Error) {
    eprintln!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.conversion_config() {
        Ok(config) => config,
        Err(e) => {
            print_error_chain(&e);
            return ExitCode::FAILURE;
        }
    };

    let request = ConversionRequest {
        input: cli.input.clone(),
        output: cli.output.clone(),
        config,
        embed_metadata: cli.comments,
    };

    let summary = match pixplot_io::convert(&request) {
        Ok(summary) => summary,
        Err(e) => {
            print_error_chain(&e);
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!("\n{}", summary.diagnostics.report());

    if cli.diagnostics {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                print_error_chain(&e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv = std::iter::once("pixplot").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_paths_only_gives_defaults() {
        let cli = parse(&["in.png", "out.gcode"]);
        assert_eq!(cli.input, PathBuf::from("in.png"));
        assert_eq!(cli.output, PathBuf::from("out.gcode"));
        let config = cli.conversion_config().unwrap();
        assert_eq!(config, ConversionConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "in.png",
            "out.gcode",
            "--threshold",
            "65",
            "--no-simplify",
            "--tool-up",
            "M5",
            "--offset-x",
            "-10",
            "--invert-y",
            "--skip-dots",
        ]);
        let config = cli.conversion_config().unwrap();
        assert_eq!(config.pipeline.threshold, 65);
        assert!(!config.pipeline.simplify);
        assert_eq!(config.gcode.tool_up, "M5");
        assert!((config.gcode.origin_offset.x + 10.0).abs() < f64::EPSILON);
        assert!(config.gcode.invert_y);
        assert_eq!(config.gcode.dot_policy, DotPolicy::Skip);
    }

    #[test]
    fn out_of_range_threshold_parses_and_is_left_to_validation() {
        let cli = parse(&["in.png", "out.gcode", "--threshold", "300"]);
        let config = cli.conversion_config().unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn negating_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("pixplot.json");
        std::fs::write(
            &config_path,
            r#"{"pipeline": {"invert": true, "simplify": false, "include_holes": false},
                "gcode": {"invert_y": true, "dot_policy": "Skip"}}"#,
        )
        .unwrap();
        let config_arg = config_path.to_str().unwrap();

        let from_file = parse(&["in.png", "out.gcode", "--config", config_arg])
            .conversion_config()
            .unwrap();
        assert!(from_file.pipeline.invert);
        assert!(!from_file.pipeline.simplify);
        assert_eq!(from_file.gcode.dot_policy, DotPolicy::Skip);

        let overridden = parse(&[
            "in.png",
            "out.gcode",
            "--config",
            config_arg,
            "--no-invert",
            "--simplify",
            "--holes",
            "--no-invert-y",
            "--dab-dots",
        ])
        .conversion_config()
        .unwrap();
        assert_eq!(overridden, ConversionConfig::default());
    }

    #[test]
    fn last_of_a_flag_pair_wins() {
        let cli = parse(&["in.png", "out.gcode", "--invert", "--no-invert"]);
        assert!(!cli.conversion_config().unwrap().pipeline.invert);
        let cli = parse(&["in.png", "out.gcode", "--no-invert", "--invert"]);
        assert!(cli.conversion_config().unwrap().pipeline.invert);
    }

    fn max_level(verbose: u8, directives: &str) -> Option<LevelFilter> {
        log_filter(verbose, directives).max_level_hint()
    }

    #[test]
    fn verbosity_sets_level_without_rust_log() {
        assert_eq!(max_level(0, ""), Some(LevelFilter::INFO));
        assert_eq!(max_level(1, ""), Some(LevelFilter::DEBUG));
        assert_eq!(max_level(2, ""), Some(LevelFilter::TRACE));
    }

    #[test]
    fn rust_log_takes_precedence_over_verbosity() {
        assert_eq!(max_level(0, "warn"), Some(LevelFilter::WARN));
        assert_eq!(max_level(1, "error"), Some(LevelFilter::ERROR));
        assert_eq!(max_level(2, "pixplot_io=info"), Some(LevelFilter::INFO));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = parse(&[
            "in.png",
            "out.gcode",
            "--config",
            "/nonexistent/pixplot.json",
        ]);
        assert!(cli.conversion_config().is_err());
    }
}
