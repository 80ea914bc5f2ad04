//! Heart-rate threshold minutes CLI
//!
//! Minutes per day at or above a heart-rate threshold, from Apple Health or
//! Fitbit exports.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hr_threshold_minutes::{
    config::Config,
    core::{
        attribute_with_gap_threshold, Attribution, AttributionPolicy, DailyReport, ReportFormat,
        TimeWindow,
    },
    source::{FitbitExportSource, HealthExportSource, SampleSource},
    VERSION,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Large gaps printed individually before summarizing the rest.
const LARGE_GAPS_SHOWN: usize = 3;

#[derive(Parser)]
#[command(name = "hr-minutes")]
#[command(version = VERSION)]
#[command(
    about = "Minutes per day at or above a heart-rate threshold",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an Apple Health export.xml
    #[command(after_help = "Example:\n  hr-minutes apple --start \"2025-11-10 10:00:00\" --end \"2025-12-01 23:59:00\"\n\nWindow bounds are UTC.")]
    Apple {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Path to the Apple Health export.xml file
        #[arg(long)]
        xml_file: Option<PathBuf>,
    },

    /// Analyze a directory of Fitbit heart_rate-*.json files
    #[command(after_help = "Example:\n  hr-minutes fitbit --start \"2025-11-12 00:00:00\" --end \"2025-11-15 23:59:59\" --min-bpm 150\n\nFitbit timestamps carry no timezone. Give the window in the same local\ntime your Fitbit data was recorded in.")]
    Fitbit {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Path to the Fitbit exports directory
        #[arg(long)]
        exports_dir: Option<PathBuf>,

        /// Drop readings below this confidence (0-3)
        #[arg(long)]
        min_confidence: Option<i64>,
    },

    /// Show configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,

        /// Use this config file instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct AnalysisArgs {
    /// Start timestamp ("YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DDTHH:MM:SSZ")
    #[arg(long)]
    start: String,

    /// End timestamp ("YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DDTHH:MM:SSZ")
    #[arg(long)]
    end: String,

    /// Minimum BPM threshold [default: 140]
    #[arg(long)]
    min_bpm: Option<u32>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Log skipped records and other details
    #[arg(long, short)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Apple { analysis, .. } | Commands::Fitbit { analysis, .. } => {
                analysis.verbose
            }
            Commands::Config { .. } => false,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.command.verbose());

    let result = match cli.command {
        Commands::Apple { analysis, xml_file } => cmd_apple(&analysis, xml_file),
        Commands::Fitbit {
            analysis,
            exports_dir,
            min_confidence,
        } => cmd_fitbit(&analysis, exports_dir, min_confidence),
        Commands::Config { init, config } => cmd_config(init, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Config::load().context("loading config"),
    }
}

fn cmd_apple(args: &AnalysisArgs, xml_file: Option<PathBuf>) -> Result<()> {
    let window = TimeWindow::parse(&args.start, &args.end)?;
    let config = load_config(args.config.as_ref())?;

    let source = HealthExportSource::new(xml_file.unwrap_or(config.apple_health.xml_file.clone()));
    run_analysis(&source, &window, &config.apple_health.policy, args, &config)
}

fn cmd_fitbit(
    args: &AnalysisArgs,
    exports_dir: Option<PathBuf>,
    min_confidence: Option<i64>,
) -> Result<()> {
    let window = TimeWindow::parse(&args.start, &args.end)?;
    let config = load_config(args.config.as_ref())?;

    let min_confidence = min_confidence.unwrap_or(config.fitbit.min_confidence);
    if !(0..=3).contains(&min_confidence) {
        bail!("--min-confidence must be between 0 and 3, got {min_confidence}");
    }

    let source = FitbitExportSource::new(exports_dir.unwrap_or(config.fitbit.exports_dir.clone()))
        .with_min_confidence(min_confidence);
    run_analysis(&source, &window, &config.fitbit.policy, args, &config)
}

fn run_analysis(
    source: &dyn SampleSource,
    window: &TimeWindow,
    policy: &AttributionPolicy,
    args: &AnalysisArgs,
    config: &Config,
) -> Result<()> {
    let min_bpm = f64::from(args.min_bpm.unwrap_or(config.min_bpm));

    tracing::info!("Analyzing {} heart rate data", source.kind());
    tracing::info!("Looking for heart rate >= {min_bpm} BPM");
    tracing::info!("Time range: {window}");

    let outcome = source
        .load(window)
        .with_context(|| format!("reading {} export", source.kind()))?;
    tracing::debug!("{}", outcome.stats.summary());
    tracing::info!("Total records in time range: {}", outcome.samples.len());

    if outcome.is_empty() && args.format == ReportFormat::Text {
        println!("No heart rate data found in the specified time range.");
        return Ok(());
    }

    tracing::info!(
        "Analyzing {} records for ALL time >= {min_bpm} BPM...",
        outcome.samples.len()
    );
    let attribution = attribute_with_gap_threshold(
        &outcome.samples,
        min_bpm,
        policy,
        config.large_gap_threshold.as_secs_f64(),
    );
    log_attribution(&attribution, min_bpm);

    let report = DailyReport::new(&attribution.daily_minutes, window, min_bpm);
    let rendered = report.render(args.format).context("rendering report")?;
    println!("{}", rendered.trim_end());
    Ok(())
}

fn log_attribution(attribution: &Attribution, min_bpm: f64) {
    let gaps = &attribution.large_gaps;
    if !gaps.is_empty() {
        tracing::info!(
            "Found {} gaps > 1 minute between high BPM readings:",
            gaps.len()
        );
        for gap in gaps.iter().take(LARGE_GAPS_SHOWN) {
            tracing::info!(
                "  {} -> {} ({:.1} min, HR: {} -> {})",
                gap.from.format("%H:%M:%S"),
                gap.to.format("%H:%M:%S"),
                gap.gap_seconds / 60.0,
                gap.from_bpm,
                gap.to_bpm
            );
        }
        if gaps.len() > LARGE_GAPS_SHOWN {
            tracing::info!("  ... and {} more gaps", gaps.len() - LARGE_GAPS_SHOWN);
        }
    }

    tracing::info!(
        "Found {} readings >= {min_bpm} BPM",
        attribution.qualifying_samples
    );
    tracing::info!(
        "Total time at >= {min_bpm} BPM: {:.1} minutes ({:.0} seconds)",
        attribution.total_minutes(),
        attribution.total_seconds
    );
}

fn cmd_config(init: bool, path: Option<PathBuf>) -> Result<()> {
    let config_path = path.unwrap_or_else(Config::config_path);

    if init {
        if config_path.exists() {
            println!("Config file already exists: {config_path:?}");
        } else {
            Config::default()
                .save_to(&config_path)
                .with_context(|| format!("writing {}", config_path.display()))?;
            println!("Wrote default configuration to {config_path:?}");
        }
        println!();
    }

    let config = Config::load_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {config_path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
