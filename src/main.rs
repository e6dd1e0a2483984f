//! CLI entry point for the posting-window tool.
//!
//! Loads a video sample export from a file or URL and ranks the best
//! weekday/hour posting windows, or writes the view heatmap and the
//! per-year publish calendar as CSV.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use posting_windows::{
    fetch::{BasicClient, auth::ApiKey, load_source},
    output::{PostingReport, render_json, write_calendar, write_heatmap, write_windows},
    parser::parse_samples,
    windows::{
        Buckets, PostingWindowScorer, ScorerConfig, VideoSample,
        calendar::{PublishCalendar, available_years},
        heatmap::ViewHeatmap,
        scorer::DEFAULT_PRIOR_WEIGHT,
    },
    zone::TimeZoneSpec,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "posting_windows")]
#[command(about = "Recommend the best weekday/hour windows to publish videos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank posting windows from a JSON or CSV sample export
    Rank {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// IANA time zone (falls back to POSTING_WINDOWS_TZ, then the host zone)
        #[arg(long)]
        tz: Option<String>,

        /// Number of windows to return
        #[arg(short = 'n', long, default_value_t = 3)]
        top_n: usize,

        /// Pseudo-count pulling sparse buckets toward the global mean
        #[arg(long)]
        prior_weight: Option<f64>,

        /// Print the full scored report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Optional: CSV file to write every scored window to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the weekday x hour view heatmap as CSV
    Heatmap {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(long)]
        tz: Option<String>,

        #[arg(short, long, default_value = "heatmap.csv")]
        output: PathBuf,
    },
    /// Write daily publish counts for one year as CSV
    Calendar {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(long)]
        tz: Option<String>,

        /// Year to render (defaults to the newest year in the data)
        #[arg(short, long)]
        year: Option<i32>,

        #[arg(short, long, default_value = "calendar.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/posting_windows.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("posting_windows.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            source,
            tz,
            top_n,
            prior_weight,
            json,
            output,
        } => {
            let zone = resolve_zone(tz)?;
            let prior_weight = match prior_weight {
                Some(w) => w,
                None => env_prior_weight()?,
            };
            let scorer = PostingWindowScorer::new(
                ScorerConfig::default()
                    .with_prior_weight(prior_weight)
                    .with_top_n(top_n),
            )?;

            let samples = load_samples(&source).await?;
            let buckets = Buckets::from_samples(&samples, &zone)
                .context("unable to compute posting-time recommendations")?;
            let windows = scorer.score_windows(&buckets);
            let top_windows = scorer.top_labels(&windows);

            if top_windows.is_empty() {
                info!("No samples to rank");
            }
            for (rank, label) in top_windows.iter().enumerate() {
                info!(rank = rank + 1, window = %label, "Posting window");
            }

            if let Some(path) = output {
                write_windows(&path, &windows)?;
                info!(path = %path.display(), "Scored windows written");
            }

            if json {
                let report = PostingReport {
                    generated_at: Utc::now(),
                    time_zone: zone.to_string(),
                    prior_weight,
                    sample_count: samples.len(),
                    global_mean: buckets.global_mean(),
                    top_windows,
                    windows,
                };
                println!("{}", render_json(&report)?);
            } else {
                println!("{}", top_windows.join(", "));
            }
        }
        Commands::Heatmap { source, tz, output } => {
            let zone = resolve_zone(tz)?;
            let samples = load_samples(&source).await?;
            let buckets = Buckets::from_samples(&samples, &zone)?;
            let heatmap = ViewHeatmap::from_buckets(&buckets);

            write_heatmap(&output, &heatmap)?;
            info!(
                path = %output.display(),
                max_views = heatmap.max_views(),
                "Heatmap written"
            );
        }
        Commands::Calendar {
            source,
            tz,
            year,
            output,
        } => {
            let zone = resolve_zone(tz)?;
            let samples = load_samples(&source).await?;

            let year = match year {
                Some(year) => year,
                None => match available_years(&samples, &zone)?.first() {
                    Some(year) => *year,
                    None => {
                        warn!("No samples found, nothing to write");
                        return Ok(());
                    }
                },
            };

            let calendar = PublishCalendar::for_year(&samples, &zone, year)?;
            write_calendar(&output, &calendar)?;
            info!(
                path = %output.display(),
                year,
                total = calendar.total(),
                "Calendar written"
            );
        }
    }

    Ok(())
}

fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

/// `--tz`, then `POSTING_WINDOWS_TZ`, then the host zone.
fn resolve_zone(tz: Option<String>) -> Result<TimeZoneSpec> {
    let name = tz.or_else(|| std::env::var("POSTING_WINDOWS_TZ").ok());
    let zone = TimeZoneSpec::resolve(name.as_deref())?;
    if zone.is_local() {
        warn!("No time zone given, using the host zone; results depend on where this runs");
    }
    Ok(zone)
}

fn env_prior_weight() -> Result<f64> {
    match std::env::var("POSTING_WINDOWS_PRIOR_WEIGHT") {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("POSTING_WINDOWS_PRIOR_WEIGHT is not a number: {raw:?}")),
        Err(_) => Ok(DEFAULT_PRIOR_WEIGHT),
    }
}

/// Loads and decodes a sample export, sending `SAMPLES_API_KEY` for URLs when set.
#[tracing::instrument(skip_all, fields(source = %source))]
async fn load_samples(source: &str) -> Result<Vec<VideoSample>> {
    let client = BasicClient::new()?;
    let bytes = match std::env::var("SAMPLES_API_KEY") {
        Ok(key) => {
            let client = match std::env::var("SAMPLES_API_KEY_HEADER") {
                Ok(header) => ApiKey::new(client, &header, &key)?,
                Err(_) => ApiKey::bearer(client, &key)?,
            };
            load_source(&client, source).await?
        }
        Err(_) => load_source(&client, source).await?,
    };

    let samples = parse_samples(&bytes)?;
    info!(samples = samples.len(), "Samples loaded");
    Ok(samples)
}
