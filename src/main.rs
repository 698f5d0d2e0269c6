//! CLI entry point for the AQI station pipeline.
//!
//! Provides subcommands for fetching station readings from the WAQI API and
//! for summarizing a previously exported station table.

use anyhow::{Context, Result};
use aqi_pipeline::analyzers::build_report;
use aqi_pipeline::{
    config::PipelineConfig,
    infra::waqi::WaqiClient,
    model::{Credential, GeoBox},
    output::{append_records, load_records, print_json, print_pretty},
    pipeline::{AcquireOptions, acquire},
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "aqi_pipeline")]
#[command(about = "Fetch and summarize air-quality station readings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch readings for every station inside the bounding box
    Fetch {
        /// JSON config file (base URL, bounds, request interval, timeouts)
        #[arg(short, long)]
        config: Option<String>,

        /// WAQI API token (defaults to $WAQI_TOKEN)
        #[arg(short, long)]
        token: Option<String>,

        /// Bounding box as south,west,north,east
        #[arg(short, long)]
        bounds: Option<GeoBox>,

        /// Pause between station detail requests, in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// CSV file to append the station table to
        #[arg(short, long)]
        output: Option<String>,

        /// Number of stations in the top-N ranking
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the aggregate report as JSON
        #[arg(short, long, default_value_t = false)]
        report: bool,
    },
    /// Print the aggregate report for a station table
    Analyze {
        /// CSV file written by `fetch --output`
        #[arg(short, long)]
        input: String,

        /// Number of stations in the top-N ranking
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aqi_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aqi_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            config,
            token,
            bounds,
            interval_ms,
            output,
            top,
            report,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(bounds) = bounds {
                config.bounds = bounds;
            }
            if let Some(interval_ms) = interval_ms {
                config.request_interval_ms = interval_ms;
            }

            let token = token
                .or_else(|| std::env::var("WAQI_TOKEN").ok())
                .map(Credential::new)
                .unwrap_or_default();

            let client = WaqiClient::from_config(&config)?;
            let options = AcquireOptions::from(&config);

            info!(
                base_url = %config.base_url,
                bounds = %config.bounds,
                interval_ms = config.request_interval_ms,
                "Starting acquisition"
            );
            let readings = acquire(&client, &config.bounds, &token, &options)
                .await
                .context("acquisition failed")?;

            info!(stations = readings.len(), "Retrieved station data");
            if readings.is_empty() {
                warn!("No stations returned a usable reading");
            }
            print_pretty(&readings);

            if let Some(path) = output {
                append_records(&path, &readings)?;
            }
            if report {
                print_json(&build_report(&readings, top))?;
            }
        }
        Commands::Analyze { input, top } => {
            let readings = load_records(&input)?;
            info!(stations = readings.len(), input = %input, "Loaded station table");
            print_json(&build_report(&readings, top))?;
        }
    }

    Ok(())
}
