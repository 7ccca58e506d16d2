//! CLI entry point for the weekly age-group report.
//!
//! Downloads the MinCiencia age-group series, buckets it into Sunday-started
//! weeks and writes a full and a reduced CSV per source into a directory
//! named after today's date.

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use etario_semanal::error::PipelineError;
use etario_semanal::fetch::BasicClient;
use etario_semanal::output::print_json;
use etario_semanal::pipeline::run_source;
use etario_semanal::source::Source;
use etario_semanal::weeks::WeekScheme;
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "etario_semanal")]
#[command(about = "Weekly COVID-19 age-group reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the weekly tables for one or both sources
    Run {
        /// Only process this source (default: all, in order)
        #[arg(short, long, value_enum)]
        source: Option<Source>,

        /// Read this file or URL instead of the source's published CSV
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: Option<String>,

        /// Root under which `<source>/<YYYYMMDD>/` directories are created
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Week numbering used to group days
        #[arg(short, long, value_enum, default_value_t = WeekScheme::Legacy)]
        week_scheme: WeekScheme,
    },
    /// List the known sources and their age-group tables
    Sources,
}

#[derive(Serialize)]
struct SourceInfo {
    source: Source,
    url: &'static str,
    output: &'static str,
    age_groups: Vec<(&'static str, String)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/etario_semanal.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("etario_semanal.log"));

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
        Commands::Run {
            source,
            input,
            output_dir,
            week_scheme,
        } => {
            let sources = match source {
                Some(source) => vec![source],
                None if input.is_some() => return Err(PipelineError::InputWithoutSource.into()),
                None => Source::ALL.to_vec(),
            };

            let client = BasicClient::new();
            let today = Local::now().date_naive();

            for source in sources {
                // Sources are independent: an earlier one's files stay if a later one fails.
                if let Err(e) = run_source(
                    &client,
                    source,
                    input.as_deref(),
                    &output_dir,
                    today,
                    week_scheme,
                )
                .await
                {
                    error!(source = %source, error = %e, "Source failed");
                    return Err(e);
                }
            }

            info!(output_dir = %output_dir.display(), "All sources written");
        }
        Commands::Sources => {
            for source in Source::ALL {
                let info = SourceInfo {
                    source,
                    url: source.url(),
                    output: source.dir_name(),
                    age_groups: source
                        .age_map()
                        .iter()
                        .map(|(raw, bucket)| (*raw, bucket.to_string()))
                        .collect(),
                };
                print_json(&info)?;
            }
        }
    }

    Ok(())
}
