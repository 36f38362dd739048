/// Version injected at compile time via FARGATE_SD_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("FARGATE_SD_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fargate_sd::config::{Config, DEFAULT_INTERVAL_SECS, METRICS_PORT_VAR};
use fargate_sd::ecs::client::EcsClient;
use fargate_sd::lifecycle::{spawn_signal_handler, Lifecycle};
use fargate_sd::scraper::Scraper;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Find the private IP addresses and ports of all scrape-able services running in an ECS cluster.
#[derive(Parser, Debug)]
#[command(name = "fargate-sd", version = VERSION, about, long_about = None)]
struct Args {
    /// The name of the ECS cluster to search
    #[arg(short = 'C', long)]
    cluster_name: String,

    /// The interval (in seconds) at which to scrape tasks
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Variable a task definition's container environment must set for its
    /// tasks to be scraped (repeatable)
    #[arg(long = "required-env-var", value_name = "NAME", default_value = METRICS_PORT_VAR)]
    required_env_vars: Vec<String>,

    /// AWS region (defaults to the AWS configuration chain)
    #[arg(long)]
    region: Option<String>,

    /// Override the ECS API endpoint
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// The name of the file to write results to
    filename: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// AWS client crates are noisy below WARN
const QUIET_TARGETS: &[&str] = &[
    "aws_config=warn",
    "aws_smithy_runtime=warn",
    "aws_sdk_ecs=warn",
    "hyper=warn",
];

/// The level and [`QUIET_TARGETS`] are defaults; `RUST_LOG` directives come
/// after them so a user directive for the same target wins.
fn build_filter(level: Level, rust_log: Option<&str>) -> EnvFilter {
    let mut directives = vec![LevelFilter::from_level(level).to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|directive| directive.to_string()));
    if let Some(rust_log) = rust_log.map(str::trim).filter(|value| !value.is_empty()) {
        directives.push(rust_log.to_string());
    }
    EnvFilter::builder().parse_lossy(directives.join(","))
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let filter = build_filter(
        tracing_level,
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
    );

    let (non_blocking, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .with_thread_names(true)
        .init();

    tracing::info!("fargate-sd {} started with log level: {:?}", VERSION, level);
    if let Some(path) = log_file {
        tracing::info!("Log file: {:?}", path);
    }

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_deref())?;

    let config = Config::new(
        args.cluster_name,
        args.filename,
        args.interval,
        args.required_env_vars,
    )?;
    tracing::debug!("Configuration: {}", serde_json::to_string(&config)?);

    let client = EcsClient::new(args.region.as_deref(), args.endpoint_url.as_deref())
        .await
        .context("Failed to initialize ECS client")?;

    let lifecycle = Arc::new(Lifecycle::new());
    spawn_signal_handler(lifecycle.clone())?;

    Scraper::new(client, &config).run(&lifecycle).await;

    Ok(())
}
