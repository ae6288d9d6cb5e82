// fvl/src/main.rs
use std::fs;
use std::process;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use fvl_common::config::{Config, DEFAULT_VIEW_VERSION};
use fvl_common::error::Result as fvlResult;
use fvl_common::platform::PlatformTarget;
use fvl_common::version::{EnvVersion, FirstAvailable, StaticVersion};
use fvl_core::ViewSupervisor;
use fvl_net::HttpFetcher;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::CliArgs;

fn init_logging(config: &Config, verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let max_log_level = level_filter.into_level().unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("FVL_LOG")
        .from_env_lossy();

    let log_dir = config.logs_dir();
    if verbose == 0 {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Warning:".yellow().bold(),
            log_dir.display(),
            e
        );
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "fvl.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_writer = std::io::stderr.with_max_level(max_log_level);
    let file_writer = non_blocking_appender.with_max_level(max_log_level);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr_writer.and(file_writer))
        .with_ansi(true)
        .without_time()
        .try_init();

    Box::leak(Box::new(guard)); // Keep guard alive

    debug!(
        "Verbose logging enabled. Writing logs to: {}/fvl.log",
        log_dir.display()
    );
}

#[tokio::main]
async fn main() -> fvlResult<()> {
    let cli_args = CliArgs::parse();

    let version_provider = FirstAvailable(vec![
        Box::new(EnvVersion::new("FLET_VERSION")),
        Box::new(StaticVersion(DEFAULT_VIEW_VERSION.to_string())),
    ]);
    let config = match Config::load(&version_provider) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: Could not load config: {:#}", "Error".red().bold(), e);
            process::exit(1);
        }
    };

    init_logging(&config, cli_args.verbose);

    let platform = match PlatformTarget::current() {
        Ok(platform) => platform,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            process::exit(1);
        }
    };
    debug!("Host platform: {}", platform);

    let fetcher = Arc::new(HttpFetcher::new().with_progress(true));
    let supervisor = ViewSupervisor::new(config, platform, fetcher);

    if let Err(e) = cli_args.command.run(&supervisor).await {
        error!("Command failed: {:#}", e);
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }

    debug!("Command completed successfully.");
    Ok(())
}
