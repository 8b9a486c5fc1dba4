mod platform;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use platform::config::{AppConfig, ConfigOverrides};
use platform::logging::LogDestination;

/// Clone a website through the generation backend and inspect the result.
#[derive(Parser, Debug)]
#[command(name = "cloner", version)]
struct Cli {
    /// URL to clone as soon as the session starts.
    url: Option<String>,
    /// RON config file (defaults to ./cloner.ron when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the cloning backend.
    #[arg(long)]
    backend_url: Option<String>,
    /// Directory downloads are written to.
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Give up on a clone after this many seconds (default: wait indefinitely).
    #[arg(long)]
    request_timeout_secs: Option<u64>,
    /// Where log output goes.
    #[arg(long, value_enum)]
    log: Option<LogDestination>,
    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading config")?;
    config.apply(ConfigOverrides {
        backend_url: cli.backend_url,
        download_dir: cli.download_dir,
        request_timeout_secs: cli.request_timeout_secs,
        log_destination: cli.log,
        verbose: cli.verbose,
    });
    let level = config.validate().context("invalid config")?;

    platform::logging::initialize(config.log.destination, level, &config.log.file);
    platform::run_app(config, cli.url)
}
