use std::process::ExitCode;

use chrono::Local;
use clap::{CommandFactory, Parser};
use manus::{config::Args, info_time, process::process_fonds, Result};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // Diagnostics go to stderr, the progress bar owns stdout.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(config) = args.into_config() else {
        Args::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let start_time = Local::now();
    if let Err(err) = process_fonds(&config).await {
        error!(fonds = config.fonds, "crawl aborted: {err}");
        return Ok(ExitCode::FAILURE);
    }
    info_time!(start_time, "Full program time:");

    Ok(ExitCode::SUCCESS)
}
