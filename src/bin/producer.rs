//! Producer binary: periodically reads a station file and PUTs it to an
//! aggregator.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use weather_fabric::client::producer;
use weather_fabric::config::ClientRetryConfig;

#[derive(Parser, Debug)]
#[command(name = "producer", about = "Weather telemetry producer", version)]
struct Args {
    /// Aggregator address, e.g. `localhost:4567` or `http://host:4567`.
    server_url: String,
    /// Path to the line-oriented station reading file.
    file_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    if !args.file_path.exists() {
        anyhow::bail!("station file {} does not exist", args.file_path.display());
    }

    // MissingId refuses to start the producer entirely rather than retrying
    // a file that can never PUT successfully.
    weather_fabric::client::read_record_file(&args.file_path)
        .await
        .context("station file is missing the mandatory 'id' field")?;

    producer::run(args.server_url, args.file_path, ClientRetryConfig::default(), -1)
        .await
        .context("producer loop exited with an error")
}
