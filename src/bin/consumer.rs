//! Consumer binary: one-shot GET of a station (or the latest record) from
//! an aggregator, pretty-printed to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use weather_fabric::client::consumer::{self, FetchOutcome};
use weather_fabric::config::ClientRetryConfig;

#[derive(Parser, Debug)]
#[command(name = "consumer", about = "Weather telemetry consumer", version)]
struct Args {
    /// Aggregator address, e.g. `localhost:4567` or `http://host:4567`.
    server_url: String,
    /// Optional station id; omit to fetch the most recently written station.
    station_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let outcome = consumer::run(args.server_url, args.station_id, ClientRetryConfig::default())
        .await
        .context("consumer request failed")?;

    match outcome {
        FetchOutcome::Record(record) => {
            print!("{}", consumer::pretty_print(&record));
            println!();
        }
        FetchOutcome::NoData => {
            println!("no data available");
        }
    }
    Ok(())
}
