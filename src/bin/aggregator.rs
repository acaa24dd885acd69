//! Aggregator binary: serves `/weather.json`, runs the expiry sweeper, and
//! recovers the persisted snapshot (if any) on startup.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use weather_fabric::config::{parse_port_arg, AggregatorConfig};
use weather_fabric::http::{build_router, run_expiry_sweeper, AppState};
use weather_fabric::lamport::LamportClock;
use weather_fabric::store::Store;

#[derive(Parser, Debug)]
#[command(name = "aggregator", about = "Weather telemetry aggregator", version)]
struct Args {
    /// Port to listen on (default 4567; unparseable falls back with a warning).
    port: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let port = parse_port_arg(args.port.as_deref());
    let config = AggregatorConfig {
        port,
        ..AggregatorConfig::default()
    };

    let clock = LamportClock::new();
    let mut store = Store::new(config.max_stations, config.expiry_ms);

    let persistence = weather_fabric::persistence::Persistence::new(config.persistence_path.clone());
    if persistence.exists() {
        match persistence.load().await {
            Ok(records) => {
                let now = weather_fabric::timeutil::now_millis();
                let count = records.len();
                store.load_snapshot(records, now, &clock);
                info!(count, "recovered persisted snapshot on startup");
            }
            Err(e) => {
                warn!(error = %e, "failed to parse persisted snapshot, starting with an empty store");
            }
        }
    }

    let state = Arc::new(AppState::new(config.clone(), store, clock));
    let router = build_router(Arc::clone(&state));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweeper = tokio::spawn(run_expiry_sweeper(Arc::clone(&state), shutdown_rx));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "aggregator listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Err(e) = sweeper.await {
        error!(error = %e, "expiry sweeper task panicked");
    }
    Ok(())
}
