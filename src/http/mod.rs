//! The aggregator's single HTTP route, `/weather.json`, handling GET
//! (read) and PUT (write) and threading the Lamport clock through
//! `X-Lamport-Clock` request/response headers.

mod handlers;

use crate::config::AggregatorConfig;
use crate::lamport::LamportClock;
use crate::persistence::Persistence;
use crate::store::Store;
use axum::routing::any;
use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Shared state reachable from every handler. `store` and `persistence`
/// are guarded by one mutex because persistence rewrites must run while
/// holding the store lock, so the file on disk always matches a
/// consistent in-memory snapshot (the "storeMutex guards the station map
/// and the persistence trigger" invariant).
pub struct AppState {
    pub store: Mutex<Store>,
    pub clock: LamportClock,
    pub persistence: Persistence,
    pub config: AggregatorConfig,
}

impl AppState {
    pub fn new(config: AggregatorConfig, store: Store, clock: LamportClock) -> Self {
        let persistence = Persistence::new(config.persistence_path.clone());
        Self {
            store: Mutex::new(store),
            clock,
            persistence,
            config,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/weather.json", any(handlers::weather_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the expiry sweep once per second until `shutdown` resolves. Any
/// sweep that removes something reflushes persistence, under the same
/// store-mutex-held discipline as a PUT.
pub async fn run_expiry_sweeper(state: Arc<AppState>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(state.config.sweep_interval_ms));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = crate::timeutil::now_millis();
                let mut store = state.store.lock().await;
                if store.sweep(now) {
                    let snapshot = store.snapshot();
                    if let Err(e) = state.persistence.flush(&snapshot).await {
                        tracing::error!(error = %e, "persistence flush after sweep failed");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!("expiry sweeper shutting down");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatorConfig;

    #[tokio::test]
    async fn expiry_sweeper_stops_on_shutdown_signal() {
        let dir = tempfile::tempdir().unwrap();
        let config = AggregatorConfig::new(0, 20, 30_000, 10, dir.path().join("weather_data.json")).unwrap();
        let state = Arc::new(AppState::new(config, Store::new(20, 30_000), LamportClock::new()));
        let (tx, rx) = tokio::sync::watch::channel(false);

        let handle = tokio::spawn(run_expiry_sweeper(state, rx));
        tx.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("sweeper task should observe shutdown and return promptly")
            .expect("sweeper task should not panic");
    }
}
