//! Periodic PUT loop: read the station file, stamp a local Lamport tick,
//! PUT the record, and wait for the next cycle.

use super::{ingest, weather_url};
use crate::config::{ClientRetryConfig, UPDATE_INTERVAL_MS};
use crate::errors::{FabricError, FabricResult};
use crate::lamport::LamportClock;
use crate::retry::retry_bounded_with_delay;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Drives the producer loop. `iterations < 0` runs forever; a
/// non-negative bound stops after exactly that many cycles, which is how
/// tests pin down an otherwise-infinite loop.
pub async fn run(
    server_url: String,
    file_path: PathBuf,
    retry_config: ClientRetryConfig,
    iterations: i64,
) -> FabricResult<()> {
    let client = Client::new();
    let clock = LamportClock::new();
    let url = weather_url(&server_url);

    let mut remaining = iterations;
    loop {
        if remaining == 0 {
            return Ok(());
        }
        if remaining > 0 {
            remaining -= 1;
        }

        if let Err(e) = run_one_cycle(&client, &url, &file_path, &clock, &retry_config).await {
            error!(error = %e, "producer cycle abandoned after exhausting retries");
        }

        if remaining == 0 {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(UPDATE_INTERVAL_MS)).await;
    }
}

async fn run_one_cycle(
    client: &Client,
    url: &str,
    file_path: &std::path::Path,
    clock: &LamportClock,
    retry_config: &ClientRetryConfig,
) -> FabricResult<()> {
    let record = ingest::read_record_file(file_path).await?;
    let body = crate::codec::encode_record(&record);

    retry_bounded_with_delay(
        retry_config.max_retries,
        Duration::from_millis(retry_config.retry_delay_ms),
        || {
            clock.tick();
        },
        || send_put(client, url, &body, clock),
    )
    .await?;
    Ok(())
}

async fn send_put(client: &Client, url: &str, body: &str, clock: &LamportClock) -> FabricResult<()> {
    let lamport = clock.tick();
    let response = client
        .put(url)
        .header("X-Lamport-Clock", lamport.to_string())
        .header("Content-Type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .map_err(|e| FabricError::transport(e.to_string()))?;

    let status = response.status();
    if let Some(raw) = response.headers().get("X-Lamport-Clock") {
        if let Ok(rx) = raw.to_str().unwrap_or_default().trim().parse::<u64>() {
            clock.merge(rx);
        } else {
            warn!(value = ?raw, "producer received unparseable Lamport header, ignoring");
        }
    }

    if status.as_u16() == 200 || status.as_u16() == 201 {
        info!(%status, "producer PUT succeeded");
        Ok(())
    } else {
        Err(FabricError::transport(format!("PUT returned status {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn missing_id_line_fails_fast_before_any_network_call() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "temperature: 25").unwrap();
        let retry_config = ClientRetryConfig { max_retries: 1, retry_delay_ms: 0 };
        let client = Client::new();
        let clock = LamportClock::new();
        let result = run_one_cycle(&client, "http://127.0.0.1:1", file.path(), &clock, &retry_config).await;
        assert!(result.is_err());
    }

    /// Drives `run()` with a positive bound against a real bound server and
    /// asserts exactly that many PUTs arrive — pins down the off-by-one
    /// where a positive `iterations` ran one cycle too many. Uses paused
    /// virtual time so the real `UPDATE_INTERVAL_MS` inter-cycle sleep
    /// doesn't make the test slow.
    #[tokio::test(start_paused = true)]
    async fn run_with_bounded_iterations_executes_exactly_that_many_cycles() {
        use axum::routing::put;
        use axum::Router;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let put_count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&put_count);
        let app = Router::new().route(
            "/weather.json",
            put(move || {
                let counted = Arc::clone(&counted);
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    (axum::http::StatusCode::CREATED, "Success")
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id: A").unwrap();
        writeln!(file, "temperature: 25").unwrap();
        let retry_config = ClientRetryConfig { max_retries: 1, retry_delay_ms: 0 };

        let handle = tokio::spawn(run(
            format!("http://{addr}"),
            file.path().to_path_buf(),
            retry_config,
            2,
        ));

        // The loop sleeps UPDATE_INTERVAL_MS between cycles on virtual time;
        // advance in small steps so pending real I/O (the PUTs) interleaves.
        for _ in 0..(UPDATE_INTERVAL_MS / 50 + 10) {
            if handle.is_finished() {
                break;
            }
            tokio::time::advance(Duration::from_millis(50)).await;
        }

        handle.await.unwrap().unwrap();
        assert_eq!(put_count.load(Ordering::SeqCst), 2);
    }
}
