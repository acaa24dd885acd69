//! One-shot GET: fetch a station (or the latest record), merge the
//! response's Lamport clock, and pretty-print the result. Retries on
//! transport failure using the same bounded policy as the producer.

use super::weather_url;
use crate::codec::{decode_record, Record};
use crate::config::ClientRetryConfig;
use crate::errors::{FabricError, FabricResult};
use crate::lamport::LamportClock;
use crate::retry::retry_bounded_with_delay;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Outcome of a single consumer run, for the binary to render and exit on.
pub enum FetchOutcome {
    Record(Record),
    NoData,
}

pub async fn run(
    server_url: String,
    station_id: Option<String>,
    retry_config: ClientRetryConfig,
) -> FabricResult<FetchOutcome> {
    let client = Client::new();
    let clock = LamportClock::new();
    let url = build_url(&server_url, station_id.as_deref());

    retry_bounded_with_delay(
        retry_config.max_retries,
        Duration::from_millis(retry_config.retry_delay_ms),
        || {
            clock.tick();
        },
        || fetch_once(&client, &url, &clock),
    )
    .await
}

fn build_url(server_url: &str, station_id: Option<&str>) -> String {
    let base = weather_url(server_url);
    match station_id {
        Some(id) => {
            let encoded = percent_encoding::utf8_percent_encode(id, percent_encoding::NON_ALPHANUMERIC);
            format!("{base}?station={encoded}")
        }
        None => base,
    }
}

async fn fetch_once(client: &Client, url: &str, clock: &LamportClock) -> FabricResult<FetchOutcome> {
    let lamport = clock.tick();
    let response = client
        .get(url)
        .header("X-Lamport-Clock", lamport.to_string())
        .send()
        .await
        .map_err(|e| FabricError::transport(e.to_string()))?;

    if let Some(raw) = response.headers().get("X-Lamport-Clock") {
        if let Ok(rx) = raw.to_str().unwrap_or_default().trim().parse::<u64>() {
            clock.merge(rx);
        } else {
            warn!(value = ?raw, "consumer received unparseable Lamport header, ignoring");
        }
    }

    let status = response.status();
    if status.as_u16() == 204 {
        return Ok(FetchOutcome::NoData);
    }
    if status.as_u16() != 200 {
        return Err(FabricError::transport(format!("GET returned status {status}")));
    }

    let text = response
        .text()
        .await
        .map_err(|e| FabricError::transport(e.to_string()))?;
    let record = decode_record(&text)?;
    Ok(FetchOutcome::Record(record))
}

/// Render a record as `  key: value` lines, hiding the aggregator-owned
/// `lamportClock` field from user-visible output.
pub fn pretty_print(record: &Record) -> String {
    let mut out = String::new();
    for (key, value) in record.iter() {
        if key == "lamportClock" {
            continue;
        }
        out.push_str("  ");
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out
}
