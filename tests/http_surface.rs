//! End-to-end HTTP scenarios against a real Axum router bound to an
//! ephemeral port, driven by a real `reqwest::Client` — no mocks.

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use weather_fabric::config::AggregatorConfig;
use weather_fabric::http::{build_router, AppState};
use weather_fabric::lamport::LamportClock;
use weather_fabric::store::Store;

struct TestServer {
    base_url: String,
    _persistence_dir: tempfile::TempDir,
}

async fn start_server(expiry_ms: i64) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config = AggregatorConfig::new(0, 20, expiry_ms, 200, dir.path().join("weather_data.json"))
        .expect("valid test config");
    let state = Arc::new(AppState::new(config, Store::new(20, expiry_ms), LamportClock::new()));
    let router = build_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        _persistence_dir: dir,
    }
}

fn lamport_header(response: &reqwest::Response) -> u64 {
    response
        .headers()
        .get("X-Lamport-Clock")
        .expect("every response carries X-Lamport-Clock")
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn first_write_is_201() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let response = client
        .put(format!("{}/weather.json", server.base_url))
        .body("{\"id\":\"A\",\"temperature\":\"25\"}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(lamport_header(&response) >= 1);
    assert_eq!(response.text().await.unwrap(), "Success");
}

#[tokio::test]
async fn subsequent_write_is_200() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let url = format!("{}/weather.json", server.base_url);

    client.put(&url).body("{\"id\":\"A\",\"temperature\":\"25\"}").send().await.unwrap();
    let response = client.put(&url).body("{\"id\":\"A\",\"temperature\":\"26\"}").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn read_back_after_write() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let url = format!("{}/weather.json", server.base_url);

    client.put(&url).body("{\"id\":\"A\",\"temperature\":\"25\"}").send().await.unwrap();
    let response = client.get(format!("{url}?station=A")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    let record = weather_fabric::codec::decode_record(&body).unwrap();
    assert_eq!(record.get("id"), Some("A"));
    assert_eq!(record.get("temperature"), Some("25"));
}

#[tokio::test]
async fn expiry_removes_station_after_sweep() {
    let server = start_server(50).await;
    let client = reqwest::Client::new();
    let url = format!("{}/weather.json", server.base_url);

    client.put(&url).body("{\"id\":\"B\",\"temperature\":\"1\"}").send().await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    let response = client.get(format!("{url}?station=B")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn malformed_json_trailing_comma_is_500() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let response = client
        .put(format!("{}/weather.json", server.base_url))
        .body("{ \"id\": \"C\", }")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unsupported_method_is_400() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/weather.json", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zero_content_length_is_204() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let response = client
        .put(format!("{}/weather.json", server.base_url))
        .header("Content-Length", "0")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn overflow_evicts_earliest_station() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let url = format!("{}/weather.json", server.base_url);

    for i in 1..=21 {
        let body = format!("{{\"id\":\"S{i}\",\"v\":\"{i}\"}}");
        client.put(&url).body(body).send().await.unwrap();
    }

    let first = client.get(format!("{url}?station=S1")).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::NO_CONTENT);

    let latest = client.get(&url).send().await.unwrap();
    let body = latest.text().await.unwrap();
    let record = weather_fabric::codec::decode_record(&body).unwrap();
    assert_eq!(record.get("id"), Some("S21"));
}

#[tokio::test]
async fn lamport_clock_is_monotone_across_a_put_then_get() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let url = format!("{}/weather.json", server.base_url);

    let put_response = client
        .put(&url)
        .header("X-Lamport-Clock", "100")
        .body("{\"id\":\"A\",\"v\":\"1\"}")
        .send()
        .await
        .unwrap();
    let put_clock = lamport_header(&put_response);
    assert!(put_clock >= 101);

    let get_response = client.get(format!("{url}?station=A")).send().await.unwrap();
    let get_clock = lamport_header(&get_response);
    assert!(get_clock > put_clock);
}

#[tokio::test]
async fn invalid_lamport_header_is_400() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/weather.json", server.base_url))
        .header("X-Lamport-Clock", "not-a-number")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_on_empty_store_is_204() {
    let server = start_server(30_000).await;
    let client = reqwest::Client::new();
    let response = client.get(format!("{}/weather.json", server.base_url)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
