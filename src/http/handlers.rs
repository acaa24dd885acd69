//! GET/PUT handling for `/weather.json`. The per-request state machine is
//! linear: receive headers, optionally merge the Lamport clock, dispatch on
//! method, decode/mutate/read, persist if mutated, tick and respond.

use super::AppState;
use crate::codec::{decode_record, encode_record};
use crate::errors::FabricError;
use crate::store::PutOutcome;
use crate::tracing_context::TracingContext;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{error, warn};

static LAMPORT_HEADER: HeaderName = HeaderName::from_static("x-lamport-clock");

pub async fn weather_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let context = TracingContext::new("aggregator");
    context
        .with_span_async(async {
            if let Some(raw) = headers.get(&LAMPORT_HEADER) {
                match parse_lamport_header(raw) {
                    Ok(rx) => {
                        state.clock.merge(rx);
                    }
                    Err(e) => {
                        let (status, body) = response_for_error(&e);
                        return respond(&state, status, body).await;
                    }
                }
            }

            match method {
                Method::GET => handle_get(&state, &uri).await,
                Method::PUT => handle_put(&state, &headers, &body).await,
                _ => respond(&state, StatusCode::BAD_REQUEST, "Bad Request").await,
            }
        })
        .await
}

fn parse_lamport_header(raw: &HeaderValue) -> Result<u64, FabricError> {
    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| FabricError::invalid_lamport(String::from_utf8_lossy(raw.as_bytes()).into_owned()))
}

/// Map a `FabricError` to the status/body pair its taxonomy specifies
/// (§7): an invalid Lamport header is always a 400, every codec failure
/// on the wire is always a 500.
fn response_for_error(err: &FabricError) -> (StatusCode, &'static str) {
    match err {
        FabricError::InvalidLamport { .. } => (StatusCode::BAD_REQUEST, "Invalid Lamport Clock"),
        other => {
            debug_assert!(
                other.is_codec_error(),
                "unexpected error variant reaching the HTTP error mapper: {other:?}"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Percent-decoded value of `?station=...`, if present.
fn extract_station_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    for pair in query.split('&') {
        if let Some(raw) = pair.strip_prefix("station=") {
            return Some(
                percent_encoding::percent_decode_str(raw)
                    .decode_utf8_lossy()
                    .into_owned(),
            );
        }
    }
    None
}

async fn handle_get(state: &AppState, uri: &Uri) -> Response {
    let record = {
        let store = state.store.lock().await;
        match extract_station_param(uri) {
            Some(id) => store.get_by_id(&id),
            None => store.get_latest(),
        }
    };

    match record {
        Some(record) => respond(state, StatusCode::OK, &encode_record(&record)).await,
        None => respond(state, StatusCode::NO_CONTENT, "").await,
    }
}

async fn handle_put(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Response {
    match classify_content_length(headers) {
        ContentLengthOutcome::NoContent => return respond(state, StatusCode::NO_CONTENT, "").await,
        ContentLengthOutcome::Invalid => return respond(state, StatusCode::BAD_REQUEST, "Bad Request").await,
        ContentLengthOutcome::Present => {}
    }

    let text = match std::str::from_utf8(body) {
        Ok(text) => text,
        Err(_) => {
            error!("PUT body was not valid UTF-8");
            return respond(state, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").await;
        }
    };

    let record = match decode_record(text) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "failed to decode PUT body");
            let (status, body) = response_for_error(&e);
            return respond(state, status, body).await;
        }
    };

    if !record.contains_key("id") {
        return respond(state, StatusCode::BAD_REQUEST, "Missing 'id' field").await;
    }

    let lamport = state.clock.tick();
    let now = crate::timeutil::now_millis();

    let mut store = state.store.lock().await;
    let outcome = match store.put(record, lamport, now) {
        Ok(outcome) => outcome,
        Err(e) => {
            drop(store);
            error!(error = %e, "unexpected store error on PUT despite pre-checked id");
            return respond(state, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").await;
        }
    };

    let file_existed_before = state.persistence.exists();
    let snapshot = store.snapshot();
    if let Err(e) = state.persistence.flush(&snapshot).await {
        error!(error = %e, "persistence flush after PUT failed, will retry on next trigger");
    }
    drop(store);

    let status = if outcome == PutOutcome::Created || !file_existed_before {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    respond(state, status, "Success").await
}

enum ContentLengthOutcome {
    NoContent,
    Invalid,
    Present,
}

fn classify_content_length(headers: &HeaderMap) -> ContentLengthOutcome {
    let Some(raw) = headers.get(header::CONTENT_LENGTH) else {
        return ContentLengthOutcome::NoContent;
    };
    let Ok(text) = raw.to_str() else {
        return ContentLengthOutcome::Invalid;
    };
    if text.trim().is_empty() {
        return ContentLengthOutcome::NoContent;
    }
    match text.trim().parse::<u64>() {
        Ok(0) => ContentLengthOutcome::NoContent,
        Ok(_) => ContentLengthOutcome::Present,
        Err(_) => ContentLengthOutcome::Invalid,
    }
}

/// Build a response with `Content-Type: application/json` and an
/// `X-Lamport-Clock` header reflecting the clock *after* this response's
/// send-tick, per every response's contract.
async fn respond(state: &AppState, status: StatusCode, body: &str) -> Response {
    let clock_value = state.clock.tick();
    let mut response = (status, body.to_string()).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response.headers_mut().insert(
        LAMPORT_HEADER.clone(),
        HeaderValue::from_str(&clock_value.to_string()).expect("decimal integer is valid header value"),
    );
    response
}
