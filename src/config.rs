//! Tuning configuration for the aggregator and its clients.
//!
//! Production binaries always construct the defaults (§6 of the spec); an
//! explicit constructor lets tests shrink `expiry_ms`/`sweep_interval_ms`
//! so expiry scenarios don't need a real 30s wait. This mirrors the
//! teacher's `ReplicationConfig::new` validation-on-construction pattern,
//! generalized from environment-variable loading to explicit arguments
//! since the aggregator has no environment-variable contract of its own.

use crate::errors::{FabricError, FabricResult};
use crate::store::{EXPIRY_MS, MAX_STATIONS};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 4567;
pub const UPDATE_INTERVAL_MS: u64 = 10_000;
pub const SWEEP_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub port: u16,
    pub max_stations: usize,
    pub expiry_ms: i64,
    pub sweep_interval_ms: u64,
    pub persistence_path: PathBuf,
}

impl AggregatorConfig {
    pub fn new(
        port: u16,
        max_stations: usize,
        expiry_ms: i64,
        sweep_interval_ms: u64,
        persistence_path: impl Into<PathBuf>,
    ) -> FabricResult<Self> {
        if max_stations == 0 {
            return Err(FabricError::persistence("max_stations must be nonzero"));
        }
        Ok(Self {
            port,
            max_stations,
            expiry_ms,
            sweep_interval_ms,
            persistence_path: persistence_path.into(),
        })
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_stations: MAX_STATIONS,
            expiry_ms: EXPIRY_MS,
            sweep_interval_ms: SWEEP_INTERVAL_MS,
            persistence_path: PathBuf::from(crate::persistence::DEFAULT_PERSISTENCE_PATH),
        }
    }
}

/// Parse the optional `[port]` CLI argument, falling back to
/// `DEFAULT_PORT` with a warning if it is present but unparseable.
pub fn parse_port_arg(raw: Option<&str>) -> u16 {
    match raw {
        None => DEFAULT_PORT,
        Some(text) => match text.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                warn!(value = text, default = DEFAULT_PORT, "unparseable port argument, using default");
                DEFAULT_PORT
            }
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClientRetryConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for ClientRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::retry::MAX_RETRIES,
            retry_delay_ms: crate::retry::RETRY_DELAY_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_port_arg_uses_default() {
        assert_eq!(parse_port_arg(None), DEFAULT_PORT);
    }

    #[test]
    fn valid_port_arg_is_used() {
        assert_eq!(parse_port_arg(Some("9090")), 9090);
    }

    #[test]
    fn unparseable_port_arg_falls_back_to_default() {
        assert_eq!(parse_port_arg(Some("not-a-port")), DEFAULT_PORT);
    }

    #[test]
    fn zero_max_stations_rejected() {
        assert!(AggregatorConfig::new(4567, 0, EXPIRY_MS, 1_000, "x.json").is_err());
    }
}
