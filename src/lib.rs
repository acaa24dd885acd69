//! Shared library behind the `aggregator`, `producer`, and `consumer`
//! binaries: wire codec, Lamport clock, bounded/expiring station store,
//! crash-safe persistence, retry policy, and the aggregator's HTTP surface.

pub mod client;
pub mod codec;
pub mod config;
pub mod errors;
pub mod http;
pub mod lamport;
pub mod persistence;
pub mod retry;
pub mod store;
pub mod timeutil;
pub mod tracing_context;
