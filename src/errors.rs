//! Error taxonomy for the weather telemetry fabric.
//!
//! Mirrors the split the aggregator core needs: a structured,
//! semantically-named error enum that every component returns, and a thin
//! `anyhow` boundary at each binary's `main()` (see `src/bin/*.rs`).

use thiserror::Error;

/// Errors raised anywhere in the aggregator core, producer, or consumer.
#[derive(Error, Debug)]
pub enum FabricError {
    /// The wire dialect's outer shape is broken: missing braces, a trailing
    /// comma, an empty pair, or an unterminated string.
    #[error("malformed structure: {reason}")]
    MalformedStructure { reason: String },

    /// A quoted value (or key) started with `"` but had no matching
    /// terminator, or contained an invalid escape sequence.
    #[error("malformed string: {reason}")]
    MalformedString { reason: String },

    /// A bare literal did not parse as a finite decimal number.
    #[error("malformed number: {reason}")]
    MalformedNumber { reason: String },

    /// A record was submitted without the mandatory `id` field.
    #[error("missing 'id' field")]
    MissingId,

    /// The `X-Lamport-Clock` header was present but not a valid integer.
    #[error("invalid Lamport clock header: {value}")]
    InvalidLamport { value: String },

    /// A file-system failure while reading or writing the persisted store.
    /// Never fatal: the in-memory store remains authoritative and the next
    /// successful flush catches up.
    #[error("persistence error: {message}")]
    Persistence { message: String },

    /// A socket or I/O failure on the client side. Triggers the bounded
    /// retry wrapper; surfaced only after retries are exhausted.
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience.
pub type FabricResult<T> = std::result::Result<T, FabricError>;

impl FabricError {
    pub fn malformed_structure<S: Into<String>>(reason: S) -> Self {
        Self::MalformedStructure {
            reason: reason.into(),
        }
    }

    pub fn malformed_string<S: Into<String>>(reason: S) -> Self {
        Self::MalformedString {
            reason: reason.into(),
        }
    }

    pub fn malformed_number<S: Into<String>>(reason: S) -> Self {
        Self::MalformedNumber {
            reason: reason.into(),
        }
    }

    pub fn invalid_lamport<S: Into<String>>(value: S) -> Self {
        Self::InvalidLamport {
            value: value.into(),
        }
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// True for the codec error variants the HTTP surface maps to 500, per
    /// the server-side behavior specified for malformed wire input.
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedStructure { .. }
                | Self::MalformedString { .. }
                | Self::MalformedNumber { .. }
        )
    }
}
