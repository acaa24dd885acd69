//! A single Lamport logical clock shared by every component in a process.
//!
//! A plain atomic integer is not sufficient: the merge rule
//! `L <- max(L, rx) + 1` is a read-modify-write over two operands, not a
//! single RMW, so a mutex (or a CAS loop) is required. Contention is low —
//! one request at a time touches the clock — so a plain mutex is enough;
//! this mirrors the teacher's choice of a `tokio::sync::Mutex` around its
//! shared HTTP client, generalized here to `parking_lot::Mutex` because the
//! critical section never awaits.

use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct LamportClock {
    value: Mutex<u64>,
}

impl LamportClock {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(0),
        }
    }

    /// `L <- L + 1`, returning the new value. Called on every local
    /// observable event: receiving a message, sending a message, or a
    /// scheduled background step that produces an outgoing message.
    pub fn tick(&self) -> u64 {
        let mut guard = self.value.lock();
        *guard += 1;
        *guard
    }

    /// `L <- max(L, rx) + 1`. Called exactly once per inbound message that
    /// carries a peer clock, before any `tick` for that same message.
    pub fn merge(&self, rx: u64) -> u64 {
        let mut guard = self.value.lock();
        *guard = guard.max(&rx) + 1;
        *guard
    }

    /// Raise the clock to at least `floor`, without the unconditional `+1`
    /// a `merge` would apply. Used by `LoadSnapshot` to fast-forward past
    /// the highest clock value recovered from disk.
    pub fn raise_to_at_least(&self, floor: u64) {
        let mut guard = self.value.lock();
        if floor > *guard {
            *guard = floor;
        }
    }

    pub fn current(&self) -> u64 {
        *self.value.lock()
    }
}
