//! The bounded, order-preserving, expiring station store.
//!
//! Backed by `IndexMap` rather than a plain `HashMap`: several invariants
//! (LRU eviction picks the earliest-inserted entry; a PUT that updates an
//! existing id moves it to the most-recent position; codec output order
//! must be stable) require a map whose iteration order equals insertion
//! order, with cheap remove-and-reinsert. Relying on a hash map's
//! incidental order would be wrong.

use crate::codec::Record;
use crate::errors::{FabricError, FabricResult};
use crate::lamport::LamportClock;
use indexmap::IndexMap;

pub const MAX_STATIONS: usize = 20;
pub const EXPIRY_MS: i64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
struct StoreEntry {
    record: Record,
    timestamp_ms: i64,
}

/// An in-memory map of station id to its most recent record, bounded to
/// `max_stations` entries and subject to `expiry_ms` time-based eviction.
pub struct Store {
    entries: IndexMap<String, StoreEntry>,
    max_stations: usize,
    expiry_ms: i64,
}

impl Store {
    pub fn new(max_stations: usize, expiry_ms: i64) -> Self {
        Self {
            entries: IndexMap::new(),
            max_stations,
            expiry_ms,
        }
    }

    /// Insert or replace the record for `record`'s `id`, stamping it with
    /// `lamport` as the persisted `lamportClock` field. Evicts the
    /// earliest-inserted entry first if the store is at capacity and `id`
    /// is new.
    pub fn put(&mut self, mut record: Record, lamport: u64, now_ms: i64) -> FabricResult<PutOutcome> {
        let id = record.id().ok_or(FabricError::MissingId)?.to_string();
        record.insert("lamportClock", lamport.to_string());

        let outcome = if self.entries.shift_remove(&id).is_some() {
            PutOutcome::Updated
        } else {
            if self.entries.len() >= self.max_stations {
                self.entries.shift_remove_index(0);
            }
            PutOutcome::Created
        };

        self.entries.insert(id, StoreEntry { record, timestamp_ms: now_ms });
        Ok(outcome)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Record> {
        self.entries.get(id).map(|e| e.record.clone())
    }

    /// The record with the largest ingest timestamp; ties break toward the
    /// most-recently inserted entry, which `Iterator::max_by_key`'s
    /// last-wins tie-break gives us for free over an insertion-ordered map.
    pub fn get_latest(&self) -> Option<Record> {
        self.entries
            .values()
            .max_by_key(|e| e.timestamp_ms)
            .map(|e| e.record.clone())
    }

    /// Remove every entry older than `expiry_ms` relative to `now_ms`.
    /// Returns true if anything was removed.
    pub fn sweep(&mut self, now_ms: i64) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now_ms.saturating_sub(e.timestamp_ms) <= self.expiry_ms);
        self.entries.len() != before
    }

    /// An ordered snapshot of every record, for persistence. Includes each
    /// record's persisted `lamportClock` field.
    pub fn snapshot(&self) -> Vec<Record> {
        self.entries.values().map(|e| e.record.clone()).collect()
    }

    /// Replace the store's contents with `records`, stamping every loaded
    /// entry with `now_ms` as its ingest timestamp (crash-recovered data
    /// gets a fresh expiry window, not its original remaining lifetime —
    /// see the design note on `LoadSnapshot` open question), and raising
    /// `clock` to at least the highest `lamportClock` found in the set.
    pub fn load_snapshot(&mut self, records: Vec<Record>, now_ms: i64, clock: &LamportClock) {
        self.entries.clear();
        let mut max_lamport = 0u64;
        for record in records {
            let Some(id) = record.id().map(str::to_string) else {
                continue;
            };
            if let Some(lc) = record.get("lamportClock").and_then(|s| s.parse::<u64>().ok()) {
                max_lamport = max_lamport.max(lc);
            }
            self.entries.insert(id, StoreEntry { record, timestamp_ms: now_ms });
        }
        clock.raise_to_at_least(max_lamport);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
