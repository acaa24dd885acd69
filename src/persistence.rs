//! Durable, crash-safe persistence for the station store: the entire store
//! is rewritten to a single JSON-dialect array file on every mutating
//! trigger. "Stop-the-world but brief" — write to a sibling temp file,
//! fsync, then atomically rename over the canonical path, so the only
//! durability boundary is the rename itself.
//!
//! Persistence never calls into the HTTP layer and is synchronous with its
//! caller (no background writer queue): this keeps the "rename = commit"
//! point as the sole thing callers need to reason about.

use crate::codec::{decode_records, encode_records, Record};
use crate::errors::{FabricError, FabricResult};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const DEFAULT_PERSISTENCE_PATH: &str = "weather_data.json";

pub struct Persistence {
    path: PathBuf,
}

impl Persistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the canonical file exists right now. Callers check this
    /// *before* calling `flush`, since a successful flush always leaves the
    /// canonical file in place afterward.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Serialize `records` and atomically replace the canonical file.
    pub async fn flush(&self, records: &[Record]) -> FabricResult<()> {
        let text = encode_records(records);
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| FabricError::persistence(format!("create temp file: {e}")))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| FabricError::persistence(format!("write temp file: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| FabricError::persistence(format!("fsync temp file: {e}")))?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| FabricError::persistence(format!("rename into place: {e}")))?;
        Ok(())
    }

    /// Load the canonical file as an array of records. Returns an empty
    /// vec, not an error, if the file does not exist — callers distinguish
    /// "no file yet" from "file present but unparseable" by checking
    /// `exists()` first if they need to.
    pub async fn load(&self) -> FabricResult<Vec<Record>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FabricError::persistence(format!("read snapshot file: {e}")))?;
        decode_records(&text)
    }
}
