//! Reads the producer's local station-reading file: line-oriented
//! `key: value` pairs, split on the first `:` only, both sides trimmed.
//! Empty or malformed lines are skipped silently; only the missing-`id`
//! case is an error, since a record with no station identity can't be
//! PUT at all.

use crate::codec::Record;
use crate::errors::{FabricError, FabricResult};
use std::path::Path;

pub async fn read_record_file(path: &Path) -> FabricResult<Record> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FabricError::transport(format!("reading {}: {e}", path.display())))?;
    parse_record_text(&text)
}

fn parse_record_text(text: &str) -> FabricResult<Record> {
    let mut record = Record::new();
    for line in text.lines() {
        let Some(colon) = line.find(':') else {
            continue;
        };
        let key = line[..colon].trim();
        let value = line[colon + 1..].trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        record.insert(key.to_string(), value.to_string());
    }
    if !record.contains_key("id") {
        return Err(FabricError::malformed_structure("station file has no 'id' line"));
    }
    Ok(record)
}
