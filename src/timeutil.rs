//! Wall-clock helpers. A thin wrapper around `chrono` so the rest of the
//! crate works in plain `i64` millis-since-epoch, matching the unit the
//! spec's timestamps and constants (`EXPIRY_MS`, etc.) are expressed in.

use chrono::Utc;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
