use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond wall-clock timestamp, used throughout the matchmaking core
/// for `joinTime`, `expiresAt`, and penalty expirations.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
