//! Wall clock helpers

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the UNIX epoch, 0 if the clock is before it
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
