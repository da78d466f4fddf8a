//! Time helpers

use chrono::Utc;

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time as epoch seconds
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}
