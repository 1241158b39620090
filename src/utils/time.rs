use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current time in microseconds since UNIX epoch
pub fn current_time_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_micros() as u64
}
