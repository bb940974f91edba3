//! Timeout helpers used across the crate.
//!
//! The polling constants were tuned against real device latency; keep
//! them in one place so the session and the command layer agree.

use std::time::Duration;

/// Default response timeout when a caller doesn't provide one.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5000;

/// Interval between two checks of the response queue.
pub const POLL_INTERVAL_MS: u64 = 10;

/// Margin added to every caller-supplied timeout for USB round trip latency.
pub const COMMUNICATION_DELAY_MS: u64 = 100;

/// Extra wait granted on top of a raw exchange's own card timeout.
pub const RAW_REPLY_MARGIN_MS: u64 = 2500;

/// Key search can take minutes when the dictionary is large.
pub const CHECK_KEYS_TIMEOUT_MS: u64 = 360_000;

/// WTX value meaning "extend indefinitely"; it never moves the deadline.
pub const WTX_INFINITE: u16 = 0xFFFF;

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Convenience: default response timeout as Duration.
pub fn default_response_timeout() -> Duration {
    ms(DEFAULT_RESPONSE_TIMEOUT_MS)
}
