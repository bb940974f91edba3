//! Utilities for libpm3: small, reusable helpers used across the crate.
//!
//! Hex rendering for dumps and keys, the polling/timeout constants, and a
//! bounded retry helper shared by the card operations.

pub mod hex;
pub mod retry;
pub mod timeout;

// Re-export the most common helpers at the `utils` module level so callers can
// use `crate::utils::bytes_to_hex(...)` etc if they prefer.
pub use hex::*;
pub use retry::*;
pub use timeout::*;
