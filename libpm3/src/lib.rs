// libpm3/src/lib.rs

//! libpm3
//!
//! Pure Rust host-side driver for Proxmark3 RFID/NFC transceivers: wire
//! framing, request/response sessions, ISO14443-A reader commands and
//! MIFARE Classic card operations.

pub mod buffer;
pub mod card;
pub mod constants;
pub mod device;
pub mod error;
pub mod prelude;
pub mod protocol;
#[doc(hidden)]
pub mod test_support;
pub mod transport;
pub mod utils;

// Re-export the error type at crate root so `crate::Error` and
// `crate::Result` resolve everywhere.
pub use crate::error::*;

pub use prelude::*;
