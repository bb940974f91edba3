// libpm3/src/error.rs

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("device not found")]
    DeviceNotFound,

    // USB 実装を後から有効化できるように optional dependency にしている
    #[cfg(feature = "usb")]
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("frame format error: {0}")]
    FrameFormat(String),

    /// `timeout_ms` is the effective deadline, including any extensions
    /// the device requested while the caller was waiting.
    #[error("operation timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("operation cancelled")]
    Cancelled,

    #[error("card select failed: {0}")]
    CardSelect(String),

    #[error("card doesn't support standard iso14443-3 anticollision, atqa: {}", crate::utils::bytes_to_hex(.atqa))]
    NonStandardAnticollision { atqa: [u8; 2] },

    #[error("device reported failure: {operation} {index}")]
    DeviceFailure {
        operation: &'static str,
        index: usize,
    },

    #[error("no key found for sector {sector}")]
    KeyNotFound { sector: usize },

    #[error("invalid access conditions in sector {sector}")]
    InvalidAcl { sector: usize },

    #[error("failed after {attempts} attempts: {source}")]
    Retried {
        attempts: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether a bounded retry may succeed where this attempt failed.
    ///
    /// Caller bugs, a missing channel and cancellation never improve by
    /// repeating the same request.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::InvalidArgument(_)
                | Error::InvalidLength { .. }
                | Error::Transport(_)
                | Error::DeviceNotFound
                | Error::Cancelled
                | Error::KeyNotFound { .. }
                | Error::InvalidAcl { .. }
        )
    }

    /// Shorthand for a failure the device reported for `operation` on the
    /// unit at `index` (block, sector, ...).
    pub fn device_failure(operation: &'static str, index: usize) -> Self {
        Error::DeviceFailure { operation, index }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
