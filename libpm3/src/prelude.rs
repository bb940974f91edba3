// libpm3/src/prelude.rs

pub use crate::buffer::{ByteBuffer, Endian};
pub use crate::card::{Card, CardImage, CardSize, KeyType, MfKey, SectorKeys, SelectStatus};
pub use crate::device::{
    Activate, CancelToken, Connected, Device, DeviceBuilder, Disconnected, Expect, Interceptor,
    RawOptions, SessionConfig,
};
pub use crate::protocol::{Command, CommandId, Response};
pub use crate::transport::Transport;
pub use crate::{Error, Result};

// Re-export small utilities for convenience
pub use crate::utils::{RetryPolicy, bytes_to_hex, bytes_to_hex_spaced, ms, parse_hex};
