// libpm3/src/protocol/mod.rs

pub mod codec;
pub mod commands;
pub mod crc;
pub mod frame;
pub mod parser;
pub mod responses;

pub use codec::Reframer;
pub use commands::*;
pub use crc::{check_crc16_a, crc16, crc16_a, crc16_x25};
pub use frame::Frame;
pub use responses::*;
