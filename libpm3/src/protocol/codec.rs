// libpm3/src/protocol/codec.rs

use log::{trace, warn};

use crate::Result;
use crate::constants::{
    NG_LENGTH_MASK, NG_POSTAMBLE_LEN, OLD_FRAME_LEN, RESPONSENG_HEADER_LEN,
    RESPONSENG_PREAMBLE_MAGIC,
};

use super::commands::Command;
use super::responses::Response;

/// Encode a Command into its full wire frame.
pub fn encode_command_frame(cmd: &Command) -> Result<Vec<u8>> {
    cmd.encode()
}

/// Decode one complete inbound frame.
pub fn decode_response_frame(frame: &[u8]) -> Result<Response> {
    Response::decode(frame.to_vec())
}

/// Splits the inbound byte stream into complete response frames.
///
/// Chunks may end anywhere, including inside a header. Bytes that do not
/// start with the NG magic are taken as a 544-byte legacy frame.
#[derive(Debug, Default, Clone)]
pub struct Reframer {
    buf: Vec<u8>,
}

impl Reframer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a received chunk and return every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Response> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(len) = self.next_frame_len() {
            if self.buf.len() < len {
                break;
            }
            let frame: Vec<u8> = self.buf.drain(..len).collect();
            trace!("reframer: frame of {} bytes, {} pending", len, self.buf.len());
            match Response::decode(frame) {
                Ok(resp) => out.push(resp),
                Err(e) => warn!("reframer: dropping malformed frame: {}", e),
            }
        }
        out
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Total length of the frame at the head of the buffer, or `None` while
    /// the NG length field has not arrived yet.
    fn next_frame_len(&self) -> Option<usize> {
        let magic = RESPONSENG_PREAMBLE_MAGIC.to_le_bytes();
        if self.buf.is_empty() || (self.buf.len() < magic.len() && magic.starts_with(&self.buf)) {
            return None;
        }
        if self.buf.len() >= magic.len() && self.buf[..magic.len()] == magic {
            if self.buf.len() < 6 {
                return None;
            }
            let len_field = u16::from_le_bytes([self.buf[4], self.buf[5]]);
            Some((len_field & NG_LENGTH_MASK) as usize + RESPONSENG_HEADER_LEN + NG_POSTAMBLE_LEN)
        } else {
            Some(OLD_FRAME_LEN)
        }
    }
}
