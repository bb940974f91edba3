// libpm3/src/protocol/responses/mod.rs

//! Device->host frames.
//!
//! NG:  `"PM3b" | len|ng (u16) | status (i16) | cmd (u16) | data | crc (u16)`
//! OLD: `cmd (u64) | arg0 | arg1 | arg2 | data[512]`, 544 bytes total
//!
//! When the ng bit is clear the first 24 data bytes of an NG frame are the
//! three legacy arguments, so [`ResponseNg::data`] skips them and
//! [`ResponseNg::arg`] reads them.

pub mod keys;
pub mod select;

use crate::buffer::ByteBuffer;
use crate::constants::{
    MIX_ARGS_LEN, NG_FLAG, NG_LENGTH_MASK, NG_POSTAMBLE_LEN, OLD_FRAME_DATA_OFFSET, OLD_FRAME_LEN,
    PM3_CMD_DATA_SIZE, RESPONSENG_HEADER_LEN, RESPONSENG_POSTAMBLE_MAGIC,
    RESPONSENG_PREAMBLE_MAGIC,
};
use crate::protocol::commands::CommandId;
use crate::protocol::parser::{le_i16_at, le_u16_at, le_u32_at, le_u64_at};
use crate::{Error, Result};

/// Inbound NG frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseNg {
    buf: ByteBuffer,
    ng: bool,
    status: i16,
    cmd: CommandId,
    crc: u16,
}

impl ResponseNg {
    /// Validate and wrap one complete NG frame.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let min = RESPONSENG_HEADER_LEN + NG_POSTAMBLE_LEN;
        if bytes.len() < min {
            return Err(Error::InvalidLength {
                expected: min,
                actual: bytes.len(),
            });
        }
        if le_u32_at(&bytes, 0)? != RESPONSENG_PREAMBLE_MAGIC {
            return Err(Error::FrameFormat("missing PM3b magic".into()));
        }
        let len_field = le_u16_at(&bytes, 4)?;
        let declared = (len_field & NG_LENGTH_MASK) as usize + min;
        if declared != bytes.len() {
            return Err(Error::InvalidLength {
                expected: declared,
                actual: bytes.len(),
            });
        }
        let status = le_i16_at(&bytes, 6)?;
        let cmd = CommandId::from(le_u16_at(&bytes, 8)?);
        let crc = le_u16_at(&bytes, bytes.len() - NG_POSTAMBLE_LEN)?;
        Ok(Self {
            buf: ByteBuffer::from(bytes),
            ng: len_field & NG_FLAG != 0,
            status,
            cmd,
            crc,
        })
    }

    /// Build the wire bytes of an NG response. Without `crc` the `"b3"`
    /// postamble is written, as the firmware does over USB.
    pub fn encode(
        cmd: CommandId,
        status: i16,
        ng: bool,
        data: &[u8],
        crc: Option<u16>,
    ) -> Result<Vec<u8>> {
        if data.len() > PM3_CMD_DATA_SIZE {
            return Err(Error::InvalidLength {
                expected: PM3_CMD_DATA_SIZE,
                actual: data.len(),
            });
        }
        let mut len_field = data.len() as u16;
        if ng {
            len_field |= NG_FLAG;
        }
        let mut out = Vec::with_capacity(RESPONSENG_HEADER_LEN + data.len() + NG_POSTAMBLE_LEN);
        out.extend_from_slice(&RESPONSENG_PREAMBLE_MAGIC.to_le_bytes());
        out.extend_from_slice(&len_field.to_le_bytes());
        out.extend_from_slice(&status.to_le_bytes());
        out.extend_from_slice(&cmd.as_u16().to_le_bytes());
        out.extend_from_slice(data);
        out.extend_from_slice(&crc.unwrap_or(RESPONSENG_POSTAMBLE_MAGIC).to_le_bytes());
        Ok(out)
    }

    /// Build an NG response in the legacy argument layout (ng bit clear).
    pub fn encode_mix(cmd: CommandId, status: i16, args: [u64; 3], data: &[u8]) -> Result<Vec<u8>> {
        let mut payload = Vec::with_capacity(MIX_ARGS_LEN + data.len());
        for arg in args {
            payload.extend_from_slice(&arg.to_le_bytes());
        }
        payload.extend_from_slice(data);
        Self::encode(cmd, status, false, &payload, None)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn ng(&self) -> bool {
        self.ng
    }

    pub fn status(&self) -> i16 {
        self.status
    }

    pub fn cmd(&self) -> CommandId {
        self.cmd
    }

    pub fn crc(&self) -> u16 {
        self.crc
    }

    pub fn data(&self) -> &[u8] {
        let end = self.buf.len() - NG_POSTAMBLE_LEN;
        let skip = if self.ng { 0 } else { MIX_ARGS_LEN };
        let start = (RESPONSENG_HEADER_LEN + skip).min(end);
        &self.buf[start..end]
    }

    /// Legacy argument `index` (u64 at `10 + 8 * index`).
    pub fn arg(&self, index: usize) -> Result<u64> {
        le_u64_at(&self.buf[..self.buf.len() - NG_POSTAMBLE_LEN], RESPONSENG_HEADER_LEN + 8 * index)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }
}

/// Inbound legacy frame, always 544 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOld {
    buf: ByteBuffer,
}

impl ResponseOld {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != OLD_FRAME_LEN {
            return Err(Error::InvalidLength {
                expected: OLD_FRAME_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            buf: ByteBuffer::from(bytes),
        })
    }

    /// Build the wire bytes of a legacy response.
    pub fn encode(cmd: CommandId, args: [u64; 3], data: &[u8]) -> Result<Vec<u8>> {
        if data.len() > PM3_CMD_DATA_SIZE {
            return Err(Error::InvalidLength {
                expected: PM3_CMD_DATA_SIZE,
                actual: data.len(),
            });
        }
        let mut out = vec![0u8; OLD_FRAME_LEN];
        out[0..8].copy_from_slice(&(cmd.as_u16() as u64).to_le_bytes());
        for (i, arg) in args.iter().enumerate() {
            let at = 8 + 8 * i;
            out[at..at + 8].copy_from_slice(&arg.to_le_bytes());
        }
        out[OLD_FRAME_DATA_OFFSET..OLD_FRAME_DATA_OFFSET + data.len()].copy_from_slice(data);
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn cmd(&self) -> CommandId {
        CommandId::from(u16::from_le_bytes([self.buf[0], self.buf[1]]))
    }

    pub fn arg(&self, index: usize) -> Result<u64> {
        le_u64_at(&self.buf[..OLD_FRAME_DATA_OFFSET], 8 + 8 * index)
    }

    pub fn data(&self) -> &[u8] {
        &self.buf[OLD_FRAME_DATA_OFFSET..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }
}

/// A complete frame received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ng(ResponseNg),
    Old(ResponseOld),
}

impl Response {
    /// Classify one complete frame by its leading magic.
    pub fn decode(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() >= 4 && le_u32_at(&bytes, 0)? == RESPONSENG_PREAMBLE_MAGIC {
            Ok(Response::Ng(ResponseNg::from_bytes(bytes)?))
        } else {
            Ok(Response::Old(ResponseOld::from_bytes(bytes)?))
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Response::Ng(r) => r.len(),
            Response::Old(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cmd(&self) -> CommandId {
        match self {
            Response::Ng(r) => r.cmd(),
            Response::Old(r) => r.cmd(),
        }
    }

    pub fn arg(&self, index: usize) -> Result<u64> {
        match self {
            Response::Ng(r) => r.arg(index),
            Response::Old(r) => r.arg(index),
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Response::Ng(r) => r.data(),
            Response::Old(r) => r.data(),
        }
    }

    /// Device status; legacy frames carry none.
    pub fn status(&self) -> Option<i16> {
        match self {
            Response::Ng(r) => Some(r.status()),
            Response::Old(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Response::Ng(r) => r.as_bytes(),
            Response::Old(r) => r.as_bytes(),
        }
    }
}
