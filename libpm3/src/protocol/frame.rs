// libpm3/src/protocol/frame.rs

use crate::constants::{
    COMMANDNG_HEADER_LEN, COMMANDNG_POSTAMBLE_MAGIC, COMMANDNG_PREAMBLE_MAGIC, MIX_ARGS_LEN,
    NG_FLAG, NG_LENGTH_MASK, NG_POSTAMBLE_LEN, OLD_FRAME_DATA_OFFSET, OLD_FRAME_LEN,
    PM3_CMD_DATA_SIZE, PM3_CMD_DATA_SIZE_MIX,
};
use crate::protocol::commands::{Command, CommandId};
use crate::protocol::parser::{le_u16_at, le_u32_at, le_u64_at};
use crate::{Error, Result};

/// Host->device wire formats.
///
/// NG:  `"PM3a" | len|ng (u16) | cmd (u16) | payload[0..512] | "a3"`
/// Mix: NG with the ng bit cleared and a payload of `arg0 | arg1 | arg2 | data[0..488]`
/// OLD: `cmd (u64) | arg0 | arg1 | arg2 | data`, zero padded to 544 bytes
///
/// Every multi-byte field is little-endian.
pub struct Frame;

impl Frame {
    /// Encode an NG frame. `ng` sets the native-NG bit in the length field.
    pub fn encode_ng(cmd: CommandId, payload: &[u8], ng: bool) -> Result<Vec<u8>> {
        if payload.len() > PM3_CMD_DATA_SIZE {
            return Err(Error::InvalidLength {
                expected: PM3_CMD_DATA_SIZE,
                actual: payload.len(),
            });
        }
        let mut len_field = payload.len() as u16;
        if ng {
            len_field |= NG_FLAG;
        }

        let mut out = Vec::with_capacity(COMMANDNG_HEADER_LEN + payload.len() + NG_POSTAMBLE_LEN);
        out.extend_from_slice(&COMMANDNG_PREAMBLE_MAGIC.to_le_bytes());
        out.extend_from_slice(&len_field.to_le_bytes());
        out.extend_from_slice(&cmd.as_u16().to_le_bytes());
        out.extend_from_slice(payload);
        out.extend_from_slice(&COMMANDNG_POSTAMBLE_MAGIC.to_le_bytes());
        Ok(out)
    }

    /// Encode a Mix frame: three u64 arguments followed by up to 488 bytes.
    pub fn encode_mix(cmd: CommandId, args: [u64; 3], data: &[u8]) -> Result<Vec<u8>> {
        if data.len() > PM3_CMD_DATA_SIZE_MIX {
            return Err(Error::InvalidLength {
                expected: PM3_CMD_DATA_SIZE_MIX,
                actual: data.len(),
            });
        }
        let mut payload = Vec::with_capacity(MIX_ARGS_LEN + data.len());
        for arg in args {
            payload.extend_from_slice(&arg.to_le_bytes());
        }
        payload.extend_from_slice(data);
        Self::encode_ng(cmd, &payload, false)
    }

    /// Encode a fixed 544-byte legacy frame.
    pub fn encode_old(cmd: CommandId, args: [u64; 3], data: &[u8]) -> Result<Vec<u8>> {
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

    /// Decode a host->device frame back into the command it carries.
    ///
    /// OLD frames keep their zero padding in `data` since the format does
    /// not record the payload length.
    pub fn decode(frame: &[u8]) -> Result<Command> {
        if frame.len() >= 4 && le_u32_at(frame, 0)? == COMMANDNG_PREAMBLE_MAGIC {
            let len_field = le_u16_at(frame, 4)?;
            let payload_len = (len_field & NG_LENGTH_MASK) as usize;
            let required = COMMANDNG_HEADER_LEN + payload_len + NG_POSTAMBLE_LEN;
            if frame.len() != required {
                return Err(Error::InvalidLength {
                    expected: required,
                    actual: frame.len(),
                });
            }
            if le_u16_at(frame, required - NG_POSTAMBLE_LEN)? != COMMANDNG_POSTAMBLE_MAGIC {
                return Err(Error::FrameFormat("invalid postamble".into()));
            }
            let cmd = CommandId::from(le_u16_at(frame, 6)?);
            let payload = &frame[COMMANDNG_HEADER_LEN..COMMANDNG_HEADER_LEN + payload_len];
            if len_field & NG_FLAG != 0 {
                return Ok(Command::Ng {
                    cmd,
                    data: payload.to_vec(),
                });
            }
            if payload.len() < MIX_ARGS_LEN {
                return Err(Error::FrameFormat(format!(
                    "mix payload of {} bytes cannot hold arguments",
                    payload.len()
                )));
            }
            let args = [
                le_u64_at(payload, 0)?,
                le_u64_at(payload, 8)?,
                le_u64_at(payload, 16)?,
            ];
            return Ok(Command::Mix {
                cmd,
                args,
                data: payload[MIX_ARGS_LEN..].to_vec(),
            });
        }

        if frame.len() != OLD_FRAME_LEN {
            return Err(Error::InvalidLength {
                expected: OLD_FRAME_LEN,
                actual: frame.len(),
            });
        }
        let cmd = CommandId::from(le_u64_at(frame, 0)? as u16);
        let args = [
            le_u64_at(frame, 8)?,
            le_u64_at(frame, 16)?,
            le_u64_at(frame, 24)?,
        ];
        Ok(Command::Old {
            cmd,
            args,
            data: frame[OLD_FRAME_DATA_OFFSET..].to_vec(),
        })
    }
}
