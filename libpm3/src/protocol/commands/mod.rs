// libpm3/src/protocol/commands/mod.rs

pub mod ids;

pub use ids::CommandId;

use crate::protocol::frame::Frame;
use crate::Result;

/// Outbound command together with the wire format used to carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ng {
        cmd: CommandId,
        data: Vec<u8>,
    },
    Mix {
        cmd: CommandId,
        args: [u64; 3],
        data: Vec<u8>,
    },
    Old {
        cmd: CommandId,
        args: [u64; 3],
        data: Vec<u8>,
    },
}

impl Command {
    pub fn ng(cmd: CommandId, data: impl Into<Vec<u8>>) -> Self {
        Command::Ng {
            cmd,
            data: data.into(),
        }
    }

    pub fn mix(cmd: CommandId, args: [u64; 3], data: impl Into<Vec<u8>>) -> Self {
        Command::Mix {
            cmd,
            args,
            data: data.into(),
        }
    }

    pub fn old(cmd: CommandId, args: [u64; 3], data: impl Into<Vec<u8>>) -> Self {
        Command::Old {
            cmd,
            args,
            data: data.into(),
        }
    }

    pub fn cmd(&self) -> CommandId {
        match self {
            Command::Ng { cmd, .. } | Command::Mix { cmd, .. } | Command::Old { cmd, .. } => *cmd,
        }
    }

    /// Numeric arguments; native NG commands have none and report zeros.
    pub fn args(&self) -> [u64; 3] {
        match self {
            Command::Ng { .. } => [0; 3],
            Command::Mix { args, .. } | Command::Old { args, .. } => *args,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Command::Ng { data, .. } | Command::Mix { data, .. } | Command::Old { data, .. } => {
                data
            }
        }
    }

    /// Encode into the wire bytes for this command's format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Command::Ng { cmd, data } => Frame::encode_ng(*cmd, data, true),
            Command::Mix { cmd, args, data } => Frame::encode_mix(*cmd, *args, data),
            Command::Old { cmd, args, data } => Frame::encode_old(*cmd, *args, data),
        }
    }

    /// Parse wire bytes produced by [`Command::encode`].
    pub fn decode(frame: &[u8]) -> Result<Self> {
        Frame::decode(frame)
    }
}
