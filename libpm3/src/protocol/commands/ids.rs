// libpm3/src/protocol/commands/ids.rs

use std::fmt;

use num_enum::{FromPrimitive, IntoPrimitive};

/// Firmware command identifiers.
///
/// Only the ids this crate gives meaning to are named; every other 16-bit
/// value is carried by [`CommandId::Other`] so it can still be sent and
/// matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum CommandId {
    #[num_enum(catch_all)]
    Other(u16) = 0,

    Nack = 0x00FE,
    Ack = 0x00FF,

    DebugPrintString = 0x0100,
    DebugPrintIntegers = 0x0101,
    DebugPrintBytes = 0x0102,
    /// Wait-time extension: the device is still busy.
    Wtx = 0x0116,

    HfIso14443aReader = 0x0385,
    HfDropField = 0x0430,

    HfMifareEmlMemClr = 0x0601,
    HfMifareEmlMemSet = 0x0602,
    HfMifareEmlMemGet = 0x0603,
    HfMifareCSetBl = 0x0605,
    HfMifareCGetBl = 0x0606,
    HfMifareCIdent = 0x0607,
    HfMifareSimulate = 0x0610,
    HfMifareReadBl = 0x0620,
    HfMifareReadSc = 0x0621,
    HfMifareWriteBl = 0x0622,
    HfMifareChkKeys = 0x0623,
    HfMifareChkKeysFast = 0x0625,

    Unknown = 0xFFFF,
}

impl CommandId {
    pub fn as_u16(&self) -> u16 {
        (*self).into()
    }

    /// Frames the device sends for logging only.
    pub fn is_debug_print(&self) -> bool {
        matches!(
            self,
            CommandId::DebugPrintString | CommandId::DebugPrintIntegers | CommandId::DebugPrintBytes
        )
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandId::Other(v) => write!(f, "{:#06x}", v),
            named => write!(f, "{:?}({:#06x})", named, named.as_u16()),
        }
    }
}
