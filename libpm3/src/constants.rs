// libpm3/src/constants.rs
//! Common protocol constants used across the crate

/// Host->device NG frame magic "PM3a" (little-endian u32)
pub const COMMANDNG_PREAMBLE_MAGIC: u32 = 0x61334D50;

/// Host->device NG frame postamble "a3"
pub const COMMANDNG_POSTAMBLE_MAGIC: u16 = 0x3361;

/// Device->host NG frame magic "PM3b" (little-endian u32)
pub const RESPONSENG_PREAMBLE_MAGIC: u32 = 0x62334D50;

/// Device->host NG postamble "b3", sent in place of a CRC
pub const RESPONSENG_POSTAMBLE_MAGIC: u16 = 0x3362;

/// Maximum data bytes carried by any frame
pub const PM3_CMD_DATA_SIZE: usize = 512;

/// Maximum data bytes after the three Mix-format arguments
pub const PM3_CMD_DATA_SIZE_MIX: usize = PM3_CMD_DATA_SIZE - 3 * 8;

/// Outbound NG header: magic(4) + length(2) + cmd(2)
pub const COMMANDNG_HEADER_LEN: usize = 8;

/// Inbound NG header: magic(4) + length(2) + status(2) + cmd(2)
pub const RESPONSENG_HEADER_LEN: usize = 10;

/// Length of the trailing postamble/CRC on NG frames
pub const NG_POSTAMBLE_LEN: usize = 2;

/// Fixed length of a legacy (OLD) frame in either direction
pub const OLD_FRAME_LEN: usize = 544;

/// Offset of the data section inside an OLD frame
pub const OLD_FRAME_DATA_OFFSET: usize = 32;

/// Bytes taken by the three u64 arguments of a Mix/OLD payload
pub const MIX_ARGS_LEN: usize = 24;

/// Bit in the NG length field marking a native NG payload
pub const NG_FLAG: u16 = 0x8000;

/// Mask of the payload length inside the NG length field
pub const NG_LENGTH_MASK: u16 = 0x7FFF;

/// Known (vendor id, product id) pairs of Proxmark3 USB-serial devices.
pub const KNOWN_USB_IDS: [(u16, u16); 3] = [(0x2D2D, 0x504D), (0x9AC4, 0x4B8F), (0x1D6B, 0x0106)];

/// MIFARE Classic sizes
pub const MF_BLOCK_SIZE: usize = 16;
pub const MF_BLOCKS_PER_SECTOR: usize = 4;
pub const MF_SECTOR_SIZE: usize = MF_BLOCK_SIZE * MF_BLOCKS_PER_SECTOR;
pub const MF_KEY_SIZE: usize = 6;
pub const MF_DEFAULT_SECTOR_MAX: usize = 16;

/// Largest multiple of the key size that fits one frame
pub const MF_KEYS_CHUNK_SIZE: usize = PM3_CMD_DATA_SIZE - PM3_CMD_DATA_SIZE % MF_KEY_SIZE;
