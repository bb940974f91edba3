// libpm3/src/card/operations/mod.rs

//! MIFARE Classic operations against a connected device.
//!
//! Single-unit operations retry a bounded number of times and return the
//! error of the last attempt. Bulk operations never stop at the first bad
//! unit: they return whatever they managed to transfer, per-block success
//! flags and the list of failures.

pub mod emulator;
pub mod keys;
pub mod magic;
pub mod read;
pub mod simulate;
pub mod write;

use std::fmt;

use log::warn;

use crate::card::classic::CardImage;
use crate::constants::MF_BLOCK_SIZE;
use crate::{Error, Result};

pub use emulator::{
    eml_clear, eml_read_block, eml_read_card, eml_read_sector, eml_write_block, eml_write_card,
    eml_write_sector,
};
pub use keys::{auth_block, check_keys_fast};
pub use magic::{
    read_block_gen1a, read_card_gen1a, read_sector_gen1a, write_block_gen1a, write_card_gen1a,
    write_sector_gen1a,
};
pub use read::{read_block, read_block_key_ba, read_card_by_keys, read_sector, read_sector_key_ba};
pub use simulate::{SimulateOptions, simulate_card};
pub use write::{
    write_block, write_block_key_ba, write_card_by_keys, write_sector, write_sector_key_ba,
};

/// Addressing unit a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Block(usize),
    Sector(usize),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Block(b) => write!(f, "block {}", b),
            Unit::Sector(s) => write!(f, "sector {}", s),
        }
    }
}

/// One unit a bulk operation gave up on.
#[derive(Debug)]
pub struct UnitFailure {
    pub unit: Unit,
    pub error: Error,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.unit, self.error)
    }
}

/// Best-effort result of a multi-block read. Blocks that failed stay
/// zero-filled in `data`.
#[derive(Debug)]
pub struct ReadReport {
    pub data: Vec<u8>,
    /// One flag per block, in block order.
    pub success: Vec<bool>,
    pub errors: Vec<UnitFailure>,
}

impl ReadReport {
    pub(crate) fn new(blocks: usize) -> Self {
        Self {
            data: vec![0; blocks * MF_BLOCK_SIZE],
            success: vec![false; blocks],
            errors: Vec::new(),
        }
    }

    pub(crate) fn set_block(&mut self, index: usize, bytes: &[u8]) {
        let at = index * MF_BLOCK_SIZE;
        let n = bytes.len().min(MF_BLOCK_SIZE);
        self.data[at..at + n].copy_from_slice(&bytes[..n]);
        self.success[index] = true;
    }

    pub(crate) fn fail(&mut self, unit: Unit, error: Error) {
        warn!("{}: {}", unit, error);
        self.errors.push(UnitFailure { unit, error });
    }

    pub(crate) fn append(&mut self, other: ReadReport) {
        self.data.extend(other.data);
        self.success.extend(other.success);
        self.errors.extend(other.errors);
    }

    /// Every block read.
    pub fn is_complete(&self) -> bool {
        self.success.iter().all(|s| *s)
    }

    pub fn into_image(self) -> Result<CardImage> {
        CardImage::from_bytes(&self.data)
    }
}

/// Best-effort result of a multi-block write.
#[derive(Debug, Default)]
pub struct WriteReport {
    /// One flag per block, in block order.
    pub success: Vec<bool>,
    pub errors: Vec<UnitFailure>,
}

impl WriteReport {
    pub(crate) fn new(blocks: usize) -> Self {
        Self {
            success: vec![false; blocks],
            errors: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, unit: Unit, error: Error) {
        warn!("{}: {}", unit, error);
        self.errors.push(UnitFailure { unit, error });
    }

    pub(crate) fn append(&mut self, other: WriteReport) {
        self.success.extend(other.success);
        self.errors.extend(other.errors);
    }

    pub fn is_complete(&self) -> bool {
        self.success.iter().all(|s| *s)
    }
}

/// Read `count` blocks starting at `first`, one call per block.
pub(crate) fn read_blocks(
    first: usize,
    count: usize,
    mut read: impl FnMut(usize) -> Result<Vec<u8>>,
) -> ReadReport {
    let mut report = ReadReport::new(count);
    for i in 0..count {
        match read(first + i) {
            Ok(bytes) => report.set_block(i, &bytes),
            Err(e) => report.fail(Unit::Block(first + i), e),
        }
    }
    report
}

/// Write `data` block by block starting at `first`.
pub(crate) fn write_blocks(
    first: usize,
    data: &[u8],
    mut write: impl FnMut(usize, &[u8]) -> Result<()>,
) -> WriteReport {
    let blocks: Vec<&[u8]> = data.chunks(MF_BLOCK_SIZE).collect();
    let mut report = WriteReport::new(blocks.len());
    for (i, block) in blocks.into_iter().enumerate() {
        match write(first + i, block) {
            Ok(()) => report.success[i] = true,
            Err(e) => report.fail(Unit::Block(first + i), e),
        }
    }
    report
}

pub(crate) fn ensure_data_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(Error::InvalidLength {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Block number as the single byte the firmware takes.
pub(crate) fn block_byte(block: usize) -> Result<u8> {
    u8::try_from(block)
        .map_err(|_| Error::InvalidArgument(format!("block must be 0..=255, got {}", block)))
}

pub(crate) fn ensure_sector_max(sector_max: usize) -> Result<()> {
    if sector_max == 0 || sector_max > crate::protocol::responses::keys::CHKKEYS_FAST_MAX_SECTORS {
        return Err(Error::InvalidArgument(format!(
            "sector_max must be 1..=40, got {}",
            sector_max
        )));
    }
    Ok(())
}
