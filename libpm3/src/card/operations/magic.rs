// libpm3/src/card/operations/magic.rs

//! Gen1a "magic" cards: backdoor commands that skip authentication.

use crate::card::classic::sector_first_block;
use crate::card::operations::{
    ReadReport, WriteReport, block_byte, ensure_data_len, ensure_sector_max, read_blocks,
    write_blocks,
};
use crate::constants::{MF_BLOCK_SIZE, MF_BLOCKS_PER_SECTOR, MF_SECTOR_SIZE};
use crate::device::{Connected, Device};
use crate::protocol::{Command, CommandId};
use crate::utils::RetryPolicy;
use crate::{Error, Result};

/// Wake-up, halt, init and field off around a single block access.
pub const MAGIC_SINGLE: u64 = 0x1E;
/// Erase the card before writing.
pub const MAGIC_WIPE: u64 = 0x40;

pub fn read_block_gen1a(device: &mut Device<Connected>, block: usize) -> Result<Vec<u8>> {
    let cmd = Command::mix(
        CommandId::HfMifareCGetBl,
        [MAGIC_SINGLE, block_byte(block)? as u64, 0],
        Vec::new(),
    );
    RetryPolicy::default().run(|| {
        let resp = device.execute(&cmd, CommandId::Ack, None)?;
        if resp.arg(0)? & 0xFF == 0 || resp.data().len() < MF_BLOCK_SIZE {
            return Err(Error::device_failure("read magic block", block));
        }
        Ok(resp.data()[..MF_BLOCK_SIZE].to_vec())
    })
}

pub fn read_sector_gen1a(device: &mut Device<Connected>, sector: usize) -> ReadReport {
    read_blocks(sector_first_block(sector), MF_BLOCKS_PER_SECTOR, |block| {
        read_block_gen1a(device, block)
    })
}

pub fn read_card_gen1a(device: &mut Device<Connected>, sector_max: usize) -> Result<ReadReport> {
    ensure_sector_max(sector_max)?;
    Ok(read_blocks(0, sector_max * MF_BLOCKS_PER_SECTOR, |block| {
        read_block_gen1a(device, block)
    }))
}

/// Write one block. With `wipe` the card is erased first.
pub fn write_block_gen1a(
    device: &mut Device<Connected>,
    block: usize,
    data: &[u8],
    wipe: bool,
) -> Result<()> {
    ensure_data_len(data, MF_BLOCK_SIZE)?;
    let flags = MAGIC_SINGLE | if wipe { MAGIC_WIPE } else { 0 };
    let cmd = Command::mix(
        CommandId::HfMifareCSetBl,
        [flags, block_byte(block)? as u64, 0],
        data.to_vec(),
    );
    RetryPolicy::default().run(|| {
        let resp = device.execute(&cmd, CommandId::Ack, None)?;
        if resp.arg(0)? & 0xFF == 0 {
            return Err(Error::device_failure("write magic block", block));
        }
        Ok(())
    })
}

pub fn write_sector_gen1a(
    device: &mut Device<Connected>,
    sector: usize,
    data: &[u8],
) -> Result<WriteReport> {
    ensure_data_len(data, MF_SECTOR_SIZE)?;
    Ok(write_blocks(sector_first_block(sector), data, |block, bytes| {
        write_block_gen1a(device, block, bytes, false)
    }))
}

pub fn write_card_gen1a(
    device: &mut Device<Connected>,
    data: &[u8],
    sector_max: usize,
) -> Result<WriteReport> {
    ensure_sector_max(sector_max)?;
    ensure_data_len(data, sector_max * MF_SECTOR_SIZE)?;
    Ok(write_blocks(0, data, |block, bytes| {
        write_block_gen1a(device, block, bytes, false)
    }))
}
