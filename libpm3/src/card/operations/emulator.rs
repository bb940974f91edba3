// libpm3/src/card/operations/emulator.rs

//! The device's own emulator memory. No card and no keys involved.

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

pub fn eml_read_block(device: &mut Device<Connected>, block: usize) -> Result<Vec<u8>> {
    let cmd = Command::ng(CommandId::HfMifareEmlMemGet, vec![block_byte(block)?, 1]);
    RetryPolicy::default().run(|| {
        let resp = device.execute(&cmd, CommandId::HfMifareEmlMemGet, None)?;
        if resp.status() != Some(0) || resp.data().len() < MF_BLOCK_SIZE {
            return Err(Error::device_failure("read emulator block", block));
        }
        Ok(resp.data()[..MF_BLOCK_SIZE].to_vec())
    })
}

pub fn eml_read_sector(device: &mut Device<Connected>, sector: usize) -> ReadReport {
    read_blocks(sector_first_block(sector), MF_BLOCKS_PER_SECTOR, |block| {
        eml_read_block(device, block)
    })
}

pub fn eml_read_card(device: &mut Device<Connected>, sector_max: usize) -> Result<ReadReport> {
    ensure_sector_max(sector_max)?;
    Ok(read_blocks(0, sector_max * MF_BLOCKS_PER_SECTOR, |block| {
        eml_read_block(device, block)
    }))
}

/// Store one block. The firmware does not acknowledge this command, so
/// success means the frame was sent.
pub fn eml_write_block(device: &mut Device<Connected>, block: usize, data: &[u8]) -> Result<()> {
    ensure_data_len(data, MF_BLOCK_SIZE)?;
    let mut payload = vec![block_byte(block)?, 1, MF_BLOCK_SIZE as u8];
    payload.extend_from_slice(data);
    let cmd = Command::ng(CommandId::HfMifareEmlMemSet, payload);
    RetryPolicy::default().run(|| {
        device.clear_response_queue();
        device.send_command(&cmd)
    })
}

pub fn eml_write_sector(
    device: &mut Device<Connected>,
    sector: usize,
    data: &[u8],
) -> Result<WriteReport> {
    ensure_data_len(data, MF_SECTOR_SIZE)?;
    Ok(write_blocks(sector_first_block(sector), data, |block, bytes| {
        eml_write_block(device, block, bytes)
    }))
}

pub fn eml_write_card(
    device: &mut Device<Connected>,
    data: &[u8],
    sector_max: usize,
) -> Result<WriteReport> {
    ensure_sector_max(sector_max)?;
    ensure_data_len(data, sector_max * MF_SECTOR_SIZE)?;
    Ok(write_blocks(0, data, |block, bytes| {
        eml_write_block(device, block, bytes)
    }))
}

/// Zero the whole emulator memory.
pub fn eml_clear(device: &mut Device<Connected>) -> Result<()> {
    device.clear_response_queue();
    device.send_command(&Command::ng(CommandId::HfMifareEmlMemClr, Vec::new()))
}
