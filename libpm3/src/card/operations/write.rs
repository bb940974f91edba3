// libpm3/src/card/operations/write.rs

use crate::card::classic::{
    KeyType, MfKey, TRAILER_ACL_OFFSET, is_valid_acl, keys_uniq, sector_first_block,
};
use crate::card::operations::keys::search_keys_or_none;
use crate::card::operations::{
    Unit, WriteReport, block_byte, ensure_data_len, ensure_sector_max, write_blocks,
};
use crate::constants::{MF_BLOCK_SIZE, MF_BLOCKS_PER_SECTOR, MF_KEY_SIZE, MF_SECTOR_SIZE};
use crate::device::{Connected, Device};
use crate::protocol::{Command, CommandId};
use crate::utils::RetryPolicy;
use crate::{Error, Result};

/// Write one block with an explicit key.
pub fn write_block(
    device: &mut Device<Connected>,
    block: usize,
    key_type: KeyType,
    key: &MfKey,
    data: &[u8],
) -> Result<()> {
    ensure_data_len(data, MF_BLOCK_SIZE)?;
    // key | 4 reserved bytes | block data
    let mut payload = Vec::with_capacity(MF_KEY_SIZE + 4 + MF_BLOCK_SIZE);
    payload.extend_from_slice(key.as_bytes());
    payload.extend_from_slice(&[0; 4]);
    payload.extend_from_slice(data);
    let cmd = Command::mix(
        CommandId::HfMifareWriteBl,
        [block_byte(block)? as u64, key_type.as_u8() as u64, 0],
        payload,
    );
    RetryPolicy::default().run(|| {
        let resp = device.execute(&cmd, CommandId::Ack, None)?;
        if resp.arg(0)? & 0xFF == 0 {
            return Err(Error::device_failure("write block", block));
        }
        Ok(())
    })
}

/// Write one block trying Key B first, then Key A. Returns the key type
/// that worked.
pub fn write_block_key_ba(
    device: &mut Device<Connected>,
    block: usize,
    ka: Option<&MfKey>,
    kb: Option<&MfKey>,
    data: &[u8],
) -> Result<KeyType> {
    ensure_data_len(data, MF_BLOCK_SIZE)?;
    let mut last = None;
    for key_type in KeyType::B_THEN_A {
        let key = match key_type {
            KeyType::A => ka,
            KeyType::B => kb,
        };
        let Some(key) = key else { continue };
        match write_block(device, block, key_type, key, data) {
            Ok(()) => return Ok(key_type),
            Err(e) => last = Some(e),
        }
    }
    Err(last.unwrap_or(Error::KeyNotFound {
        sector: block / MF_BLOCKS_PER_SECTOR,
    }))
}

fn check_sector_data(sector: usize, data: &[u8]) -> Result<()> {
    ensure_data_len(data, MF_SECTOR_SIZE)?;
    if !is_valid_acl(&data[TRAILER_ACL_OFFSET..TRAILER_ACL_OFFSET + 3]) {
        return Err(Error::InvalidAcl { sector });
    }
    Ok(())
}

/// Write a sector with one key. The trailer's access bits are checked
/// before anything is written.
pub fn write_sector(
    device: &mut Device<Connected>,
    sector: usize,
    key_type: KeyType,
    key: &MfKey,
    data: &[u8],
) -> Result<WriteReport> {
    check_sector_data(sector, data)?;
    Ok(write_blocks(sector_first_block(sector), data, |block, bytes| {
        write_block(device, block, key_type, key, bytes)
    }))
}

/// Write a sector trying Key B first for every block, then Key A for the
/// blocks still missing.
pub fn write_sector_key_ba(
    device: &mut Device<Connected>,
    sector: usize,
    ka: Option<&MfKey>,
    kb: Option<&MfKey>,
    data: &[u8],
) -> Result<WriteReport> {
    check_sector_data(sector, data)?;
    let first = sector_first_block(sector);
    let mut report = WriteReport::new(MF_BLOCKS_PER_SECTOR);
    if ka.is_none() && kb.is_none() {
        report.fail(Unit::Sector(sector), Error::KeyNotFound { sector });
        return Ok(report);
    }
    let mut block_errors: Vec<Option<Error>> = (0..MF_BLOCKS_PER_SECTOR).map(|_| None).collect();
    for key_type in KeyType::B_THEN_A {
        let key = match key_type {
            KeyType::A => ka,
            KeyType::B => kb,
        };
        let Some(key) = key else { continue };
        for (i, bytes) in data.chunks(MF_BLOCK_SIZE).enumerate() {
            if report.success[i] {
                continue;
            }
            match write_block(device, first + i, key_type, key, bytes) {
                Ok(()) => {
                    report.success[i] = true;
                    block_errors[i] = None;
                }
                Err(e) => block_errors[i] = Some(e),
            }
        }
    }
    for (i, error) in block_errors.into_iter().enumerate() {
        if let Some(error) = error {
            report.fail(Unit::Block(first + i), error);
        }
    }
    Ok(report)
}

/// Search keys once, then write every sector of `data` with them.
///
/// A sector with bad access bits is skipped and reported; the others are
/// still written.
pub fn write_card_by_keys(
    device: &mut Device<Connected>,
    keys: &[MfKey],
    data: &[u8],
    sector_max: usize,
) -> Result<WriteReport> {
    ensure_sector_max(sector_max)?;
    ensure_data_len(data, sector_max * MF_SECTOR_SIZE)?;
    let keys = keys_uniq(keys);
    if keys.is_empty() {
        return Err(Error::InvalidArgument("no candidate keys".into()));
    }
    let found = search_keys_or_none(device, &keys, sector_max);
    let mut report = WriteReport::default();
    for (sector, sector_data) in data.chunks(MF_SECTOR_SIZE).enumerate() {
        let ka = found.get(sector, KeyType::A);
        let kb = found.get(sector, KeyType::B);
        match write_sector_key_ba(device, sector, ka.as_ref(), kb.as_ref(), sector_data) {
            Ok(r) => report.append(r),
            Err(e) => {
                let mut skipped = WriteReport::new(MF_BLOCKS_PER_SECTOR);
                skipped.fail(Unit::Sector(sector), e);
                report.append(skipped);
            }
        }
    }
    Ok(report)
}
