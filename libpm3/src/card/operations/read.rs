// libpm3/src/card/operations/read.rs

use log::debug;

use crate::card::classic::{KeyType, MfKey, keys_uniq, sector_first_block};
use crate::card::operations::keys::{auth_block, search_keys_or_none};
use crate::card::operations::{ReadReport, Unit, block_byte, ensure_sector_max};
use crate::constants::{MF_BLOCK_SIZE, MF_BLOCKS_PER_SECTOR, MF_SECTOR_SIZE};
use crate::device::{Connected, Device};
use crate::protocol::{Command, CommandId};
use crate::utils::RetryPolicy;
use crate::{Error, Result};

/// Read one block with an explicit key.
pub fn read_block(
    device: &mut Device<Connected>,
    block: usize,
    key_type: KeyType,
    key: &MfKey,
) -> Result<Vec<u8>> {
    let mut payload = vec![block_byte(block)?, key_type.as_u8()];
    payload.extend_from_slice(key.as_bytes());
    let cmd = Command::ng(CommandId::HfMifareReadBl, payload);
    RetryPolicy::default().run(|| {
        let resp = device.execute(&cmd, CommandId::HfMifareReadBl, None)?;
        if resp.status() != Some(0) || resp.data().len() < MF_BLOCK_SIZE {
            return Err(Error::device_failure("read block", block));
        }
        Ok(resp.data()[..MF_BLOCK_SIZE].to_vec())
    })
}

/// Read one block trying Key B first, then Key A.
pub fn read_block_key_ba(
    device: &mut Device<Connected>,
    block: usize,
    ka: Option<&MfKey>,
    kb: Option<&MfKey>,
) -> Result<Vec<u8>> {
    let mut last = None;
    for key_type in KeyType::B_THEN_A {
        let key = match key_type {
            KeyType::A => ka,
            KeyType::B => kb,
        };
        let Some(key) = key else { continue };
        match read_block(device, block, key_type, key) {
            Ok(data) => return Ok(data),
            Err(e) => last = Some(e),
        }
    }
    Err(last.unwrap_or(Error::KeyNotFound {
        sector: block / MF_BLOCKS_PER_SECTOR,
    }))
}

/// Read a whole sector in one exchange.
pub fn read_sector(
    device: &mut Device<Connected>,
    sector: usize,
    key_type: KeyType,
    key: &MfKey,
) -> Result<Vec<u8>> {
    let cmd = Command::mix(
        CommandId::HfMifareReadSc,
        [sector as u64, key_type.as_u8() as u64, 0],
        key.as_bytes().to_vec(),
    );
    RetryPolicy::default().run(|| {
        let resp = device.execute(&cmd, CommandId::Ack, None)?;
        if resp.arg(0)? & 0xFF == 0 || resp.data().len() < MF_SECTOR_SIZE {
            return Err(Error::device_failure("read sector", sector));
        }
        Ok(resp.data()[..MF_SECTOR_SIZE].to_vec())
    })
}

/// Read a sector with whichever of its keys authenticate, Key B first.
///
/// Blocks one key could not read are retried with the other. Every key
/// that authenticated is written into the trailer of the returned data,
/// since cards usually mask keys on read.
pub fn read_sector_key_ba(
    device: &mut Device<Connected>,
    sector: usize,
    ka: Option<&MfKey>,
    kb: Option<&MfKey>,
) -> ReadReport {
    let first = sector_first_block(sector);
    let mut report = ReadReport::new(MF_BLOCKS_PER_SECTOR);
    let mut block_errors: Vec<Option<Error>> = (0..MF_BLOCKS_PER_SECTOR).map(|_| None).collect();
    let mut authenticated: Vec<(KeyType, MfKey)> = Vec::new();
    let mut auth_error = None;

    for key_type in KeyType::B_THEN_A {
        let key = match key_type {
            KeyType::A => ka,
            KeyType::B => kb,
        };
        let Some(key) = key else { continue };
        if let Err(e) = auth_block(device, first, key_type, key) {
            debug!("sector {} key {:?} rejected: {}", sector, key_type, e);
            auth_error = Some(e);
            continue;
        }
        authenticated.push((key_type, *key));
        for i in 0..MF_BLOCKS_PER_SECTOR {
            if report.success[i] {
                continue;
            }
            match read_block(device, first + i, key_type, key) {
                Ok(data) => {
                    report.set_block(i, &data);
                    block_errors[i] = None;
                }
                Err(e) => block_errors[i] = Some(e),
            }
        }
    }

    for (key_type, key) in &authenticated {
        let at = key_type.trailer_offset();
        report.data[at..at + key.as_bytes().len()].copy_from_slice(key.as_bytes());
    }

    if authenticated.is_empty() {
        let error = auth_error.unwrap_or(Error::KeyNotFound { sector });
        report.fail(Unit::Sector(sector), error);
        return report;
    }
    for (i, error) in block_errors.into_iter().enumerate() {
        if let Some(error) = error {
            report.fail(Unit::Block(first + i), error);
        }
    }
    report
}

/// Search keys once, then read every sector with what was found.
pub fn read_card_by_keys(
    device: &mut Device<Connected>,
    keys: &[MfKey],
    sector_max: usize,
) -> Result<ReadReport> {
    ensure_sector_max(sector_max)?;
    let keys = keys_uniq(keys);
    if keys.is_empty() {
        return Err(Error::InvalidArgument("no candidate keys".into()));
    }
    let found = search_keys_or_none(device, &keys, sector_max);
    let mut report = ReadReport::new(0);
    for sector in 0..sector_max {
        let ka = found.get(sector, KeyType::A);
        let kb = found.get(sector, KeyType::B);
        report.append(read_sector_key_ba(device, sector, ka.as_ref(), kb.as_ref()));
    }
    Ok(report)
}
