// libpm3/src/card/operations/keys.rs

use log::{debug, warn};

use crate::card::classic::{KeyType, MfKey, SectorKeys, keys_uniq};
use crate::card::operations::{block_byte, ensure_sector_max};
use crate::constants::{MF_KEY_SIZE, MF_KEYS_CHUNK_SIZE};
use crate::device::{Connected, Device};
use crate::protocol::responses::keys::decode_check_keys_fast;
use crate::protocol::{Command, CommandId};
use crate::utils::CHECK_KEYS_TIMEOUT_MS;
use crate::{Error, Result};

// Strategies of the fast key check: 1 = depth first on sector 0, 2 = width
// first across all sectors.
const STRATEGIES: [u64; 2] = [1, 2];

/// Build the request sequence for a fast key check.
pub fn check_keys_fast_commands(keys: Option<&[MfKey]>, sector_max: usize) -> Result<Vec<Command>> {
    ensure_sector_max(sector_max)?;
    let sector_max = sector_max as u64;
    let Some(keys) = keys else {
        // let the firmware use its own dictionary
        return Ok(vec![Command::old(
            CommandId::HfMifareChkKeysFast,
            [0x1100 | sector_max, 0x101, 0],
            Vec::new(),
        )]);
    };
    let keys = keys_uniq(keys);
    if keys.is_empty() {
        return Err(Error::InvalidArgument("no candidate keys".into()));
    }
    let flat: Vec<u8> = keys.iter().flat_map(|k| *k.as_bytes()).collect();
    let chunks: Vec<&[u8]> = flat.chunks(MF_KEYS_CHUNK_SIZE).collect();
    let mut out = Vec::with_capacity(STRATEGIES.len() * chunks.len());
    for strategy in STRATEGIES {
        for (i, chunk) in chunks.iter().enumerate() {
            let first = (i == 0) as u64;
            let last = (i + 1 == chunks.len()) as u64;
            out.push(Command::old(
                CommandId::HfMifareChkKeysFast,
                [
                    (last << 12) | (first << 8) | sector_max,
                    strategy,
                    (chunk.len() / MF_KEY_SIZE) as u64,
                ],
                chunk.to_vec(),
            ));
        }
    }
    Ok(out)
}

/// Search keys for every sector of the card in the field.
///
/// With `keys` set to `None` the device tries its built-in dictionary.
/// Stops early once all `2 * sector_max` keys are known.
///
/// A request that fails ends the search, and the keys from the last good
/// reply are returned. Only when no reply was usable at all is the error
/// returned.
pub fn check_keys_fast(
    device: &mut Device<Connected>,
    keys: Option<&[MfKey]>,
    sector_max: usize,
) -> Result<SectorKeys> {
    let commands = check_keys_fast_commands(keys, sector_max)?;
    let mut best: Option<SectorKeys> = None;
    for cmd in &commands {
        let wave = device
            .execute(cmd, CommandId::Ack, Some(CHECK_KEYS_TIMEOUT_MS))
            .and_then(|resp| Ok((resp.arg(0)?, decode_check_keys_fast(resp.data(), sector_max)?)));
        match wave {
            Ok((found, table)) => {
                debug!("key check: {} of {} keys found", found, sector_max * 2);
                best = Some(table);
                if found == (sector_max * 2) as u64 {
                    break;
                }
            }
            Err(e) if best.is_some() => {
                warn!("key check: stopping early, keeping earlier results: {}", e);
                break;
            }
            Err(e) => return Err(e),
        }
    }
    best.ok_or_else(|| Error::InvalidArgument("no key check request built".into()))
}

/// Key search for the whole-card operations: a search that produced
/// nothing leaves every sector without keys instead of failing.
pub(crate) fn search_keys_or_none(
    device: &mut Device<Connected>,
    keys: &[MfKey],
    sector_max: usize,
) -> SectorKeys {
    match check_keys_fast(device, Some(keys), sector_max) {
        Ok(found) => found,
        Err(e) => {
            warn!("key check failed, no sector has a key: {}", e);
            SectorKeys::new(sector_max)
        }
    }
}

/// Confirm that `key` opens `block`.
pub fn auth_block(
    device: &mut Device<Connected>,
    block: usize,
    key_type: KeyType,
    key: &MfKey,
) -> Result<MfKey> {
    let mut payload = vec![key_type.as_u8(), block_byte(block)?, 1, 0, 1];
    payload.extend_from_slice(key.as_bytes());
    let cmd = Command::ng(CommandId::HfMifareChkKeys, payload);
    let resp = device.execute(&cmd, CommandId::HfMifareChkKeys, None)?;
    let found = resp.data().get(6).copied().unwrap_or(0);
    if resp.status() != Some(0) || found == 0 {
        return Err(Error::device_failure("authenticate block", block));
    }
    MfKey::try_from(&resp.data()[..MF_KEY_SIZE])
}
