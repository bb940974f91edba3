// libpm3/src/protocol/responses/keys.rs

use crate::card::classic::{KeyType, MfKey, SectorKeys};
use crate::constants::MF_KEY_SIZE;
use crate::protocol::parser::{ensure_len, slice_at};
use crate::{Error, Result};

/// Start of the found-bitmap in a fast key check reply.
pub const CHKKEYS_FAST_FLAGS_OFFSET: usize = 480;

/// Wire order of the ten bitmap bytes.
const FLAGS_ORDER: [usize; 10] = [7, 6, 5, 4, 3, 2, 1, 0, 8, 9];

/// The bitmap holds 80 bits: two keys for each of 40 sectors.
pub const CHKKEYS_FAST_MAX_SECTORS: usize = 40;

/// Decode the key table of a fast key check reply.
///
/// Keys sit at `6 * j` for `j = 2 * sector + key_type`; a slot counts as
/// found only when its bit is set in the bitmap at offset 480.
pub fn decode_check_keys_fast(data: &[u8], sector_max: usize) -> Result<SectorKeys> {
    if sector_max > CHKKEYS_FAST_MAX_SECTORS {
        return Err(Error::InvalidArgument(format!(
            "sector_max {} exceeds {}",
            sector_max, CHKKEYS_FAST_MAX_SECTORS
        )));
    }
    ensure_len(data, CHKKEYS_FAST_FLAGS_OFFSET + FLAGS_ORDER.len())?;
    let flags: Vec<u8> = FLAGS_ORDER
        .iter()
        .map(|idx| data[CHKKEYS_FAST_FLAGS_OFFSET + idx])
        .collect();

    let mut keys = SectorKeys::new(sector_max);
    for j in 0..sector_max * 2 {
        let found = (flags[j >> 3] >> (j & 7)) & 1 == 1;
        if !found {
            continue;
        }
        let key = MfKey::try_from(slice_at(data, j * MF_KEY_SIZE, MF_KEY_SIZE)?)?;
        let key_type = if j % 2 == 0 { KeyType::A } else { KeyType::B };
        keys.set(j / 2, key_type, Some(key))?;
    }
    Ok(keys)
}

/// Found-bitmap bytes in wire order for the given `(slot, found)` bits.
/// Inverse of the reordering done by [`decode_check_keys_fast`].
pub fn encode_found_flags(found: &[bool]) -> [u8; 10] {
    let mut logical = [0u8; 10];
    for (j, hit) in found.iter().enumerate().take(80) {
        if *hit {
            logical[j >> 3] |= 1 << (j & 7);
        }
    }
    let mut wire = [0u8; 10];
    for (i, idx) in FLAGS_ORDER.iter().enumerate() {
        wire[*idx] = logical[i];
    }
    wire
}
