// libpm3/src/card/classic.rs

//! MIFARE Classic data model: keys, sector key table, access bits and
//! the whole-card image.

use std::convert::TryFrom;
use std::fmt;

use crate::buffer::ByteBuffer;
use crate::constants::{MF_BLOCK_SIZE, MF_BLOCKS_PER_SECTOR, MF_KEY_SIZE, MF_SECTOR_SIZE};
use crate::utils::{bytes_to_hex, parse_hex};
use crate::{Error, Result};

/// Offset of Key A inside a sector (start of the trailer block).
pub const TRAILER_KEY_A_OFFSET: usize = 48;
/// Offset of the three access-condition bytes inside a sector.
pub const TRAILER_ACL_OFFSET: usize = 54;
/// Offset of Key B inside a sector.
pub const TRAILER_KEY_B_OFFSET: usize = 58;

/// Which sector key authenticates an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyType {
    A = 0,
    B = 1,
}

impl KeyType {
    /// Key B first: access conditions usually grant B the data rights.
    pub const B_THEN_A: [KeyType; 2] = [KeyType::B, KeyType::A];

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn trailer_offset(&self) -> usize {
        match self {
            KeyType::A => TRAILER_KEY_A_OFFSET,
            KeyType::B => TRAILER_KEY_B_OFFSET,
        }
    }
}

/// MIFARE Classic sector key (6 バイト)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MfKey([u8; MF_KEY_SIZE]);

impl MfKey {
    /// Factory default key.
    pub const DEFAULT: Self = Self([0xFF; MF_KEY_SIZE]);

    pub const fn from_bytes(bytes: [u8; MF_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MF_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = parse_hex(s).map_err(Error::InvalidArgument)?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for MfKey {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        if bytes.len() != MF_KEY_SIZE {
            return Err(Error::InvalidLength {
                expected: MF_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; MF_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for MfKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MfKey({})", self.to_hex())
    }
}

impl fmt::Display for MfKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Drop repeated keys, keeping the first occurrence of each.
pub fn keys_uniq(keys: &[MfKey]) -> Vec<MfKey> {
    let mut out: Vec<MfKey> = Vec::with_capacity(keys.len());
    for key in keys {
        if !out.contains(key) {
            out.push(*key);
        }
    }
    out
}

/// Check the complement relation of the three access-condition bytes.
///
/// Splitting the bytes into six nibbles `n0..n5` (high nibble first),
/// the pairs `(n1, n2)`, `(n0, n5)` and `(n3, n4)` must each XOR to `0xF`.
pub fn is_valid_acl(acl: &[u8]) -> bool {
    if acl.len() < 3 {
        return false;
    }
    let nibbles: Vec<u8> = acl[..3].iter().flat_map(|b| [b >> 4, b & 0x0F]).collect();
    [(1, 2), (0, 5), (3, 4)]
        .iter()
        .all(|&(a, b)| nibbles[a] ^ nibbles[b] == 0x0F)
}

/// First block of `sector`.
pub fn sector_first_block(sector: usize) -> usize {
    sector * MF_BLOCKS_PER_SECTOR
}

/// Card family, used to pick the emulation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CardSize {
    Mini,
    #[default]
    OneK,
    TwoK,
    FourK,
}

/// Keys recovered for each `(sector, key type)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorKeys {
    keys: Vec<Option<MfKey>>,
}

impl SectorKeys {
    /// Table for `sector_max` sectors with nothing found yet.
    pub fn new(sector_max: usize) -> Self {
        Self {
            keys: vec![None; sector_max * 2],
        }
    }

    pub fn sector_max(&self) -> usize {
        self.keys.len() / 2
    }

    pub fn get(&self, sector: usize, key_type: KeyType) -> Option<MfKey> {
        self.keys
            .get(sector * 2 + key_type as usize)
            .copied()
            .flatten()
    }

    pub fn set(&mut self, sector: usize, key_type: KeyType, key: Option<MfKey>) -> Result<()> {
        let max = self.sector_max();
        let slot = self
            .keys
            .get_mut(sector * 2 + key_type as usize)
            .ok_or_else(|| {
                Error::InvalidArgument(format!("sector {} out of range 0..{}", sector, max))
            })?;
        *slot = key;
        Ok(())
    }

    /// Flat view ordered `[s0 A, s0 B, s1 A, s1 B, ...]`.
    pub fn as_slice(&self) -> &[Option<MfKey>] {
        &self.keys
    }

    pub fn found_count(&self) -> usize {
        self.keys.iter().filter(|k| k.is_some()).count()
    }
}

/// Full dump of a card: `sector_max * 64` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    data: ByteBuffer,
}

impl CardImage {
    /// Zero-filled image of `sector_max` sectors.
    pub fn new(sector_max: usize) -> Self {
        Self {
            data: ByteBuffer::new(sector_max * MF_SECTOR_SIZE),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() || bytes.len() % MF_SECTOR_SIZE != 0 {
            return Err(Error::InvalidArgument(format!(
                "card image must be a non-empty multiple of {} bytes, got {}",
                MF_SECTOR_SIZE,
                bytes.len()
            )));
        }
        Ok(Self {
            data: ByteBuffer::from_bytes(bytes),
        })
    }

    /// Parse an eml dump: one block of hex per line, `-` read as `0`.
    pub fn from_eml(eml: &str) -> Result<Self> {
        let bytes = parse_hex(&eml.replace('-', "0")).map_err(Error::InvalidArgument)?;
        Self::from_bytes(&bytes)
    }

    /// Render as an eml dump, one 32-digit line per block.
    pub fn to_eml(&self) -> String {
        self.data
            .chunks(MF_BLOCK_SIZE)
            .map(bytes_to_hex)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn sector_max(&self) -> usize {
        self.data.len() / MF_SECTOR_SIZE
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    fn range(&self, at: usize, len: usize, what: &str) -> Result<std::ops::Range<usize>> {
        if at + len > self.data.len() {
            return Err(Error::InvalidArgument(format!(
                "{} out of range for a {}-sector image",
                what,
                self.sector_max()
            )));
        }
        Ok(at..at + len)
    }

    pub fn block(&self, block: usize) -> Result<&[u8]> {
        let r = self.range(block * MF_BLOCK_SIZE, MF_BLOCK_SIZE, "block")?;
        Ok(&self.data[r])
    }

    pub fn set_block(&mut self, block: usize, data: &[u8]) -> Result<()> {
        if data.len() != MF_BLOCK_SIZE {
            return Err(Error::InvalidLength {
                expected: MF_BLOCK_SIZE,
                actual: data.len(),
            });
        }
        let r = self.range(block * MF_BLOCK_SIZE, MF_BLOCK_SIZE, "block")?;
        self.data[r].copy_from_slice(data);
        Ok(())
    }

    pub fn sector(&self, sector: usize) -> Result<&[u8]> {
        let r = self.range(sector * MF_SECTOR_SIZE, MF_SECTOR_SIZE, "sector")?;
        Ok(&self.data[r])
    }

    pub fn set_sector(&mut self, sector: usize, data: &[u8]) -> Result<()> {
        if data.len() != MF_SECTOR_SIZE {
            return Err(Error::InvalidLength {
                expected: MF_SECTOR_SIZE,
                actual: data.len(),
            });
        }
        let r = self.range(sector * MF_SECTOR_SIZE, MF_SECTOR_SIZE, "sector")?;
        self.data[r].copy_from_slice(data);
        Ok(())
    }

    pub fn key(&self, sector: usize, key_type: KeyType) -> Result<MfKey> {
        let at = sector * MF_SECTOR_SIZE + key_type.trailer_offset();
        let r = self.range(at, MF_KEY_SIZE, "sector")?;
        MfKey::try_from(&self.data[r])
    }

    pub fn set_key(&mut self, sector: usize, key_type: KeyType, key: &MfKey) -> Result<()> {
        let at = sector * MF_SECTOR_SIZE + key_type.trailer_offset();
        let r = self.range(at, MF_KEY_SIZE, "sector")?;
        self.data[r].copy_from_slice(key.as_bytes());
        Ok(())
    }

    /// Every Key A, by sector.
    pub fn keys_a(&self) -> Vec<MfKey> {
        (0..self.sector_max())
            .filter_map(|s| self.key(s, KeyType::A).ok())
            .collect()
    }

    /// Every Key B, by sector.
    pub fn keys_b(&self) -> Vec<MfKey> {
        (0..self.sector_max())
            .filter_map(|s| self.key(s, KeyType::B).ok())
            .collect()
    }

    pub fn acl(&self, sector: usize) -> Result<&[u8]> {
        let r = self.range(sector * MF_SECTOR_SIZE + TRAILER_ACL_OFFSET, 3, "sector")?;
        Ok(&self.data[r])
    }

    pub fn is_sector_acl_valid(&self, sector: usize) -> bool {
        self.acl(sector).map(is_valid_acl).unwrap_or(false)
    }

    pub fn all_acls_valid(&self) -> bool {
        (0..self.sector_max()).all(|s| self.is_sector_acl_valid(s))
    }

    /// UID stored in the manufacturer block, following cascade tags.
    pub fn uid(&self) -> Vec<u8> {
        let mut uid = Vec::new();
        for i in 0..3 {
            let at = i * 4;
            if self.data[at + 3] != 0x88 {
                uid.extend_from_slice(&self.data[at..at + 4]);
                break;
            }
            uid.extend_from_slice(&self.data[at..at + 3]);
        }
        uid
    }
}
