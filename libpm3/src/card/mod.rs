// libpm3/src/card/mod.rs

//! ISO14443-A card selected by the reader, plus the MIFARE Classic engine.

pub mod classic;
pub mod operations;

pub use classic::{CardImage, CardSize, KeyType, MfKey, SectorKeys};

use crate::utils::bytes_to_hex;

/// Anticollision outcome reported alongside a successful select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectStatus {
    /// Selected and answered RATS.
    WithAts,
    /// Selected, no ATS (MIFARE Classic and other ISO14443-3 only cards).
    WithoutAts,
}

/// Card identification gathered during select.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Card {
    uid: Vec<u8>,
    atqa: [u8; 2],
    sak: u8,
    ats: Vec<u8>,
    status: SelectStatus,
}

impl Card {
    pub fn new(uid: Vec<u8>, atqa: [u8; 2], sak: u8, ats: Vec<u8>, status: SelectStatus) -> Self {
        Self {
            uid,
            atqa,
            sak,
            ats,
            status,
        }
    }

    pub fn uid(&self) -> &[u8] {
        &self.uid
    }

    pub fn uid_hex(&self) -> String {
        bytes_to_hex(&self.uid)
    }

    pub fn atqa(&self) -> [u8; 2] {
        self.atqa
    }

    pub fn sak(&self) -> u8 {
        self.sak
    }

    pub fn ats(&self) -> &[u8] {
        &self.ats
    }

    pub fn status(&self) -> SelectStatus {
        self.status
    }

    /// MIFARE Classic family guessed from SAK (NXP AN10833).
    pub fn classic_size(&self) -> Option<CardSize> {
        match self.sak {
            0x09 => Some(CardSize::Mini),
            0x08 | 0x88 => Some(CardSize::OneK),
            0x19 => Some(CardSize::TwoK),
            0x18 | 0x98 => Some(CardSize::FourK),
            _ => None,
        }
    }
}
