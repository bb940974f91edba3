// libpm3/src/card/operations/simulate.rs

use log::debug;

use crate::card::classic::CardSize;
use crate::device::{Connected, Device};
use crate::protocol::{Command, CommandId, Response};
use crate::{Error, Result};

const FLAG_INTERACTIVE: u16 = 0x1;
const FLAG_UID_IN_EMUL: u16 = 0x10;
const FLAG_NR_AR_ATTACK: u16 = 0x20;
const FLAG_MF_MINI: u16 = 0x80;
const FLAG_MF_1K: u16 = 0x100;
const FLAG_MF_2K: u16 = 0x200;
const FLAG_MF_4K: u16 = 0x400;
const FLAG_FORCED_ATQA: u16 = 0x800;
const FLAG_FORCED_SAK: u16 = 0x1000;
const FLAG_CVE21_0430: u16 = 0x2000;

/// Parameters of [`simulate_card`]. The card content comes from emulator
/// memory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulateOptions {
    /// Default: 1k.
    pub size: CardSize,
    /// Forced UID of 4, 7 or 10 bytes. Default: taken from emulator memory.
    pub uid: Option<Vec<u8>>,
    /// Default: none.
    pub atqa: Option<[u8; 2]>,
    /// Default: none.
    pub sak: Option<u8>,
    /// Stop after this many reader exchanges, 0 for never. Default: 0.
    pub exit_after: u8,
    /// Report back to the host while running. Default: false.
    pub interactive: bool,
    /// Collect reader nonces for key recovery. Default: false.
    pub nr_ar_attack: bool,
    /// Answer like a card affected by CVE-2021-0430. Default: false.
    pub cve: bool,
    /// Wait per interactive report; `None` uses the session default.
    pub wait_timeout_ms: Option<u64>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            size: CardSize::OneK,
            uid: None,
            atqa: None,
            sak: None,
            exit_after: 0,
            interactive: false,
            nr_ar_attack: false,
            cve: false,
            wait_timeout_ms: None,
        }
    }
}

impl SimulateOptions {
    /// The 16-byte simulate request:
    /// `flags (u16 LE) | exit_after | uid[10] | atqa[2] | sak`.
    pub fn to_payload(&self) -> Result<[u8; 16]> {
        let mut data = [0u8; 16];
        let mut flags = match self.size {
            CardSize::Mini => FLAG_MF_MINI,
            CardSize::OneK => FLAG_MF_1K,
            CardSize::TwoK => FLAG_MF_2K,
            CardSize::FourK => FLAG_MF_4K,
        };
        match &self.uid {
            Some(uid) => {
                if ![4, 7, 10].contains(&uid.len()) {
                    return Err(Error::InvalidArgument(format!(
                        "uid must be 4, 7 or 10 bytes, got {}",
                        uid.len()
                    )));
                }
                data[3..3 + uid.len()].copy_from_slice(uid);
                // 4 -> 0x2, 7 -> 0x4, 10 -> 0x8
                flags |= 1 << (uid.len() / 3);
            }
            None => flags |= FLAG_UID_IN_EMUL,
        }
        if let Some(atqa) = self.atqa {
            data[13..15].copy_from_slice(&atqa);
            flags |= FLAG_FORCED_ATQA;
        }
        if let Some(sak) = self.sak {
            data[15] = sak;
            flags |= FLAG_FORCED_SAK;
        }
        if self.interactive {
            flags |= FLAG_INTERACTIVE;
        }
        if self.nr_ar_attack {
            flags |= FLAG_NR_AR_ATTACK;
        }
        if self.cve {
            flags |= FLAG_CVE21_0430;
        }
        data[..2].copy_from_slice(&flags.to_le_bytes());
        data[2] = self.exit_after;
        Ok(data)
    }
}

/// Start emulating a MIFARE Classic card.
///
/// Non-interactive simulation returns as soon as the request is sent. In
/// interactive mode the device's reports are collected until it signals
/// the end of the run; with `nr_ar_attack` the reports carrying reader
/// nonces are returned undecoded.
pub fn simulate_card(
    device: &mut Device<Connected>,
    opts: &SimulateOptions,
) -> Result<Vec<Response>> {
    let payload = opts.to_payload()?;
    device.clear_response_queue();
    device.send_command(&Command::ng(CommandId::HfMifareSimulate, payload.to_vec()))?;
    let mut reports = Vec::new();
    if !opts.interactive {
        return Ok(reports);
    }
    loop {
        let resp = device.wait_response(CommandId::Ack, opts.wait_timeout_ms)?;
        let more = opts.nr_ar_attack
            && resp.arg(0)? & 0xFFFF == CommandId::HfMifareSimulate.as_u16() as u64;
        reports.push(resp);
        if !more {
            break;
        }
        debug!("simulate: nonce report {}", reports.len());
    }
    Ok(reports)
}
