// libpm3/src/device/hf14a.rs

//! ISO14443-A reader commands: field control, select and raw exchange.

use log::{debug, warn};

use crate::card::Card;
use crate::constants::PM3_CMD_DATA_SIZE;
use crate::device::handle::{Connected, Device};
use crate::protocol::crc::{check_crc16_a, crc16_a, crc16_x25};
use crate::protocol::responses::select::decode_card_select;
use crate::protocol::{Command, CommandId, Response};
use crate::utils::RAW_REPLY_MARGIN_MS;
use crate::{Error, Result};

// Reader flags understood by HF_ISO14443A_READER.
const ISO14A_CONNECT: u64 = 0x1;
const ISO14A_NO_DISCONNECT: u64 = 0x2;
const ISO14A_RAW: u64 = 0x8;
const ISO14A_SET_TIMEOUT: u64 = 0x40;
const ISO14A_NO_SELECT: u64 = 0x80;
const ISO14A_TOPAZMODE: u64 = 0x100;
const ISO14A_NO_RATS: u64 = 0x200;
const ISO14A_USE_ECP: u64 = 0x800;
const ISO14A_USE_MAGSAFE: u64 = 0x1000;

/// Largest timeout the firmware accepts, in milliseconds.
pub const MAX_RAW_TIMEOUT_MS: u64 = 40_542_464;

/// Field activation before a raw exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Activate {
    /// Leave the field as it is.
    #[default]
    Off,
    /// Power the field and select the card.
    Select,
    /// Power the field without selecting.
    NoSelect,
}

impl Activate {
    fn flags(&self) -> u64 {
        match self {
            Activate::Off => 0,
            Activate::Select => ISO14A_CONNECT,
            Activate::NoSelect => ISO14A_CONNECT | ISO14A_NO_SELECT,
        }
    }
}

/// Options of [`Device::send_raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawOptions {
    /// Default: [`Activate::Off`].
    pub active: Activate,
    /// Append CRC-A (CRC-X25 with `topaz`) to `data`. Default: false.
    pub crc: bool,
    /// Bytes to transmit. Default: empty.
    pub data: Vec<u8>,
    /// Drop the field after the exchange. Default: true.
    pub disconnect: bool,
    /// Enhanced contactless polling. Default: false.
    pub ecp: bool,
    /// Apple MagSafe polling. Default: false.
    pub magsafe: bool,
    /// Bits of the last byte to send, 0 for whole bytes. Default: 0.
    pub numbits: u16,
    /// Send RATS after select. Default: true.
    pub rats: bool,
    /// Wait for the device's answer. Default: true.
    pub reply: bool,
    /// Card response timeout in ms, 0 for the firmware default. Default: 0.
    pub timeout_ms: u64,
    /// Topaz framing. Default: false.
    pub topaz: bool,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            active: Activate::Off,
            crc: false,
            data: Vec::new(),
            disconnect: true,
            ecp: false,
            magsafe: false,
            numbits: 0,
            rats: true,
            reply: true,
            timeout_ms: 0,
            topaz: false,
        }
    }
}

impl RawOptions {
    /// Encode into the legacy-format reader command.
    pub fn to_command(&self) -> Result<Command> {
        let mut data = self.data.clone();
        if data.len() >= PM3_CMD_DATA_SIZE {
            return Err(Error::InvalidArgument(format!(
                "raw data of {} bytes does not fit in a frame",
                data.len()
            )));
        }
        if self.crc {
            if data.len() >= PM3_CMD_DATA_SIZE - 2 {
                return Err(Error::InvalidArgument("no room to append CRC".into()));
            }
            if !data.is_empty() {
                let crc = if self.topaz {
                    crc16_x25(&data)
                } else {
                    crc16_a(&data)
                };
                data.extend_from_slice(&crc);
            }
        }

        let mut flags = self.active.flags();
        let mut timeout_etu = 0;
        if self.timeout_ms > 0 {
            flags |= ISO14A_SET_TIMEOUT;
            timeout_etu = ms_to_etu(self.timeout_ms);
        }
        if !self.disconnect {
            flags |= ISO14A_NO_DISCONNECT;
        }
        if !data.is_empty() {
            flags |= ISO14A_RAW;
        }
        if self.topaz {
            flags |= ISO14A_TOPAZMODE;
        }
        if !self.rats {
            flags |= ISO14A_NO_RATS;
        }
        if self.ecp {
            flags |= ISO14A_USE_ECP;
        }
        if self.magsafe {
            flags |= ISO14A_USE_MAGSAFE;
        }
        let len_arg = data.len() as u64 | ((self.numbits as u64) << 16);
        Ok(Command::old(
            CommandId::HfIso14443aReader,
            [flags, len_arg, timeout_etu],
            data,
        ))
    }
}

/// Milliseconds to elementary time units (one bit at 106 kbit/s, about
/// 9.4 us), capped at the firmware maximum.
pub fn ms_to_etu(timeout_ms: u64) -> u64 {
    timeout_ms.min(MAX_RAW_TIMEOUT_MS) * 1356 / (8 * 16)
}

/// Reply to a raw exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    response: Response,
    data: Vec<u8>,
    data_without_crc: Option<Vec<u8>>,
}

impl RawResponse {
    /// The ACK frame as received.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Bytes the card answered, `arg0` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `data` minus its trailing CRC-A, when that CRC checks out.
    pub fn data_without_crc(&self) -> Option<&[u8]> {
        self.data_without_crc.as_deref()
    }
}

impl Device<Connected> {
    /// Switch the reader field off.
    pub fn drop_field(&mut self) -> Result<()> {
        self.clear_response_queue();
        self.send_command(&Command::ng(CommandId::HfDropField, Vec::new()))
    }

    /// Power up, run anticollision and keep the card selected.
    pub fn select_card(&mut self) -> Result<Card> {
        self.drop_field()?;
        self.clear_response_queue();
        let cmd = Command::mix(
            CommandId::HfIso14443aReader,
            [ISO14A_CONNECT | ISO14A_NO_DISCONNECT, 0, 0],
            Vec::new(),
        );
        self.send_command(&cmd)?;
        let resp = self.wait_response(CommandId::Ack, None)?;
        let card = decode_card_select(&resp)?;
        debug!("selected card uid {}", card.uid_hex());
        Ok(card)
    }

    /// Release the card and the field state machine.
    pub fn deselect_card(&mut self) -> Result<()> {
        self.send_command(&Command::mix(
            CommandId::HfIso14443aReader,
            [0, 0, 0],
            Vec::new(),
        ))
    }

    /// Select a card for identification, then always deselect it.
    pub fn card_info(&mut self) -> Result<Card> {
        let selected = self.select_card();
        let released = self.deselect_card();
        match (selected, released) {
            (Ok(card), Ok(())) => Ok(card),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), released) => {
                if let Err(de) = released {
                    warn!("deselect after failed select: {}", de);
                }
                Err(e)
            }
        }
    }

    /// Exchange raw bytes with the card in the field.
    ///
    /// Returns `None` when no reply was requested or nothing was sent
    /// beyond the activation.
    pub fn send_raw(&mut self, opts: &RawOptions) -> Result<Option<RawResponse>> {
        let cmd = opts.to_command()?;
        let sent_data = !cmd.data().is_empty();
        // Host wait is in milliseconds; only the frame argument is in ETU.
        let wait_ms = opts.timeout_ms + RAW_REPLY_MARGIN_MS;

        self.clear_response_queue();
        self.send_command(&cmd)?;
        if !opts.reply {
            return Ok(None);
        }
        if opts.active == Activate::Select {
            let selected = self.wait_response(CommandId::Ack, Some(wait_ms))?;
            if selected.arg(1)? & 0xFFFF == 0 {
                return Err(Error::CardSelect("failed to select card".into()));
            }
        }
        if !sent_data {
            return Ok(None);
        }
        let response = self.wait_response(CommandId::Ack, Some(wait_ms))?;
        let data_len = (response.arg(0)? & 0xFFFF) as usize;
        if data_len == 0 {
            return Err(Error::device_failure("raw exchange", 0));
        }
        let data = response
            .data()
            .get(..data_len)
            .ok_or(Error::InvalidLength {
                expected: data_len,
                actual: response.data().len(),
            })?
            .to_vec();
        let data_without_crc = (data_len >= 3 && check_crc16_a(&data))
            .then(|| data[..data_len - 2].to_vec());
        Ok(Some(RawResponse {
            response,
            data,
            data_without_crc,
        }))
    }
}
