// libpm3/src/protocol/responses/select.rs

use crate::card::{Card, SelectStatus};
use crate::protocol::parser::{array_at, byte_at, slice_at};
use crate::protocol::responses::Response;
use crate::{Error, Result};

/// Longest UID the select structure can hold (triple size).
const MAX_UID_LEN: usize = 10;

/// Decode the reply to a connect request.
///
/// `arg0` is the select status: 0 no card, 1 selected with ATS, 2 selected
/// without ATS, 3 card answered but not with standard anticollision. The
/// data section follows the firmware's select structure:
/// `uid[10] | uidlen | atqa[2] | sak | ats_len | ats[..]`.
pub fn decode_card_select(resp: &Response) -> Result<Card> {
    let status = resp.arg(0)?;
    let data = resp.data();
    let status = match status {
        0 => return Err(Error::CardSelect("failed to select iso14443a card".into())),
        1 => SelectStatus::WithAts,
        2 => SelectStatus::WithoutAts,
        3 => {
            return Err(Error::NonStandardAnticollision {
                atqa: array_at::<2>(data, 11)?,
            });
        }
        other => {
            return Err(Error::CardSelect(format!(
                "unexpected select status {}",
                other
            )));
        }
    };

    let uid_len = (byte_at(data, 10)? as usize).min(MAX_UID_LEN);
    let uid = slice_at(data, 0, uid_len)?.to_vec();
    let atqa = array_at::<2>(data, 11)?;
    let sak = byte_at(data, 13)?;
    let ats_len = byte_at(data, 14)? as usize;
    let ats = slice_at(data, 15, ats_len)?.to_vec();
    Ok(Card::new(uid, atqa, sak, ats, status))
}
