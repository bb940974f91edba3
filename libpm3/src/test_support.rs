//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize reply-frame construction and mock-backed
//! device setup so tests across the crate and tests/ directory can reuse
//! the same logic.
#![allow(dead_code)]

use crate::device::{Connected, Device};
use crate::protocol::{Command, CommandId, ResponseNg, ResponseOld};
use crate::transport::{MockTransport, SharedMock};
use crate::Result;

/// NG reply with the ng bit set.
#[doc(hidden)]
pub fn ng_reply(cmd: CommandId, status: i16, data: &[u8]) -> Vec<u8> {
    ResponseNg::encode(cmd, status, true, data, None).unwrap_or_default()
}

/// ACK in the argument-carrying NG layout, as MIX-style handlers answer.
#[doc(hidden)]
pub fn ack_reply(args: [u64; 3], data: &[u8]) -> Vec<u8> {
    ResponseNg::encode_mix(CommandId::Ack, 0, args, data).unwrap_or_default()
}

/// ACK in the legacy 544-byte layout.
#[doc(hidden)]
pub fn old_ack_reply(args: [u64; 3], data: &[u8]) -> Vec<u8> {
    ResponseOld::encode(CommandId::Ack, args, data).unwrap_or_default()
}

/// Select structure as returned by the reader command.
#[doc(hidden)]
pub fn select_data(uid: &[u8], atqa: [u8; 2], sak: u8, ats: &[u8]) -> Vec<u8> {
    let mut v = vec![0u8; 15];
    let n = uid.len().min(10);
    v[..n].copy_from_slice(&uid[..n]);
    v[10] = n as u8;
    v[11..13].copy_from_slice(&atqa);
    v[13] = sak;
    v[14] = ats.len() as u8;
    v.extend_from_slice(ats);
    v
}

/// Connect a Device to a MockTransport pre-seeded with `responses`.
/// The returned handle observes the frames the device sends.
#[doc(hidden)]
pub fn connected_mock_device(responses: Vec<Vec<u8>>) -> Result<(Device<Connected>, SharedMock)> {
    let shared = MockTransport::new().into_shared();
    for resp in responses {
        shared.push_response(resp);
    }
    let device = Device::new_with_transport(Box::new(shared.clone())).connect()?;
    Ok((device, shared))
}

/// Connect a Device to a MockTransport that answers every decodable
/// command through `reply`.
#[doc(hidden)]
pub fn scripted_device(
    mut reply: impl FnMut(&Command) -> Vec<Vec<u8>> + 'static,
) -> Result<(Device<Connected>, SharedMock)> {
    let shared = MockTransport::new()
        .with_responder(move |frame| match Command::decode(frame) {
            Ok(cmd) => reply(&cmd),
            Err(_) => Vec::new(),
        })
        .into_shared();
    let device = Device::new_with_transport(Box::new(shared.clone())).connect()?;
    Ok((device, shared))
}

/// Decode every frame a mock recorded.
#[doc(hidden)]
pub fn sent_commands(mock: &SharedMock) -> Vec<Command> {
    mock.sent()
        .iter()
        .filter_map(|f| Command::decode(f).ok())
        .collect()
}
