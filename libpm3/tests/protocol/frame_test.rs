use libpm3::constants::{OLD_FRAME_LEN, PM3_CMD_DATA_SIZE, PM3_CMD_DATA_SIZE_MIX};
use libpm3::protocol::{Command, CommandId, Frame};
use libpm3::{Error, bytes_to_hex};
use proptest::prelude::*;

#[test]
fn ng_frame_layout() {
    let bytes = Frame::encode_ng(CommandId::HfDropField, &[], true).unwrap();
    // "PM3a" | 0x8000 | 0x0430 | "a3"
    assert_eq!(bytes_to_hex(&bytes), "504D3361008030046133");
}

#[test]
fn mix_frame_layout() {
    let bytes = Frame::encode_mix(CommandId::HfIso14443aReader, [3, 0, 0], &[0xAB]).unwrap();
    assert_eq!(&bytes[..4], b"PM3a");
    assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 25);
    assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 0x0385);
    assert_eq!(bytes[8], 3);
    assert_eq!(bytes[32], 0xAB);
    assert_eq!(&bytes[bytes.len() - 2..], b"a3");
}

#[test]
fn old_frame_is_fixed_size() {
    let bytes = Frame::encode_old(CommandId::HfMifareChkKeysFast, [0x1110, 0x101, 0], &[]).unwrap();
    assert_eq!(bytes.len(), OLD_FRAME_LEN);
    assert_eq!(u64::from_le_bytes(bytes[..8].try_into().unwrap()), 0x0625);
    assert_eq!(u64::from_le_bytes(bytes[8..16].try_into().unwrap()), 0x1110);
}

#[test]
fn oversize_payloads_rejected() {
    let big = vec![0u8; PM3_CMD_DATA_SIZE + 1];
    assert!(matches!(
        Frame::encode_ng(CommandId::Ack, &big, true),
        Err(Error::InvalidLength { .. })
    ));
    let mix = vec![0u8; PM3_CMD_DATA_SIZE_MIX + 1];
    assert!(Frame::encode_mix(CommandId::Ack, [0; 3], &mix).is_err());
    assert!(Frame::encode_mix(CommandId::Ack, [0; 3], &mix[1..]).is_ok());
}

#[test]
fn decode_rejects_truncated_ng() {
    let mut bytes = Frame::encode_ng(CommandId::Ack, &[1, 2, 3], true).unwrap();
    bytes.pop();
    assert!(Command::decode(&bytes).is_err());
}

proptest! {
    #[test]
    fn ng_command_survives_the_wire(
        id in any::<u16>(),
        data in proptest::collection::vec(any::<u8>(), 0..=PM3_CMD_DATA_SIZE),
    ) {
        let cmd = Command::ng(CommandId::from(id), data);
        let back = Command::decode(&cmd.encode().unwrap()).unwrap();
        prop_assert_eq!(back, cmd);
    }

    #[test]
    fn mix_command_survives_the_wire(
        args in any::<[u64; 3]>(),
        data in proptest::collection::vec(any::<u8>(), 0..=PM3_CMD_DATA_SIZE_MIX),
    ) {
        let cmd = Command::mix(CommandId::HfMifareWriteBl, args, data);
        let back = Command::decode(&cmd.encode().unwrap()).unwrap();
        prop_assert_eq!(back, cmd);
    }
}
