use libpm3::card::SelectStatus;
use libpm3::card::classic::KeyType;
use libpm3::protocol::responses::keys::{decode_check_keys_fast, encode_found_flags};
use libpm3::protocol::responses::select::decode_card_select;
use libpm3::protocol::{CommandId, Response, ResponseNg};
use libpm3::test_support::{ack_reply, old_ack_reply, select_data};
use libpm3::{Error, bytes_to_hex};

#[test]
fn ng_response_fields() {
    let bytes = ResponseNg::encode(CommandId::HfMifareReadBl, -1, true, &[0xAA; 4], None).unwrap();
    let resp = Response::decode(bytes).unwrap();
    assert_eq!(resp.cmd(), CommandId::HfMifareReadBl);
    assert_eq!(resp.status(), Some(-1));
    assert_eq!(resp.data(), &[0xAA; 4]);
}

#[test]
fn mix_ack_exposes_args_and_data() {
    let resp = Response::decode(ack_reply([7, 0x1_0000_0000, 3], &[1, 2])).unwrap();
    assert_eq!(resp.cmd(), CommandId::Ack);
    assert_eq!(resp.arg(0).unwrap(), 7);
    assert_eq!(resp.arg(1).unwrap(), 0x1_0000_0000);
    assert_eq!(resp.arg(2).unwrap(), 3);
    assert_eq!(resp.data(), &[1, 2]);
}

#[test]
fn legacy_ack_has_no_status() {
    let resp = Response::decode(old_ack_reply([1, 2, 3], &[9])).unwrap();
    assert_eq!(resp.len(), 544);
    assert_eq!(resp.status(), None);
    assert_eq!(resp.arg(2).unwrap(), 3);
    assert_eq!(resp.data()[0], 9);
    assert_eq!(resp.data().len(), 512);
}

#[test]
fn bad_magic_or_length_rejected() {
    let mut bytes = ResponseNg::encode(CommandId::Ack, 0, true, &[1, 2, 3], None).unwrap();
    bytes.push(0);
    assert!(Response::decode(bytes).is_err());
    assert!(Response::decode(vec![0u8; 100]).is_err());
}

#[test]
fn select_reply_with_ats() {
    let uid = [0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
    let ats = [0x06, 0x75, 0x77, 0x81, 0x02, 0x80];
    let resp = Response::decode(ack_reply([1, 0, 0], &select_data(&uid, [0x44, 0x03], 0x20, &ats)))
        .unwrap();
    let card = decode_card_select(&resp).unwrap();
    assert_eq!(card.uid_hex(), "04112233445566");
    assert_eq!(bytes_to_hex(card.ats()), "067577810280");
    assert_eq!(card.status(), SelectStatus::WithAts);
}

#[test]
fn select_reply_unknown_status_is_error() {
    let resp = Response::decode(ack_reply([9, 0, 0], &select_data(&[1, 2, 3, 4], [4, 0], 8, &[])))
        .unwrap();
    assert!(matches!(decode_card_select(&resp), Err(Error::CardSelect(_))));
}

#[test]
fn key_table_decoding_honours_flags() {
    let mut data = vec![0u8; 512];
    // sector 1 key B holds a key, sector 2 key A holds bytes but no flag
    data[3 * 6..4 * 6].copy_from_slice(&[0xB1; 6]);
    data[4 * 6..5 * 6].copy_from_slice(&[0xEE; 6]);
    let mut found = vec![false; 6];
    found[3] = true;
    data[480..490].copy_from_slice(&encode_found_flags(&found));

    let keys = decode_check_keys_fast(&data, 3).unwrap();
    assert_eq!(keys.found_count(), 1);
    assert_eq!(keys.get(1, KeyType::B).unwrap().as_bytes(), &[0xB1; 6]);
    assert!(keys.get(2, KeyType::A).is_none());
}

#[test]
fn key_table_too_short_or_too_many_sectors() {
    assert!(decode_check_keys_fast(&[0u8; 100], 16).is_err());
    assert!(decode_check_keys_fast(&[0u8; 512], 41).is_err());
}
