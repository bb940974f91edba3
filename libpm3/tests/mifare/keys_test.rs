#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{FakeClassic, KEY_A, KEY_B, WRONG_KEY};
use common::helpers::{broken_search_device, fake_classic_device};
use libpm3::card::classic::{KeyType, MfKey};
use libpm3::card::operations::{auth_block, check_keys_fast};
use libpm3::protocol::CommandId;
use libpm3::test_support::sent_commands;
use libpm3::Error;

#[test]
fn only_sector_zero_key_a_found() {
    common::init_logger();
    let other = MfKey::from_bytes([0x77; 6]);
    let card = FakeClassic::with_keys(vec![(KEY_A, KEY_B), (other, other)]);
    let (mut dev, mock, _card) = fake_classic_device(card);

    let keys = check_keys_fast(&mut dev, Some(&[KEY_A, WRONG_KEY]), 2).unwrap();
    assert_eq!(keys.found_count(), 1);
    assert_eq!(keys.get(0, KeyType::A), Some(KEY_A));
    assert_eq!(keys.get(0, KeyType::B), None);
    assert_eq!(keys.get(1, KeyType::A), None);

    // not everything found: both strategies ran
    let sent = sent_commands(&mock);
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|c| c.cmd() == CommandId::HfMifareChkKeysFast));
    assert_eq!(sent[0].args()[1], 1);
    assert_eq!(sent[1].args()[1], 2);
}

#[test]
fn search_stops_once_every_key_is_known() {
    let (mut dev, mock, _card) = fake_classic_device(FakeClassic::uniform(4, KEY_A, KEY_B));
    let keys = check_keys_fast(&mut dev, Some(&[KEY_B, KEY_A, KEY_A]), 4).unwrap();
    assert_eq!(keys.found_count(), 8);
    assert_eq!(sent_commands(&mock).len(), 1);
}

#[test]
fn auth_block_accepts_only_the_right_key() {
    let (mut dev, mock, _card) = fake_classic_device(FakeClassic::uniform(2, KEY_A, KEY_B));
    assert_eq!(auth_block(&mut dev, 4, KeyType::B, &KEY_B).unwrap(), KEY_B);
    assert!(auth_block(&mut dev, 4, KeyType::A, &KEY_B).is_err());

    let sent = sent_commands(&mock);
    assert_eq!(sent[0].cmd(), CommandId::HfMifareChkKeys);
    assert_eq!(&sent[0].data()[..5], &[1, 4, 1, 0, 1]);
    assert_eq!(&sent[0].data()[5..], KEY_B.as_bytes());
}

#[test]
fn failed_wave_keeps_keys_already_found() {
    common::init_logger();
    let other = MfKey::from_bytes([0x77; 6]);
    let card = FakeClassic::with_keys(vec![(KEY_A, KEY_B), (other, other)]);
    let (mut dev, mock) = broken_search_device(card, 1);

    let keys = check_keys_fast(&mut dev, Some(&[KEY_A, WRONG_KEY]), 2).unwrap();
    assert_eq!(keys.found_count(), 1);
    assert_eq!(keys.get(0, KeyType::A), Some(KEY_A));
    assert_eq!(sent_commands(&mock).len(), 2);
}

#[test]
fn search_without_any_usable_reply_fails() {
    let (mut dev, mock) = broken_search_device(FakeClassic::uniform(2, KEY_A, KEY_B), 0);
    let err = check_keys_fast(&mut dev, Some(&[KEY_A]), 2).unwrap_err();
    assert!(matches!(err, Error::InvalidLength { .. }), "{:?}", err);
    assert_eq!(sent_commands(&mock).len(), 1);
}

#[test]
fn block_numbers_past_one_byte_are_rejected() {
    let (mut dev, mock, _card) = fake_classic_device(FakeClassic::uniform(2, KEY_A, KEY_B));
    let err = auth_block(&mut dev, 256, KeyType::A, &KEY_A).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "{:?}", err);
    assert!(sent_commands(&mock).is_empty());
}
