use libpm3::card::classic::CardSize;
use libpm3::card::operations::{
    SimulateOptions, eml_clear, eml_read_block, eml_read_card, eml_write_block, eml_write_sector,
    simulate_card,
};
use libpm3::protocol::CommandId;
use libpm3::test_support::{
    ack_reply, connected_mock_device, ng_reply, scripted_device, sent_commands,
};
use libpm3::Error;

#[test]
fn emulator_writes_are_sent_without_waiting() {
    let (mut dev, mock) = scripted_device(|_| Vec::new()).unwrap();
    let data: Vec<u8> = (0u8..64).collect();
    let report = eml_write_sector(&mut dev, 1, &data).unwrap();
    assert!(report.is_complete());

    let sent = sent_commands(&mock);
    assert_eq!(sent.len(), 4);
    for (i, cmd) in sent.iter().enumerate() {
        assert_eq!(cmd.cmd(), CommandId::HfMifareEmlMemSet);
        assert_eq!(&cmd.data()[..3], &[4 + i as u8, 1, 16]);
        assert_eq!(&cmd.data()[3..], &data[i * 16..(i + 1) * 16]);
    }
}

#[test]
fn emulator_write_checks_length() {
    let (mut dev, mock) = scripted_device(|_| Vec::new()).unwrap();
    assert!(matches!(
        eml_write_block(&mut dev, 0, &[0; 15]),
        Err(Error::InvalidLength { expected: 16, actual: 15 })
    ));
    assert!(mock.sent().is_empty());
}

#[test]
fn emulator_card_read() {
    let (mut dev, _mock) = scripted_device(|cmd| match cmd.cmd() {
        CommandId::HfMifareEmlMemGet => {
            vec![ng_reply(CommandId::HfMifareEmlMemGet, 0, &[cmd.data()[0]; 16])]
        }
        _ => Vec::new(),
    })
    .unwrap();
    let report = eml_read_card(&mut dev, 2).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.data.len(), 128);
    assert_eq!(&report.data[7 * 16..], &[7; 16]);
}

#[test]
fn clear_sends_memclr() {
    let (mut dev, mock) = scripted_device(|_| Vec::new()).unwrap();
    eml_clear(&mut dev).unwrap();
    assert_eq!(sent_commands(&mock)[0].cmd(), CommandId::HfMifareEmlMemClr);
}

#[test]
fn simulate_returns_after_sending() {
    let (mut dev, mock) = connected_mock_device(Vec::new()).unwrap();
    let opts = SimulateOptions {
        size: CardSize::OneK,
        uid: Some(vec![0x01, 0x02, 0x03, 0x04]),
        ..SimulateOptions::default()
    };
    assert!(simulate_card(&mut dev, &opts).unwrap().is_empty());
    let sent = sent_commands(&mock);
    assert_eq!(sent[0].cmd(), CommandId::HfMifareSimulate);
    assert_eq!(sent[0].data(), opts.to_payload().unwrap().as_slice());
}

#[test]
fn interactive_simulate_collects_nonce_reports() {
    let report = CommandId::HfMifareSimulate.as_u16() as u64;
    let (mut dev, _mock) = connected_mock_device(vec![
        ack_reply([report, 0, 0], &[0xAA; 8]),
        ack_reply([report, 0, 0], &[0xBB; 8]),
        ack_reply([0, 0, 0], &[]),
    ])
    .unwrap();
    let opts = SimulateOptions {
        interactive: true,
        nr_ar_attack: true,
        wait_timeout_ms: Some(500),
        ..SimulateOptions::default()
    };
    let reports = simulate_card(&mut dev, &opts).unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[1].data(), &[0xBB; 8]);
}

#[test]
fn simulate_rejects_odd_uid() {
    let (mut dev, mock) = connected_mock_device(Vec::new()).unwrap();
    let opts = SimulateOptions {
        uid: Some(vec![1, 2, 3]),
        ..SimulateOptions::default()
    };
    assert!(matches!(simulate_card(&mut dev, &opts), Err(Error::InvalidArgument(_))));
    assert!(mock.sent().is_empty());
}

#[test]
fn emulator_block_numbers_fit_one_byte() {
    let (mut dev, mock) = scripted_device(|_| Vec::new()).unwrap();
    assert!(matches!(
        eml_write_block(&mut dev, 256, &[0; 16]),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(eml_read_block(&mut dev, 1000), Err(Error::InvalidArgument(_))));
    assert!(mock.sent().is_empty());
}
