use libpm3::card::operations::{
    Unit, read_block_gen1a, read_sector_gen1a, write_block_gen1a, write_card_gen1a,
};
use libpm3::protocol::CommandId;
use libpm3::test_support::{ack_reply, scripted_device, sent_commands};

fn gen1a_reader(bad_block: Option<u64>) -> impl FnMut(&libpm3::Command) -> Vec<Vec<u8>> {
    move |cmd| match cmd.cmd() {
        CommandId::HfMifareCGetBl => {
            let block = cmd.args()[1];
            if Some(block) == bad_block {
                vec![ack_reply([0, 0, 0], &[])]
            } else {
                vec![ack_reply([1, 0, 0], &[block as u8; 16])]
            }
        }
        CommandId::HfMifareCSetBl => vec![ack_reply([1, 0, 0], &[])],
        _ => Vec::new(),
    }
}

#[test]
fn sector_reads_use_absolute_block_numbers() {
    let (mut dev, mock) = scripted_device(gen1a_reader(None)).unwrap();
    let report = read_sector_gen1a(&mut dev, 2);
    assert!(report.is_complete());
    let blocks: Vec<u64> = sent_commands(&mock).iter().map(|c| c.args()[1]).collect();
    assert_eq!(blocks, [8, 9, 10, 11]);
    for (i, chunk) in report.data.chunks(16).enumerate() {
        assert_eq!(chunk, &[8 + i as u8; 16]);
    }
}

#[test]
fn failing_block_is_retried_then_reported() {
    let (mut dev, mock) = scripted_device(gen1a_reader(Some(9))).unwrap();
    let report = read_sector_gen1a(&mut dev, 2);
    assert_eq!(report.success, [true, false, true, true]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].unit, Unit::Block(9));
    assert_eq!(&report.data[16..32], &[0; 16]);
    let tries = sent_commands(&mock).iter().filter(|c| c.args()[1] == 9).count();
    assert_eq!(tries, 3);
}

#[test]
fn single_block_read_and_write_flags() {
    let (mut dev, mock) = scripted_device(gen1a_reader(None)).unwrap();
    assert_eq!(read_block_gen1a(&mut dev, 0).unwrap(), vec![0; 16]);
    write_block_gen1a(&mut dev, 0, &[0x11; 16], true).unwrap();
    write_block_gen1a(&mut dev, 1, &[0x22; 16], false).unwrap();

    let sent = sent_commands(&mock);
    assert_eq!(sent[0].args(), [0x1E, 0, 0]);
    assert_eq!(sent[1].cmd(), CommandId::HfMifareCSetBl);
    assert_eq!(sent[1].args(), [0x5E, 0, 0]);
    assert_eq!(sent[1].data(), &[0x11; 16]);
    assert_eq!(sent[2].args(), [0x1E, 1, 0]);
}

#[test]
fn card_write_needs_full_image() {
    let (mut dev, mock) = scripted_device(gen1a_reader(None)).unwrap();
    assert!(write_card_gen1a(&mut dev, &[0; 63], 1).is_err());
    assert!(mock.sent().is_empty());

    let report = write_card_gen1a(&mut dev, &[0; 128], 2).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.success.len(), 8);
}
