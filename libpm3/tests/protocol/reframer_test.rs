use libpm3::protocol::{CommandId, Reframer, ResponseNg};
use libpm3::test_support::{ng_reply, old_ack_reply};
use proptest::prelude::*;

#[test]
fn two_frames_in_one_chunk() {
    let mut stream = ng_reply(CommandId::Ack, 0, &[1, 2, 3]);
    stream.extend(ng_reply(CommandId::HfMifareReadBl, 0, &[0x55; 16]));
    let mut reframer = Reframer::new();
    let frames = reframer.push(&stream);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].cmd(), CommandId::Ack);
    assert_eq!(frames[1].data(), &[0x55; 16]);
    assert_eq!(reframer.pending(), 0);
}

#[test]
fn frame_split_inside_header() {
    let bytes = ng_reply(CommandId::Wtx, 0, &500u16.to_le_bytes());
    let mut reframer = Reframer::new();
    assert!(reframer.push(&bytes[..5]).is_empty());
    assert_eq!(reframer.pending(), 5);
    let frames = reframer.push(&bytes[5..]);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].cmd(), CommandId::Wtx);
}

#[test]
fn legacy_frame_followed_by_ng() {
    let mut stream = old_ack_reply([1, 0, 0], &[0xAB]);
    stream.extend(ng_reply(CommandId::Ack, 0, &[]));
    let mut reframer = Reframer::new();
    let frames = reframer.push(&stream);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].len(), 544);
    assert_eq!(frames[1].status(), Some(0));
}

#[test]
fn reset_drops_partial_frame() {
    let bytes = ng_reply(CommandId::Ack, 0, &[1, 2, 3, 4]);
    let mut reframer = Reframer::new();
    reframer.push(&bytes[..8]);
    reframer.reset();
    assert_eq!(reframer.pending(), 0);
    let frames = reframer.push(&bytes);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data(), &[1, 2, 3, 4]);
}

proptest! {
    #[test]
    fn any_chunking_yields_the_same_frames(
        payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..5),
        cut in 1usize..32,
    ) {
        let mut stream = Vec::new();
        for p in &payloads {
            stream.extend(ResponseNg::encode(CommandId::Ack, 0, true, p, None).unwrap());
        }
        let mut reframer = Reframer::new();
        let mut frames = Vec::new();
        for chunk in stream.chunks(cut) {
            frames.extend(reframer.push(chunk));
        }
        prop_assert_eq!(frames.len(), payloads.len());
        for (f, p) in frames.iter().zip(&payloads) {
            prop_assert_eq!(f.data(), p.as_slice());
        }
        prop_assert_eq!(reframer.pending(), 0);
    }
}
