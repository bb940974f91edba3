#[path = "../common/mod.rs"]
mod common;

use std::time::{Duration, Instant};

use libpm3::device::{Device, Expect, SessionConfig};
use libpm3::protocol::CommandId;
use libpm3::test_support::{ack_reply, connected_mock_device, ng_reply};
use libpm3::transport::Transport;
use libpm3::utils::POLL_INTERVAL_MS;
use libpm3::{Error, Result};
use serial_test::serial;

// A wait may overrun its deadline by one polling interval plus scheduler noise.
const SLACK_MS: u128 = POLL_INTERVAL_MS as u128 + 40;

/// Answers with a WTX frame at once and with `reply` only after `delay`.
struct SlowDevice {
    wtx: Vec<u8>,
    reply: Option<Vec<u8>>,
    delay: Duration,
    since: Option<Instant>,
}

impl SlowDevice {
    fn new(wtx_ms: u16, reply: Vec<u8>, delay: Duration) -> Self {
        Self {
            wtx: ng_reply(CommandId::Wtx, 0, &wtx_ms.to_le_bytes()),
            reply: Some(reply),
            delay,
            since: None,
        }
    }
}

impl Transport for SlowDevice {
    fn send(&mut self, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    fn receive(&mut self, _timeout_ms: u64) -> Result<Vec<u8>> {
        let Some(since) = self.since else {
            self.since = Some(Instant::now());
            return Ok(self.wtx.clone());
        };
        if since.elapsed() < self.delay {
            return Ok(Vec::new());
        }
        Ok(self.reply.take().unwrap_or_default())
    }
}

#[test]
#[serial]
fn empty_wait_times_out_with_communication_delay() {
    common::init_logger();
    let (mut dev, _mock) = connected_mock_device(Vec::new()).unwrap();
    let started = Instant::now();
    let err = dev.wait_response(CommandId::Ack, Some(50)).unwrap_err();
    let elapsed = started.elapsed().as_millis();
    match err {
        Error::Timeout { timeout_ms } => assert_eq!(timeout_ms, 150),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(elapsed >= 150, "returned after {} ms", elapsed);
    assert!(elapsed < 150 + SLACK_MS, "returned after {} ms", elapsed);
}

#[test]
#[serial]
fn wtx_extends_the_deadline() {
    common::init_logger();
    let wtx = ng_reply(CommandId::Wtx, 0, &500u16.to_le_bytes());
    let (mut dev, _mock) = connected_mock_device(vec![wtx]).unwrap();
    let started = Instant::now();
    let err = dev.wait_response(CommandId::Ack, Some(50)).unwrap_err();
    let elapsed = started.elapsed().as_millis();
    assert!(matches!(err, Error::Timeout { timeout_ms: 650 }), "{:?}", err);
    assert!(elapsed >= 650, "returned after {} ms", elapsed);
    assert!(elapsed < 650 + SLACK_MS, "returned after {} ms", elapsed);
}

#[test]
#[serial]
fn reply_after_original_deadline_is_accepted_once_extended() {
    common::init_logger();
    let slow = SlowDevice::new(500, ack_reply([9, 0, 0], &[]), Duration::from_millis(400));
    let mut dev = Device::new_with_transport(Box::new(slow)).connect().unwrap();
    let started = Instant::now();
    let resp = dev.wait_response(CommandId::Ack, Some(50)).unwrap();
    let elapsed = started.elapsed().as_millis();
    assert_eq!(resp.arg(0).unwrap(), 9);
    // 50 ms + communication delay had long passed
    assert!(elapsed >= 400, "returned after {} ms", elapsed);
    assert!(elapsed < 400 + SLACK_MS, "returned after {} ms", elapsed);
}

#[test]
#[serial]
fn infinite_wtx_is_ignored() {
    let wtx = ng_reply(CommandId::Wtx, 0, &0xFFFFu16.to_le_bytes());
    let (mut dev, _mock) = connected_mock_device(vec![wtx]).unwrap();
    let err = dev.wait_response(CommandId::Ack, Some(20)).unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 120 }), "{:?}", err);
}

#[test]
fn debug_prints_and_wtx_are_not_returned() {
    let mut text = vec![0u8, 0];
    text.extend_from_slice(b"hello from the device");
    let (mut dev, _mock) = connected_mock_device(vec![
        ng_reply(CommandId::DebugPrintString, 0, &text),
        ng_reply(CommandId::Wtx, 0, &100u16.to_le_bytes()),
        ack_reply([42, 0, 0], &[]),
    ])
    .unwrap();
    let resp = dev.wait_response(Expect::Any, Some(500)).unwrap();
    assert_eq!(resp.cmd(), CommandId::Ack);
    assert_eq!(resp.arg(0).unwrap(), 42);
}

#[test]
fn non_matching_frames_are_discarded() {
    let (mut dev, _mock) = connected_mock_device(vec![
        ng_reply(CommandId::HfMifareReadBl, 0, &[1; 16]),
        ack_reply([1, 0, 0], &[]),
    ])
    .unwrap();
    let resp = dev.wait_response(CommandId::Ack, Some(500)).unwrap();
    assert_eq!(resp.cmd(), CommandId::Ack);
    assert_eq!(dev.session().pending_responses(), 0);
}

#[test]
fn unknown_id_waits_for_anything() {
    let (mut dev, _mock) =
        connected_mock_device(vec![ng_reply(CommandId::HfMifareEmlMemGet, 0, &[])]).unwrap();
    let resp = dev.wait_response(CommandId::Unknown, Some(500)).unwrap();
    assert_eq!(resp.cmd(), CommandId::HfMifareEmlMemGet);
}

#[test]
fn frame_split_across_reads() {
    let bytes = ack_reply([7, 0, 0], &[0xCC; 40]);
    let (head, tail) = bytes.split_at(3);
    let (mut dev, _mock) = connected_mock_device(vec![head.to_vec(), tail.to_vec()]).unwrap();
    let resp = dev.wait_response(CommandId::Ack, Some(500)).unwrap();
    assert_eq!(resp.data(), &[0xCC; 40]);
}

#[test]
fn two_replies_in_one_read_are_both_delivered() {
    let mut chunk = ack_reply([1, 0, 0], &[]);
    chunk.extend(ack_reply([2, 0, 0], &[]));
    let (mut dev, _mock) = connected_mock_device(vec![chunk]).unwrap();
    assert_eq!(dev.wait_response(CommandId::Ack, Some(500)).unwrap().arg(0).unwrap(), 1);
    assert_eq!(dev.wait_response(CommandId::Ack, Some(500)).unwrap().arg(0).unwrap(), 2);
}

#[test]
fn clear_drops_stale_replies() {
    let (mut dev, _mock) = connected_mock_device(Vec::new()).unwrap();
    dev.session_mut().feed(&ack_reply([1, 0, 0], &[]));
    assert_eq!(dev.session().pending_responses(), 1);
    dev.clear_response_queue();
    assert_eq!(dev.session().pending_responses(), 0);
}

#[test]
fn cancelled_wait_returns_immediately() {
    let (mut dev, _mock) = connected_mock_device(vec![ack_reply([1, 0, 0], &[])]).unwrap();
    let token = dev.cancel_token();
    token.cancel();
    assert!(matches!(dev.wait_response(CommandId::Ack, Some(5000)), Err(Error::Cancelled)));
    token.reset();
    assert!(dev.wait_response(CommandId::Ack, Some(500)).is_ok());
}

#[test]
fn default_config_values() {
    let config = SessionConfig::default();
    assert_eq!(config.default_timeout_ms, 5000);
    assert_eq!(config.communication_delay_ms, 100);
    assert_eq!(config.poll_interval_ms, 10);
}
