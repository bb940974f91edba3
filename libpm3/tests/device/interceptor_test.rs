use std::sync::{Arc, Mutex};

use libpm3::device::{
    DeviceBuilder, Expect, Interceptor, ReceiveNext, SendNext, TrafficLogger, WaitRequest,
};
use libpm3::protocol::{Command, CommandId, Response};
use libpm3::test_support::ack_reply;
use libpm3::transport::MockTransport;
use libpm3::{Error, Result};

#[derive(Default)]
struct Counter {
    sent: Mutex<usize>,
    received: Mutex<usize>,
}

impl Interceptor for Counter {
    fn on_send(&self, frame: &[u8], next: SendNext<'_>) -> Result<()> {
        *self.sent.lock().unwrap() += 1;
        next.run(frame)
    }

    fn on_receive(&self, request: WaitRequest, next: ReceiveNext<'_>) -> Result<Response> {
        let resp = next.run(request)?;
        *self.received.lock().unwrap() += 1;
        Ok(resp)
    }
}

/// Answers ACK waits from a canned frame without touching the device.
struct Canned(Vec<u8>);

impl Interceptor for Canned {
    fn on_receive(&self, request: WaitRequest, next: ReceiveNext<'_>) -> Result<Response> {
        if request.expect == Expect::Cmd(CommandId::Ack) {
            return Response::decode(self.0.clone());
        }
        next.run(request)
    }
}

/// Refuses to send anything.
struct Gate;

impl Interceptor for Gate {
    fn on_send(&self, _frame: &[u8], _next: SendNext<'_>) -> Result<()> {
        Err(Error::Transport("blocked".into()))
    }
}

#[test]
fn counter_sees_every_exchange() -> Result<()> {
    let counter = Arc::new(Counter::default());
    let shared = MockTransport::new().into_shared();
    shared.push_response(ack_reply([1, 0, 0], &[]));
    let mut dev = DeviceBuilder::new()
        .with_transport(Box::new(shared.clone()))
        .interceptor(Arc::new(TrafficLogger))
        .interceptor(counter.clone())
        .build()?
        .connect()?;
    dev.execute(&Command::ng(CommandId::HfDropField, Vec::new()), CommandId::Ack, Some(200))?;
    assert_eq!(*counter.sent.lock().unwrap(), 1);
    assert_eq!(*counter.received.lock().unwrap(), 1);
    assert_eq!(shared.sent().len(), 1);
    Ok(())
}

#[test]
fn interceptor_can_answer_without_device() -> Result<()> {
    let shared = MockTransport::new().into_shared();
    let mut dev = DeviceBuilder::new()
        .with_transport(Box::new(shared.clone()))
        .interceptor(Arc::new(Canned(ack_reply([9, 0, 0], &[]))))
        .build()?
        .connect()?;
    let resp = dev.wait_response(CommandId::Ack, Some(10))?;
    assert_eq!(resp.arg(0)?, 9);
    Ok(())
}

#[test]
fn blocked_send_never_reaches_transport() -> Result<()> {
    let shared = MockTransport::new().into_shared();
    let mut dev = DeviceBuilder::new()
        .with_transport(Box::new(shared.clone()))
        .interceptor(Arc::new(Gate))
        .build()?
        .connect()?;
    let err = dev
        .send_command(&Command::ng(CommandId::HfDropField, Vec::new()))
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(shared.sent().is_empty());
    Ok(())
}
