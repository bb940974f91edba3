// libpm3/src/device/middleware.rs

//! Interceptors around frame sending and response waiting.
//!
//! Each interceptor receives a continuation for the rest of the chain. It
//! may run code before and after calling it, replace the frame or the
//! request it forwards, or answer without forwarding at all. `run` takes
//! the continuation by value, so forwarding twice does not compile.

use std::sync::Arc;

use log::trace;

use crate::Result;
use crate::device::session::{Channel, WaitRequest};
use crate::protocol::Response;
use crate::utils::bytes_to_hex;

pub trait Interceptor {
    fn on_send(&self, frame: &[u8], next: SendNext<'_>) -> Result<()> {
        next.run(frame)
    }

    fn on_receive(&self, request: WaitRequest, next: ReceiveNext<'_>) -> Result<Response> {
        next.run(request)
    }
}

/// Remainder of the send chain.
pub struct SendNext<'a> {
    channel: &'a mut Channel,
    rest: &'a [Arc<dyn Interceptor>],
}

impl<'a> SendNext<'a> {
    pub(crate) fn new(channel: &'a mut Channel, rest: &'a [Arc<dyn Interceptor>]) -> Self {
        Self { channel, rest }
    }

    pub fn run(self, frame: &[u8]) -> Result<()> {
        match self.rest.split_first() {
            Some((head, rest)) => head.on_send(
                frame,
                SendNext {
                    channel: self.channel,
                    rest,
                },
            ),
            None => self.channel.write_frame(frame),
        }
    }
}

/// Remainder of the receive chain.
pub struct ReceiveNext<'a> {
    channel: &'a mut Channel,
    rest: &'a [Arc<dyn Interceptor>],
}

impl<'a> ReceiveNext<'a> {
    pub(crate) fn new(channel: &'a mut Channel, rest: &'a [Arc<dyn Interceptor>]) -> Self {
        Self { channel, rest }
    }

    pub fn run(self, request: WaitRequest) -> Result<Response> {
        match self.rest.split_first() {
            Some((head, rest)) => head.on_receive(
                request,
                ReceiveNext {
                    channel: self.channel,
                    rest,
                },
            ),
            None => self.channel.wait(request),
        }
    }
}

/// Logs every frame in both directions at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrafficLogger;

impl Interceptor for TrafficLogger {
    fn on_send(&self, frame: &[u8], next: SendNext<'_>) -> Result<()> {
        trace!("tx = {}", bytes_to_hex(frame));
        next.run(frame)
    }

    fn on_receive(&self, request: WaitRequest, next: ReceiveNext<'_>) -> Result<Response> {
        let resp = next.run(request)?;
        trace!("rx = {}", bytes_to_hex(resp.as_bytes()));
        Ok(resp)
    }
}
