// libpm3/src/transport/mock.rs

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::transport::traits::Transport;
use crate::{Error, Result};

/// Scripted reply hook: sees every sent frame and returns the chunks the
/// "device" answers with.
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>>>;

/// Mock transport for unit tests. It records sent frames and returns queued
/// chunks, optionally produced by a responder as frames are sent.
pub struct MockTransport {
    pub sent: Vec<Vec<u8>>,
    pub responses: VecDeque<Vec<u8>>,
    responder: Option<Responder>,
    open: bool,
    /// Testing hook: number of upcoming sends that should fail.
    pub send_failures: usize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("sent", &self.sent.len())
            .field("responses", &self.responses.len())
            .field("responder", &self.responder.is_some())
            .field("open", &self.open)
            .finish()
    }
}

impl MockTransport {
    /// A mock that is already open.
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            responses: VecDeque::new(),
            responder: None,
            open: true,
            send_failures: 0,
        }
    }

    /// A mock that must be connected before sends succeed.
    pub fn closed() -> Self {
        Self {
            open: false,
            ..Self::new()
        }
    }

    pub fn with_responder(mut self, responder: impl FnMut(&[u8]) -> Vec<Vec<u8>> + 'static) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn push_response(&mut self, resp: Vec<u8>) {
        self.responses.push_back(resp);
    }

    pub fn pop_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.pop()
    }

    /// Wrap into a shared handle so a test can keep inspecting the mock
    /// after a device takes ownership of the transport.
    pub fn into_shared(self) -> SharedMock {
        SharedMock(Rc::new(RefCell::new(self)))
    }
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(Error::Transport("mock transport is closed".into()));
        }
        if self.send_failures > 0 {
            self.send_failures -= 1;
            return Err(Error::Transport("mock write failed".into()));
        }
        self.sent.push(data.to_vec());
        if let Some(responder) = self.responder.as_mut() {
            self.responses.extend(responder(data));
        }
        Ok(())
    }

    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>> {
        self.responses
            .pop_front()
            .ok_or(Error::Timeout { timeout_ms })
    }

    fn connect(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Cloneable handle onto one [`MockTransport`].
#[derive(Debug, Clone)]
pub struct SharedMock(Rc<RefCell<MockTransport>>);

impl SharedMock {
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0.borrow().sent.clone()
    }

    pub fn push_response(&self, resp: Vec<u8>) {
        self.0.borrow_mut().push_response(resp);
    }

    pub fn pending(&self) -> usize {
        self.0.borrow().responses.len()
    }

    pub fn set_send_failures(&self, n: usize) {
        self.0.borrow_mut().send_failures = n;
    }
}

impl Transport for SharedMock {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.0.borrow_mut().send(data)
    }

    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>> {
        self.0.borrow_mut().receive(timeout_ms)
    }

    fn connect(&mut self) -> Result<()> {
        self.0.borrow_mut().connect()
    }

    fn disconnect(&mut self) -> Result<()> {
        self.0.borrow_mut().disconnect()
    }

    fn is_open(&self) -> bool {
        self.0.borrow().is_open()
    }
}
