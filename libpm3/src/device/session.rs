// libpm3/src/device/session.rs

//! Request/response plumbing between the host and one device.
//!
//! Outbound frames go straight to the transport. Inbound bytes are pulled
//! from the transport while a caller waits, cut into frames by the
//! [`Reframer`] and queued until [`Session::wait_response`] consumes them.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use log::{debug, trace};

use crate::device::middleware::{Interceptor, ReceiveNext, SendNext};
use crate::protocol::codec::{Reframer, encode_command_frame};
use crate::protocol::{Command, CommandId, Response};
use crate::transport::Transport;
use crate::utils::{
    COMMUNICATION_DELAY_MS, DEFAULT_RESPONSE_TIMEOUT_MS, POLL_INTERVAL_MS, WTX_INFINITE,
    bytes_to_hex, ms,
};
use crate::{Error, Result};

/// Timing knobs of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Sleep between two checks of an empty queue. Default: 10.
    pub poll_interval_ms: u64,
    /// Added to every wait for USB round-trip latency. Default: 100.
    pub communication_delay_ms: u64,
    /// Used when a wait passes no timeout. Default: 5000.
    pub default_timeout_ms: u64,
    /// How long one transport read may block. Default: 10.
    pub receive_chunk_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            communication_delay_ms: COMMUNICATION_DELAY_MS,
            default_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            receive_chunk_timeout_ms: POLL_INTERVAL_MS,
        }
    }
}

/// Cooperative cancellation for waits in progress.
///
/// The flag is sticky: once cancelled, every later wait fails with
/// [`Error::Cancelled`] until [`CancelToken::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Which frame a wait is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Any,
    Cmd(CommandId),
}

impl Expect {
    pub fn matches(&self, cmd: CommandId) -> bool {
        match self {
            Expect::Any => true,
            Expect::Cmd(want) => want.as_u16() == cmd.as_u16(),
        }
    }
}

impl From<CommandId> for Expect {
    /// `Unknown` is the firmware's "any response" marker.
    fn from(cmd: CommandId) -> Self {
        match cmd {
            CommandId::Unknown => Expect::Any,
            other => Expect::Cmd(other),
        }
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expect::Any => f.write_str("any"),
            Expect::Cmd(cmd) => write!(f, "{}", cmd),
        }
    }
}

/// One call to [`Session::wait_response`], as seen by interceptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitRequest {
    pub expect: Expect,
    /// Caller timeout before the communication delay is added.
    pub timeout_ms: u64,
}

/// Transport plus inbound state. Interceptor chains end here.
pub(crate) struct Channel {
    transport: Box<dyn Transport>,
    reframer: Reframer,
    queue: VecDeque<Response>,
    config: SessionConfig,
    cancel: CancelToken,
}

impl Channel {
    pub(crate) fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        if !self.transport.is_open() {
            return Err(Error::Transport("device is not connected".into()));
        }
        trace!("tx {}", bytes_to_hex(frame));
        self.transport.send(frame)
    }

    fn feed(&mut self, chunk: &[u8]) {
        trace!("rx chunk {}", bytes_to_hex(chunk));
        let frames = self.reframer.push(chunk);
        self.queue.extend(frames);
    }

    /// Pull one chunk from the transport. Returns whether bytes arrived.
    fn pump(&mut self) -> Result<bool> {
        let chunk = match self.transport.receive(self.config.receive_chunk_timeout_ms) {
            Ok(chunk) => chunk,
            Err(Error::Timeout { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        if chunk.is_empty() {
            return Ok(false);
        }
        self.feed(&chunk);
        Ok(true)
    }

    pub(crate) fn wait(&mut self, request: WaitRequest) -> Result<Response> {
        if !self.transport.is_open() {
            return Err(Error::Transport("device is not connected".into()));
        }
        let started = Instant::now();
        let mut timeout_ms = request.timeout_ms + self.config.communication_delay_ms;
        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let received = self.pump()?;
            while let Some(resp) = self.queue.pop_front() {
                let cmd = resp.cmd();
                if cmd.is_debug_print() {
                    log_debug_print(&resp);
                    continue;
                }
                if cmd == CommandId::Wtx && resp.data().len() == 2 {
                    let wtx = u16::from_le_bytes([resp.data()[0], resp.data()[1]]);
                    if wtx != WTX_INFINITE {
                        debug!(
                            "extend timeout: {} + {} = {} ms",
                            timeout_ms,
                            wtx,
                            timeout_ms + wtx as u64
                        );
                        timeout_ms += wtx as u64;
                    }
                    continue;
                }
                if request.expect.matches(cmd) {
                    return Ok(resp);
                }
                debug!("discarding {} while waiting for {}", cmd, request.expect);
            }
            let elapsed = started.elapsed().as_millis() as u64;
            if elapsed >= timeout_ms {
                return Err(Error::Timeout { timeout_ms });
            }
            if !received {
                let nap = self.config.poll_interval_ms.min(timeout_ms - elapsed);
                thread::sleep(ms(nap));
            }
        }
    }
}

fn log_debug_print(resp: &Response) {
    match resp.cmd() {
        CommandId::DebugPrintString => {
            let text = resp.data().get(2..).unwrap_or_default();
            debug!("device: {}", String::from_utf8_lossy(text).trim_end());
        }
        other => debug!("device {}: {}", other, bytes_to_hex(resp.data())),
    }
}

/// A live request/response channel to one device.
pub struct Session {
    channel: Channel,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.channel.config)
            .field("queued", &self.channel.queue.len())
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl Session {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: Box<dyn Transport>, config: SessionConfig) -> Self {
        Self {
            channel: Channel {
                transport,
                reframer: Reframer::new(),
                queue: VecDeque::new(),
                config,
                cancel: CancelToken::new(),
            },
            interceptors: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.channel.config
    }

    /// Append an interceptor. The first one added runs outermost.
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Write one encoded frame through the interceptor chain.
    pub fn send(&mut self, frame: &[u8]) -> Result<()> {
        SendNext::new(&mut self.channel, &self.interceptors).run(frame)
    }

    pub fn send_command(&mut self, cmd: &Command) -> Result<()> {
        let frame = encode_command_frame(cmd)?;
        self.send(&frame)
    }

    /// Drop every decoded frame nobody has consumed yet.
    pub fn clear_response_queue(&mut self) {
        let dropped = self.channel.queue.len();
        if dropped > 0 {
            debug!("clearing {} stale response(s)", dropped);
        }
        self.channel.queue.clear();
    }

    /// Hand the session bytes that were read outside of it.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.channel.feed(chunk);
    }

    /// Wait for the next frame matching `expect`.
    ///
    /// `timeout_ms` defaults to [`SessionConfig::default_timeout_ms`]; the
    /// communication delay is added on top and WTX frames push the deadline
    /// further out. The returned `Timeout` error carries the final value.
    pub fn wait_response(
        &mut self,
        expect: impl Into<Expect>,
        timeout_ms: Option<u64>,
    ) -> Result<Response> {
        let request = WaitRequest {
            expect: expect.into(),
            timeout_ms: timeout_ms.unwrap_or(self.channel.config.default_timeout_ms),
        };
        ReceiveNext::new(&mut self.channel, &self.interceptors).run(request)
    }

    /// Decoded frames queued but not yet consumed.
    pub fn pending_responses(&self) -> usize {
        self.channel.queue.len()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.channel.cancel.clone()
    }

    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        self.channel.transport.as_mut()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.channel.transport.as_ref()
    }

    pub fn into_transport(self) -> Box<dyn Transport> {
        self.channel.transport
    }
}
