// libpm3/src/device/handle.rs

use std::marker::PhantomData;
use std::sync::Arc;

use log::debug;

use crate::device::middleware::Interceptor;
use crate::device::session::{CancelToken, Expect, Session, SessionConfig};
use crate::protocol::{Command, Response};
use crate::transport::Transport;
use crate::Result;

/// Type-state markers
pub struct Disconnected;
pub struct Connected;

/// Device handle that only exposes commands once the channel is open.
pub struct Device<State = Disconnected> {
    session: Session,
    _state: PhantomData<State>,
}

impl<State> Device<State> {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Interceptors can be installed before or after connecting.
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.session.add_interceptor(interceptor);
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.session.cancel_token()
    }

    fn into_state<Next>(self) -> Device<Next> {
        Device {
            session: self.session,
            _state: PhantomData,
        }
    }
}

impl Device<Disconnected> {
    /// Create a Device from an existing Transport instance, such as a
    /// MockTransport in tests.
    pub fn new_with_transport(transport: Box<dyn Transport>) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: Box<dyn Transport>, config: SessionConfig) -> Self {
        Self {
            session: Session::with_config(transport, config),
            _state: PhantomData,
        }
    }

    /// Open the transport.
    pub fn connect(mut self) -> Result<Device<Connected>> {
        self.session.transport_mut().connect()?;
        debug!("device connected");
        Ok(self.into_state())
    }

    pub fn into_transport(self) -> Box<dyn Transport> {
        self.session.into_transport()
    }
}

impl Device<Connected> {
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn send_command(&mut self, cmd: &Command) -> Result<()> {
        self.session.send_command(cmd)
    }

    pub fn wait_response(
        &mut self,
        expect: impl Into<Expect>,
        timeout_ms: Option<u64>,
    ) -> Result<Response> {
        self.session.wait_response(expect, timeout_ms)
    }

    pub fn clear_response_queue(&mut self) {
        self.session.clear_response_queue();
    }

    /// Clear stale frames, send `cmd` and wait for its reply.
    pub fn execute(
        &mut self,
        cmd: &Command,
        expect: impl Into<Expect>,
        timeout_ms: Option<u64>,
    ) -> Result<Response> {
        self.session.clear_response_queue();
        self.session.send_command(cmd)?;
        self.session.wait_response(expect, timeout_ms)
    }

    /// Close the transport. Queued frames are dropped with the state.
    pub fn disconnect(mut self) -> Result<Device<Disconnected>> {
        self.session.clear_response_queue();
        self.session.transport_mut().disconnect()?;
        debug!("device disconnected");
        Ok(self.into_state())
    }
}
