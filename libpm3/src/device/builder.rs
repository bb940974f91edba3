// libpm3/src/device/builder.rs

use std::sync::Arc;

use crate::device::handle::{Device, Disconnected};
use crate::device::middleware::Interceptor;
use crate::device::session::SessionConfig;
use crate::transport::Transport;
use crate::{Error, Result};

/// Helper to construct a Device with optional configuration.
#[derive(Default)]
pub struct DeviceBuilder {
    transport: Option<Box<dyn Transport>>,
    config: SessionConfig,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl DeviceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide an already-created transport instance (e.g. MockTransport)
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use the first Proxmark3 found on the USB bus.
    #[cfg(feature = "usb")]
    pub fn with_usb(self) -> Result<Self> {
        let transport = crate::transport::UsbTransport::open()?;
        Ok(self.with_transport(Box::new(transport)))
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Consume the builder and return a disconnected Device.
    /// Requires a transport to be provided; otherwise returns DeviceNotFound.
    pub fn build(self) -> Result<Device<Disconnected>> {
        let transport = self.transport.ok_or(Error::DeviceNotFound)?;
        let mut device = Device::with_config(transport, self.config);
        for interceptor in self.interceptors {
            device.add_interceptor(interceptor);
        }
        Ok(device)
    }
}
