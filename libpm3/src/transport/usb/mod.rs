// libpm3/src/transport/usb/mod.rs

#![cfg(feature = "usb")]

use std::time::Duration;

use log::{debug, warn};
use rusb::{Context, DeviceHandle, UsbContext};

use crate::constants::KNOWN_USB_IDS;
use crate::transport::traits::Transport;
use crate::{Error, Result};

mod descriptor;
pub use descriptor::{BulkEndpoints, find_bulk_endpoints};

const WRITE_TIMEOUT_MS: u64 = 1000;
const READ_BUFFER_LEN: usize = 4096;

/// Bulk transport over the device's CDC data interface.
pub struct UsbTransport {
    handle: Option<DeviceHandle<Context>>,
    endpoints: BulkEndpoints,
    vendor_id: u16,
    product_id: u16,
}

impl UsbTransport {
    /// Locate the first device whose vendor/product pair is known. The
    /// interface is claimed on [`Transport::connect`].
    pub fn open() -> Result<Self> {
        let ctx = Context::new()?;
        for device in ctx.devices()?.iter() {
            let dd = device.device_descriptor()?;
            let ids = (dd.vendor_id(), dd.product_id());
            if !KNOWN_USB_IDS.contains(&ids) {
                continue;
            }
            let Some(endpoints) = find_bulk_endpoints(&device) else {
                debug!("usb: {:04x}:{:04x} has no bulk endpoint pair", ids.0, ids.1);
                continue;
            };
            let handle = device.open()?;
            debug!(
                "usb: opened {:04x}:{:04x}, interface {}, in {:#04x}, out {:#04x}",
                ids.0, ids.1, endpoints.interface, endpoints.in_ep, endpoints.out_ep
            );
            return Ok(Self {
                handle: Some(handle),
                endpoints,
                vendor_id: ids.0,
                product_id: ids.1,
            });
        }
        Err(Error::DeviceNotFound)
    }

    pub fn ids(&self) -> (u16, u16) {
        (self.vendor_id, self.product_id)
    }

    fn handle(&self) -> Result<&DeviceHandle<Context>> {
        self.handle
            .as_ref()
            .ok_or_else(|| Error::Transport("usb device is closed".into()))
    }
}

impl Transport for UsbTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let handle = self.handle()?;
        let timeout = Duration::from_millis(WRITE_TIMEOUT_MS);
        let mut written = 0;
        while written < data.len() {
            match handle.write_bulk(self.endpoints.out_ep, &data[written..], timeout) {
                Ok(n) => written += n,
                Err(rusb::Error::Pipe) => {
                    warn!("usb: out endpoint stalled, clearing halt");
                    handle.clear_halt(self.endpoints.out_ep)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>> {
        let handle = self.handle()?;
        let mut buf = vec![0u8; READ_BUFFER_LEN];
        match handle.read_bulk(
            self.endpoints.in_ep,
            &mut buf,
            Duration::from_millis(timeout_ms.max(1)),
        ) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(rusb::Error::Timeout) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn connect(&mut self) -> Result<()> {
        let iface = self.endpoints.interface;
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| Error::Transport("usb device is closed".into()))?;
        // The kernel's cdc_acm driver usually owns the interface.
        if let Ok(true) = handle.kernel_driver_active(iface) {
            if let Err(e) = handle.detach_kernel_driver(iface) {
                debug!("usb: detach kernel driver failed: {}", e);
            }
        }
        handle.claim_interface(iface)?;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(mut handle) = self.handle.take() {
            handle.release_interface(self.endpoints.interface)?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}
