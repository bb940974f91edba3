#![cfg(feature = "usb")]

//! Helpers for tests against a real Proxmark3.
//!
//! Opening returns `Ok(None)` when no device is plugged in, so these tests
//! stay green on machines without hardware.

use libpm3::device::{Connected, DeviceBuilder};
use libpm3::transport::UsbTransport;
use libpm3::{Device, Error, Result};

pub fn open_connected_device() -> Result<Option<Device<Connected>>> {
    let _ = env_logger::builder().is_test(true).try_init();
    match UsbTransport::open() {
        Ok(transport) => {
            let device = DeviceBuilder::new()
                .with_transport(Box::new(transport))
                .build()?
                .connect()?;
            Ok(Some(device))
        }
        Err(Error::DeviceNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}
