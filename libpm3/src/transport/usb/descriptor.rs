// libpm3/src/transport/usb/descriptor.rs

use rusb::{Device, Direction, TransferType, UsbContext};

/// Bulk endpoint pair and the interface that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkEndpoints {
    pub in_ep: u8,
    pub out_ep: u8,
    pub interface: u8,
}

/// Find the first interface exposing both a bulk IN and a bulk OUT
/// endpoint. On a CDC-ACM device this is the data interface, not the
/// control interface with its interrupt endpoint.
pub fn find_bulk_endpoints<D: UsbContext>(device: &Device<D>) -> Option<BulkEndpoints> {
    let config = device.active_config_descriptor().ok()?;
    for interface in config.interfaces() {
        for interface_desc in interface.descriptors() {
            let mut in_ep = None;
            let mut out_ep = None;
            for endpoint_desc in interface_desc.endpoint_descriptors() {
                if endpoint_desc.transfer_type() != TransferType::Bulk {
                    continue;
                }
                match endpoint_desc.direction() {
                    Direction::In if in_ep.is_none() => in_ep = Some(endpoint_desc.address()),
                    Direction::Out if out_ep.is_none() => out_ep = Some(endpoint_desc.address()),
                    _ => {}
                }
            }
            if let (Some(in_ep), Some(out_ep)) = (in_ep, out_ep) {
                return Some(BulkEndpoints {
                    in_ep,
                    out_ep,
                    interface: interface_desc.interface_number(),
                });
            }
        }
    }
    None
}
