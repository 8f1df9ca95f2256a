use super::{Session, Transport};
use crate::error::{DriverError, Result};
use rusb::{Context, DeviceHandle, UsbContext};
use std::time::Duration;

/// libusb backend. Dropping it releases the libusb context.
pub struct LibUsbTransport {
    context: Context,
}

impl LibUsbTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            context: Context::new()?,
        })
    }
}

impl Transport for LibUsbTransport {
    type Session = LibUsbSession;

    fn open(&self, vendor_id: u16, product_id: u16) -> Result<LibUsbSession> {
        let handle = self
            .context
            .open_device_with_vid_pid(vendor_id, product_id)
            .ok_or_else(|| {
                DriverError::ReceiverNotFound(format!(
                    "no device {:04x}:{:04x}",
                    vendor_id, product_id
                ))
            })?;
        Ok(LibUsbSession { handle })
    }
}

pub struct LibUsbSession {
    handle: DeviceHandle<Context>,
}

impl Session for LibUsbSession {
    fn claim_interface(&mut self, iface: u8) -> Result<()> {
        // Kernel driver queries are unsupported off Linux; treat that as "not attached".
        if self.handle.kernel_driver_active(iface).unwrap_or(false) {
            if let Err(e) = self.handle.detach_kernel_driver(iface) {
                log::debug!("Failed to detach kernel driver from interface {}: {}", iface, e);
            }
        }
        self.handle
            .claim_interface(iface)
            .map_err(|e| DriverError::ClaimInterface {
                iface,
                reason: e.to_string(),
            })
    }

    fn release_interface(&mut self, iface: u8) -> Result<()> {
        Ok(self.handle.release_interface(iface)?)
    }

    fn read_interrupt(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        Ok(self.handle.read_interrupt(endpoint, buf, timeout)?)
    }

    fn write_interrupt(&self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize> {
        Ok(self.handle.write_interrupt(endpoint, data, timeout)?)
    }
}
