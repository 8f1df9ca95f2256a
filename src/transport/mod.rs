use crate::error::Result;
use std::time::Duration;

/// Opens the receiver. Implementations own whatever host-stack context is needed.
pub trait Transport: Send + Sync + 'static {
    type Session: Session;

    /// Fails with `DriverError::ReceiverNotFound` when no matching device is plugged in.
    fn open(&self, vendor_id: u16, product_id: u16) -> Result<Self::Session>;
}

/// An opened receiver. Dropping it closes the handle.
///
/// Transfers fail with `DriverError::DeviceRemoved` once the receiver is unplugged
/// and with `DriverError::Timeout` when nothing arrived within `timeout`.
pub trait Session: Send + Sync + 'static {
    /// Claim `iface`, detaching a kernel driver first where the platform allows it.
    fn claim_interface(&mut self, iface: u8) -> Result<()>;
    fn release_interface(&mut self, iface: u8) -> Result<()>;
    fn read_interrupt(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> Result<usize>;
    fn write_interrupt(&self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize>;
}

mod libusb;
#[cfg(test)]
pub(crate) mod mock;

pub use libusb::{LibUsbSession, LibUsbTransport};
