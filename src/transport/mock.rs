//! Scripted in-memory receiver for exercising the engine without hardware.

use super::{Session, Transport};
use crate::device::Channel;
use crate::error::{DriverError, Result};
use crate::report::RawInputReport;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// Empty reads return quickly so tests don't pay the full transfer timeout.
const EMPTY_READ_DELAY: Duration = Duration::from_millis(2);

#[derive(Default)]
pub(crate) struct MockDevice {
    pub plugged: bool,
    /// Bumped on every unplug so stale sessions start failing.
    pub generation: u64,
    pub fail_writes: bool,
    /// Writes to this endpoint panic, after the device lock is released.
    pub panic_writes: Option<u8>,
    pub fail_claim: Option<u8>,
    pub opens: usize,
    pub reads: HashMap<u8, VecDeque<RawInputReport>>,
    /// How long an empty read blocks, capped by the transfer timeout.
    pub read_delay: Option<Duration>,
    /// Endpoints whose reads fail with the given error.
    pub read_errors: HashMap<u8, rusb::Error>,
    pub writes: Vec<(u8, Vec<u8>)>,
    pub claimed: Vec<u8>,
    pub released: Vec<u8>,
}

#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    device: Arc<Mutex<MockDevice>>,
}

impl MockTransport {
    pub fn plugged() -> Self {
        let transport = Self::default();
        transport.device().plugged = true;
        transport
    }

    pub fn device(&self) -> MutexGuard<'_, MockDevice> {
        self.device.lock().unwrap()
    }

    pub fn push_read(&self, channel: Channel, raw: RawInputReport) {
        self.device()
            .reads
            .entry(channel.endpoint_in())
            .or_default()
            .push_back(raw);
    }

    pub fn writes_to(&self, channel: Channel) -> Vec<Vec<u8>> {
        self.device()
            .writes
            .iter()
            .filter(|(ep, _)| *ep == channel.endpoint_out())
            .map(|(_, data)| data.clone())
            .collect()
    }

    pub fn fail_reads(&self, channel: Channel, error: rusb::Error) {
        self.device().read_errors.insert(channel.endpoint_in(), error);
    }

    pub fn unplug(&self) {
        let mut device = self.device();
        device.plugged = false;
        device.generation += 1;
        device.reads.clear();
    }

    pub fn replug(&self) {
        self.device().plugged = true;
    }
}

impl Transport for MockTransport {
    type Session = MockSession;

    fn open(&self, _vendor_id: u16, _product_id: u16) -> Result<MockSession> {
        let mut device = self.device();
        if !device.plugged {
            return Err(DriverError::ReceiverNotFound("mock unplugged".into()));
        }
        device.opens += 1;
        Ok(MockSession {
            device: self.device.clone(),
            generation: device.generation,
        })
    }
}

pub(crate) struct MockSession {
    device: Arc<Mutex<MockDevice>>,
    generation: u64,
}

impl MockSession {
    fn live(&self) -> Result<MutexGuard<'_, MockDevice>> {
        let device = self.device.lock().unwrap();
        if !device.plugged || device.generation != self.generation {
            return Err(DriverError::DeviceRemoved);
        }
        Ok(device)
    }
}

impl Session for MockSession {
    fn claim_interface(&mut self, iface: u8) -> Result<()> {
        let mut device = self.live()?;
        if device.fail_claim == Some(iface) {
            return Err(DriverError::ClaimInterface {
                iface,
                reason: "busy".into(),
            });
        }
        device.claimed.push(iface);
        Ok(())
    }

    fn release_interface(&mut self, iface: u8) -> Result<()> {
        self.device.lock().unwrap().released.push(iface);
        Ok(())
    }

    fn read_interrupt(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let (next, delay) = {
            let mut device = self.live()?;
            if let Some(&error) = device.read_errors.get(&endpoint) {
                return Err(error.into());
            }
            let delay = device.read_delay.unwrap_or(EMPTY_READ_DELAY);
            (device.reads.get_mut(&endpoint).and_then(VecDeque::pop_front), delay)
        };
        match next {
            Some(raw) => {
                let len = raw.len().min(buf.len());
                buf[..len].copy_from_slice(&raw[..len]);
                Ok(len)
            }
            None => {
                std::thread::sleep(timeout.min(delay));
                Err(DriverError::Timeout)
            }
        }
    }

    fn write_interrupt(&self, endpoint: u8, data: &[u8], _timeout: Duration) -> Result<usize> {
        let mut device = self.live()?;
        if device.panic_writes == Some(endpoint) {
            drop(device);
            panic!("write to endpoint {:#04x} blew up", endpoint);
        }
        if device.fail_writes {
            return Err(DriverError::Usb(rusb::Error::Io));
        }
        device.writes.push((endpoint, data.to_vec()));
        Ok(data.len())
    }
}
