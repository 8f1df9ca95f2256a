use crate::commands;
use crate::config::DriverConfig;
use crate::device::{Channel, ControllerState, LedSetting};
use crate::engine::PollEngine;
use crate::error::Result;
use crate::state::DriverContext;
use crate::transport::{LibUsbTransport, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Handle to the wireless receiver and its four controllers.
///
/// Constructing a driver starts the background polling thread, which keeps
/// trying to attach the receiver until it is plugged in and re-attaches after
/// it is unplugged. Dropping the driver stops the thread and releases the
/// receiver. Channel arguments accept any integer; out-of-range values are
/// clamped to the first or last controller.
pub struct Driver<T: Transport = LibUsbTransport> {
    ctx: Arc<DriverContext<T::Session>>,
    engine: PollEngine,
}

impl Driver<LibUsbTransport> {
    /// Start a driver on the system's libusb.
    pub fn open(config: DriverConfig) -> Result<Self> {
        Self::with_transport(LibUsbTransport::new()?, config)
    }
}

impl<T: Transport> Driver<T> {
    pub fn with_transport(transport: T, config: DriverConfig) -> Result<Self> {
        let ctx = Arc::new(DriverContext::new(config));
        let engine = PollEngine::start(ctx.clone(), transport)?;
        Ok(Self { ctx, engine })
    }

    /// Whether the receiver is currently attached.
    pub fn is_attached(&self) -> bool {
        self.ctx.is_attached()
    }

    /// Set the ring-of-light pattern. Best effort: failures are only logged.
    pub fn set_led(&self, channel: impl Into<Channel>, setting: LedSetting) {
        commands::set_led(&self.ctx, channel.into(), setting);
    }

    /// Set absolute motor weights; `0` stops a motor. Best effort.
    pub fn set_rumble(&self, channel: impl Into<Channel>, big: u8, small: u8) {
        commands::set_rumble(&self.ctx, channel.into(), big, small);
    }

    /// Rumble for `duration` without blocking, then stop both motors.
    ///
    /// Overlapping timed rumbles are not cancelled; the last stop to run wins,
    /// even over a `set_rumble` issued in between.
    pub fn set_rumble_timed(
        &self,
        channel: impl Into<Channel>,
        big: u8,
        small: u8,
        duration: Duration,
    ) {
        commands::set_rumble_timed(&self.ctx, channel.into(), big, small, duration);
    }

    /// Current snapshot of one controller.
    pub fn get_state(&self, channel: impl Into<Channel>) -> ControllerState {
        self.ctx.snapshot(channel.into())
    }

    /// Wait up to `timeout` for a new button frame on `channel`.
    ///
    /// Returns the snapshot as of return and `true` if a frame arrived, or the
    /// unchanged snapshot and `false` on timeout. Several frames may have been
    /// folded into one wake-up.
    pub fn get_state_on_change_or_timeout(
        &self,
        channel: impl Into<Channel>,
        timeout: Duration,
    ) -> (ControllerState, bool) {
        self.ctx.wait_for_change(channel.into(), timeout)
    }

    /// Let pending timed rumbles finish, then stop polling and release the receiver.
    pub fn shutdown(mut self) {
        let pending = self.ctx.rumble.pending();
        if pending > 0 {
            log::info!("Waiting for {} rumble task(s) before shutdown", pending);
        }
        self.ctx.rumble.drain();
        self.engine.stop();
    }
}

impl<T: Transport> Drop for Driver<T> {
    fn drop(&mut self) {
        self.engine.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{self, INPUT_REPORT_LEN};
    use crate::transport::mock::MockTransport;
    use std::thread;
    use std::time::Instant;

    fn fast_config() -> DriverConfig {
        DriverConfig {
            read_timeout_ms: 5,
            attach_retry_ms: 10,
            connect_rumble_ms: 5,
            ..DriverConfig::default()
        }
    }

    fn button_frame(mask: u16, left_trigger: u8) -> [u8; INPUT_REPORT_LEN] {
        let mut raw = [0u8; INPUT_REPORT_LEN];
        raw[1] = 0x01;
        raw[3] = 0xF0;
        raw[5] = 0x13;
        raw[6..8].copy_from_slice(&mask.to_le_bytes());
        raw[8] = left_trigger;
        raw
    }

    fn wait_attached<T: Transport>(driver: &Driver<T>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !driver.is_attached() {
            assert!(Instant::now() < deadline, "receiver never attached");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn wait_returns_frame_pushed_by_poller() {
        let transport = MockTransport::plugged();
        let driver = Driver::with_transport(transport.clone(), fast_config()).unwrap();
        wait_attached(&driver);

        transport.push_read(Channel::from(1), button_frame(0x1000, 0x7F));
        let (state, changed) =
            driver.get_state_on_change_or_timeout(1, Duration::from_secs(5));

        assert!(changed);
        assert!(state.a && state.connected);
        assert_eq!(state.left_trigger, 0x7F);
        assert_eq!(driver.get_state(1), state);
        driver.shutdown();
    }

    #[test]
    fn wait_without_frames_times_out_unchanged() {
        let transport = MockTransport::plugged();
        let driver = Driver::with_transport(transport, fast_config()).unwrap();
        wait_attached(&driver);

        let before = driver.get_state(0);
        let (state, changed) =
            driver.get_state_on_change_or_timeout(0, Duration::from_millis(40));
        assert!(!changed);
        assert_eq!(state, before);
    }

    #[test]
    fn out_of_range_channels_are_clamped() {
        let transport = MockTransport::plugged();
        let driver = Driver::with_transport(transport.clone(), fast_config()).unwrap();
        wait_attached(&driver);

        transport.push_read(Channel::from(3), button_frame(0x8000, 0));
        let (state, changed) =
            driver.get_state_on_change_or_timeout(99, Duration::from_secs(5));
        assert!(changed && state.y);
        assert_eq!(driver.get_state(99), driver.get_state(3));
        assert_eq!(driver.get_state(-1), driver.get_state(0));

        driver.set_led(-1, LedSetting::On1);
        assert!(transport
            .writes_to(Channel::from(0))
            .contains(&report::encode_led(LedSetting::On1).to_vec()));
        driver.shutdown();
    }

    #[test]
    fn commands_while_detached_do_not_block() {
        let transport = MockTransport::default();
        let driver = Driver::with_transport(transport.clone(), fast_config()).unwrap();

        driver.set_led(0, LedSetting::Rotate);
        driver.set_rumble(0, 0xFF, 0xFF);
        driver.set_rumble_timed(0, 0xFF, 0xFF, Duration::from_millis(5));
        assert!(!driver.is_attached());
        driver.shutdown();
        assert!(transport.device().writes.is_empty());
    }

    #[test]
    fn rumble_during_polling_never_tears_state() {
        let transport = MockTransport::plugged();
        let driver = Driver::with_transport(transport.clone(), fast_config()).unwrap();
        wait_attached(&driver);

        let pusher = {
            let transport = transport.clone();
            thread::spawn(move || {
                for n in 0..200u16 {
                    let mask = if n % 2 == 0 { 0xF7FF } else { 0 };
                    let trigger = if n % 2 == 0 { 0xFF } else { 0 };
                    transport.push_read(Channel::from(2), button_frame(mask, trigger));
                    thread::sleep(Duration::from_millis(1));
                }
            })
        };
        for n in 0..200u8 {
            driver.set_rumble(2, n, n);
            let s = driver.get_state(2);
            if s.left_trigger == 0xFF {
                assert_eq!(s.buttons(), 0xF7FF);
            } else {
                assert_eq!(s.buttons(), 0);
            }
        }
        pusher.join().unwrap();
        driver.shutdown();
    }

    #[test]
    fn dropping_driver_releases_receiver() {
        let transport = MockTransport::plugged();
        let driver = Driver::with_transport(transport.clone(), fast_config()).unwrap();
        wait_attached(&driver);
        drop(driver);
        assert_eq!(transport.device().released, vec![0, 2, 4, 6]);
    }
}
