use crate::commands;
use crate::device::{Channel, LedSetting};
use crate::error::{DriverError, Result};
use crate::report::{self, InputReport, RawInputReport, INPUT_REPORT_LEN};
use crate::session::SessionManager;
use crate::state::DriverContext;
use crate::transport::{Session, Transport};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// Granularity of the attach backoff sleep, so shutdown isn't held up by it.
const BACKOFF_SLICE: Duration = Duration::from_millis(50);

/// Background polling loop.
///
/// Runs on a dedicated `std::thread`: attaches the receiver when it is absent,
/// otherwise reads all four channels in parallel and feeds the results into
/// the shared context.
pub struct PollEngine {
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    DeviceRemoved,
}

impl PollEngine {
    pub fn start<T: Transport>(ctx: Arc<DriverContext<T::Session>>, transport: T) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let loop_running = running.clone();
        let manager = SessionManager::new(transport);

        let handle = thread::Builder::new()
            .name("x360-poll".into())
            .spawn(move || poll_loop(&loop_running, &ctx, &manager))
            .map_err(|e| DriverError::ThreadSpawn(e.to_string()))?;

        Ok(Self {
            running,
            thread_handle: Some(handle),
        })
    }

    /// Ask the loop to stop and wait for the in-flight cycle to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Polling thread panicked");
            }
        }
    }
}

impl Drop for PollEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop<T: Transport>(
    running: &AtomicBool,
    ctx: &Arc<DriverContext<T::Session>>,
    manager: &SessionManager<T>,
) {
    log::info!("Polling engine started");

    while running.load(Ordering::SeqCst) {
        let Some(session) = ctx.session() else {
            if let Err(e) = manager.attach(ctx) {
                log::warn!(
                    "Receiver attach failed: {}; retrying in {:?}",
                    e,
                    ctx.config.attach_retry()
                );
                sleep_while_running(running, ctx.config.attach_retry());
            }
            continue;
        };

        if poll_cycle(ctx, &session) == CycleOutcome::DeviceRemoved {
            drop(session);
            log::warn!("Wireless receiver disconnected");
            manager.detach(ctx);
        }
    }

    manager.detach(ctx);
    log::info!("Polling engine stopped");
}

fn sleep_while_running(running: &AtomicBool, total: Duration) {
    let mut left = total;
    while !left.is_zero() && running.load(Ordering::SeqCst) {
        let slice = left.min(BACKOFF_SLICE);
        thread::sleep(slice);
        left -= slice;
    }
}

/// One cycle: a read per channel on scoped threads, then processing in channel order.
pub fn poll_cycle<S: Session>(ctx: &Arc<DriverContext<S>>, session: &S) -> CycleOutcome {
    let timeout = ctx.config.read_timeout();

    let results: Vec<Result<RawInputReport>> = thread::scope(|scope| {
        let reads: Vec<_> = Channel::ALL
            .iter()
            .map(|&channel| {
                thread::Builder::new()
                    .name(format!("x360-read-{}", channel.index()))
                    .spawn_scoped(scope, move || read_channel(session, channel, timeout))
            })
            .collect();

        reads
            .into_iter()
            .map(|read| match read {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    Err(DriverError::ThreadSpawn("read thread panicked".into()))
                }),
                Err(e) => Err(DriverError::ThreadSpawn(e.to_string())),
            })
            .collect()
    });

    for (channel, result) in Channel::ALL.into_iter().zip(results) {
        match result {
            Ok(raw) => {
                let routed =
                    panic::catch_unwind(AssertUnwindSafe(|| process_report(ctx, channel, &raw)));
                if routed.is_err() {
                    log::error!("Processing a report from {} panicked", channel);
                }
            }
            Err(DriverError::Timeout) => {}
            // One unplugged dongle takes every channel with it.
            Err(DriverError::DeviceRemoved) => return CycleOutcome::DeviceRemoved,
            // A stalled endpoint fails every cycle, so keep this out of the default log level.
            Err(e) => log::debug!("Error reading {}: {}", channel, e),
        }
    }
    CycleOutcome::Continue
}

fn read_channel<S: Session>(
    session: &S,
    channel: Channel,
    timeout: Duration,
) -> Result<RawInputReport> {
    let mut raw = [0u8; INPUT_REPORT_LEN];
    session.read_interrupt(channel.endpoint_in(), &mut raw, timeout)?;
    Ok(raw)
}

/// Route one input report into the context.
pub fn process_report<S: Session>(ctx: &Arc<DriverContext<S>>, channel: Channel, raw: &RawInputReport) {
    log::trace!("{} report: {:02x?}", channel, raw);

    match report::decode(raw) {
        InputReport::Connection { present: true } => {
            let ready = commands::controller_ready(ctx, channel);
            connection_changed(ctx, channel, ready);
        }
        InputReport::Connection { present: false } => connection_changed(ctx, channel, false),
        InputReport::Buttons(frame) => {
            // A button frame proves the controller is alive.
            connection_changed(ctx, channel, true);
            ctx.write_frame(channel, &frame);
        }
        InputReport::Ignored => {}
    }
}

/// Record the new connected flag; on the false→true edge light the channel's
/// LED quadrant and buzz the controller.
pub fn connection_changed<S: Session>(ctx: &Arc<DriverContext<S>>, channel: Channel, connected: bool) {
    let was_connected = ctx.set_connected(channel, connected);

    if connected && !was_connected {
        log::info!("{} connected", channel);
        commands::set_led(ctx, channel, LedSetting::blink_for(channel));
        commands::set_rumble_timed(
            ctx,
            channel,
            ctx.config.connect_rumble_big,
            ctx.config.connect_rumble_small,
            ctx.config.connect_rumble(),
        );
    } else if was_connected && !connected {
        log::info!("{} disconnected", channel);
    }
}
