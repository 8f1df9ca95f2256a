use crate::device::{Channel, LedSetting};
use crate::report::{self, RawOutputReport};
use crate::state::DriverContext;
use crate::transport::Session;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Send one output report while holding the shared lock.
///
/// Returns `false` when no receiver is attached or the transfer failed.
fn transmit<S: Session>(ctx: &DriverContext<S>, channel: Channel, data: &RawOutputReport) -> bool {
    let inner = ctx.lock_inner();
    let Some(session) = inner.session.as_ref() else {
        log::trace!("No receiver attached, dropping report for {}", channel);
        return false;
    };
    match session.write_interrupt(channel.endpoint_out(), data, ctx.config.write_timeout()) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("Write to {} failed: {}", channel, e);
            false
        }
    }
}

pub fn set_led<S: Session>(ctx: &DriverContext<S>, channel: Channel, setting: LedSetting) {
    transmit(ctx, channel, &report::encode_led(setting));
}

pub fn set_rumble<S: Session>(ctx: &DriverContext<S>, channel: Channel, big: u8, small: u8) {
    transmit(ctx, channel, &report::encode_rumble(big, small));
}

/// Turn the LEDs off and acknowledge a newly present controller.
///
/// The only synchronous command whose outcome is reported.
pub fn controller_ready<S: Session>(ctx: &DriverContext<S>, channel: Channel) -> bool {
    set_led(ctx, channel, LedSetting::OffAll);
    transmit(ctx, channel, &report::encode_ready())
}

/// Rumble for `duration` on a background thread, then stop the motors.
///
/// There is no cancellation: overlapping requests on one channel race and the
/// last stop to run wins, even over a later `set_rumble`.
pub fn set_rumble_timed<S: Session>(
    ctx: &Arc<DriverContext<S>>,
    channel: Channel,
    big: u8,
    small: u8,
    duration: Duration,
) {
    let task_ctx = ctx.clone();
    let spawned = std::thread::Builder::new()
        .name(format!("x360-rumble-{}", channel.index()))
        .spawn(move || {
            set_rumble(&task_ctx, channel, big, small);
            std::thread::sleep(duration);
            set_rumble(&task_ctx, channel, 0, 0);
        });
    match spawned {
        Ok(handle) => ctx.rumble.track(handle),
        Err(e) => log::warn!("Failed to spawn rumble task for {}: {}", channel, e),
    }
}

/// Handles of in-flight timed rumbles, kept so shutdown can wait for them.
#[derive(Default)]
pub struct RumbleTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl RumbleTasks {
    fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    pub fn pending(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every tracked rumble to send its stop command.
    pub fn drain(&self) {
        let handles = std::mem::take(
            &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if handle.join().is_err() {
                log::error!("Rumble task panicked");
            }
        }
    }
}
