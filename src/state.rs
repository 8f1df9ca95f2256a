use crate::commands::RumbleTasks;
use crate::config::DriverConfig;
use crate::device::{Channel, ControllerState, MAX_CONTROLLERS};
use crate::report::ButtonFrame;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Everything guarded by the driver's single lock: the four snapshots and the
/// open receiver. Command transmission holds the same lock.
pub struct Inner<S> {
    states: [ControllerState; MAX_CONTROLLERS],
    /// Incremented once per decoded button frame, per channel.
    generations: [u64; MAX_CONTROLLERS],
    pub session: Option<Arc<S>>,
}

impl<S> Inner<S> {
    /// Zero every snapshot, marking all controllers disconnected.
    pub fn reset_states(&mut self) {
        self.states = [ControllerState::default(); MAX_CONTROLLERS];
    }
}

/// Shared between the polling thread, rumble tasks and the public `Driver`.
pub struct DriverContext<S> {
    inner: Mutex<Inner<S>>,
    changed: [Condvar; MAX_CONTROLLERS],
    pub config: DriverConfig,
    pub rumble: RumbleTasks,
}

impl<S> DriverContext<S> {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                states: [ControllerState::default(); MAX_CONTROLLERS],
                generations: [0; MAX_CONTROLLERS],
                session: None,
            }),
            changed: std::array::from_fn(|_| Condvar::new()),
            config,
            rumble: RumbleTasks::default(),
        }
    }

    /// A panicking holder never leaves the snapshots half-written, so poisoning is ignored.
    pub fn lock_inner(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self, channel: Channel) -> ControllerState {
        self.lock_inner().states[channel.index()]
    }

    /// Store a decoded frame and wake everyone waiting on `channel`.
    pub fn write_frame(&self, channel: Channel, frame: &ButtonFrame) {
        let i = channel.index();
        let mut inner = self.lock_inner();
        frame.apply(&mut inner.states[i]);
        inner.generations[i] = inner.generations[i].wrapping_add(1);
        self.changed[i].notify_all();
    }

    /// Returns the previous value of the flag.
    pub fn set_connected(&self, channel: Channel, connected: bool) -> bool {
        let mut inner = self.lock_inner();
        let state = &mut inner.states[channel.index()];
        std::mem::replace(&mut state.connected, connected)
    }

    pub fn is_attached(&self) -> bool {
        self.lock_inner().session.is_some()
    }

    pub fn session(&self) -> Option<Arc<S>> {
        self.lock_inner().session.clone()
    }

    /// Block until a button frame for `channel` is stored or `timeout` passes.
    ///
    /// Returns the snapshot at wake-up and whether a frame arrived meanwhile.
    pub fn wait_for_change(&self, channel: Channel, timeout: Duration) -> (ControllerState, bool) {
        let i = channel.index();
        let inner = self.lock_inner();
        let seen = inner.generations[i];
        let (inner, _) = self.changed[i]
            .wait_timeout_while(inner, timeout, |inner| inner.generations[i] == seen)
            .unwrap_or_else(PoisonError::into_inner);
        (inner.states[i], inner.generations[i] != seen)
    }
}
